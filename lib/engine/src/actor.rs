use async_trait::async_trait;
use rdf_delta_common::error::DeltaError;
use rdf_delta_common::{
    BindingsOutput, CommonVariablePolicy, DeltaResult, JoinOptions, QueryContext,
    QueryOperationMediator,
};
use rdf_delta_model::Variable;
use rdf_delta_physical::join::{
    BindJoin, JoinCoefficients, JoinEntry, MultiBindJoin, PartialHashJoin,
};
use rustc_hash::FxHashSet;
use std::fmt::Debug;
use std::sync::Arc;

/// The estimated cost of a single request to the query operation mediator, relative to one
/// iteration of a join loop. A sub-evaluation is a complete query of its own.
const REQUEST_COST: f64 = 10.0;

/// A physical join strategy that competes for the evaluation of inner joins.
///
/// The engine first tests all actors and then runs the one with the lowest cost.
#[async_trait]
pub trait JoinActor: Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Estimates the costs of joining `entries`. Returns an error if this actor cannot join them.
    fn test(&self, entries: &[JoinEntry], context: &QueryContext)
        -> DeltaResult<JoinCoefficients>;

    async fn run(
        &self,
        entries: Vec<JoinEntry>,
        context: &QueryContext,
    ) -> DeltaResult<BindingsOutput>;
}

/// Joins exactly two entries with a [PartialHashJoin].
#[derive(Debug, Default)]
pub struct PartialHashJoinActor {
    join: PartialHashJoin,
}

impl PartialHashJoinActor {
    pub fn new(join: PartialHashJoin) -> Self {
        Self { join }
    }
}

#[async_trait]
impl JoinActor for PartialHashJoinActor {
    fn name(&self) -> &str {
        "partial-hash-join"
    }

    fn test(
        &self,
        entries: &[JoinEntry],
        _context: &QueryContext,
    ) -> DeltaResult<JoinCoefficients> {
        let [left, right] = entries else {
            return Err(DeltaError::InvalidEntryCount {
                operator: "Partial hash join",
                expected: "exactly 2",
                actual: entries.len(),
            });
        };
        let left = estimate(left);
        let right = estimate(right);
        Ok(JoinCoefficients {
            iterations: left + right,
            persisted_items: left + right,
            blocking_items: 0.0,
            request_time: 0.0,
        })
    }

    async fn run(
        &self,
        entries: Vec<JoinEntry>,
        _context: &QueryContext,
    ) -> DeltaResult<BindingsOutput> {
        let actual = entries.len();
        let Ok([left, right]) = <[JoinEntry; 2]>::try_from(entries) else {
            return Err(DeltaError::InvalidEntryCount {
                operator: "Partial hash join",
                expected: "exactly 2",
                actual,
            });
        };
        Ok(self.join.execute(left.output, right.output))
    }
}

/// Joins exactly two entries with a [BindJoin].
#[derive(Debug)]
pub struct BindJoinActor {
    join: BindJoin,
    options: JoinOptions,
}

impl BindJoinActor {
    pub fn new(mediator: Arc<dyn QueryOperationMediator>, options: JoinOptions) -> Self {
        Self {
            join: BindJoin::new(mediator).with_options(options),
            options,
        }
    }
}

#[async_trait]
impl JoinActor for BindJoinActor {
    fn name(&self) -> &str {
        "bind-join"
    }

    fn test(&self, entries: &[JoinEntry], context: &QueryContext) -> DeltaResult<JoinCoefficients> {
        if entries.len() != 2 {
            return Err(DeltaError::InvalidEntryCount {
                operator: "Bind join",
                expected: "exactly 2",
                actual: entries.len(),
            });
        }
        test_bind_join(entries, context, self.options)?;

        let driver = driver_estimate(entries);
        Ok(JoinCoefficients {
            iterations: driver,
            persisted_items: 0.0,
            blocking_items: 0.0,
            request_time: driver * REQUEST_COST,
        })
    }

    async fn run(
        &self,
        entries: Vec<JoinEntry>,
        context: &QueryContext,
    ) -> DeltaResult<BindingsOutput> {
        self.join.execute(entries, context).await
    }
}

/// Joins two or more entries with a [MultiBindJoin].
#[derive(Debug)]
pub struct MultiBindJoinActor {
    join: MultiBindJoin,
    options: JoinOptions,
}

impl MultiBindJoinActor {
    pub fn new(mediator: Arc<dyn QueryOperationMediator>, options: JoinOptions) -> Self {
        Self {
            join: MultiBindJoin::new(mediator).with_options(options),
            options,
        }
    }
}

#[async_trait]
impl JoinActor for MultiBindJoinActor {
    fn name(&self) -> &str {
        "multi-bind-join"
    }

    fn test(&self, entries: &[JoinEntry], context: &QueryContext) -> DeltaResult<JoinCoefficients> {
        if entries.len() < 2 {
            return Err(DeltaError::InvalidEntryCount {
                operator: "Multi bind join",
                expected: "at least 2",
                actual: entries.len(),
            });
        }
        test_bind_join(entries, context, self.options)?;

        // Each driving binding keeps its sub-evaluation and its results in memory.
        let driver = driver_estimate(entries);
        Ok(JoinCoefficients {
            iterations: driver,
            persisted_items: driver,
            blocking_items: 0.0,
            request_time: driver * REQUEST_COST,
        })
    }

    async fn run(
        &self,
        entries: Vec<JoinEntry>,
        context: &QueryContext,
    ) -> DeltaResult<BindingsOutput> {
        self.join.execute(entries, context).await
    }
}

/// The checks that are shared by the bind join variants.
fn test_bind_join(
    entries: &[JoinEntry],
    context: &QueryContext,
    options: JoinOptions,
) -> DeltaResult<()> {
    context.ensure_haltable_sources()?;

    let undefs = entries.iter().any(|e| e.metadata().can_contain_undefs);
    if !undefs
        && options.common_variables == CommonVariablePolicy::Require
        && !has_common_variables(entries)
    {
        return Err(DeltaError::NoCommonVariables);
    }
    Ok(())
}

fn has_common_variables(entries: &[JoinEntry]) -> bool {
    let mut seen = FxHashSet::<&Variable>::default();
    entries.iter().any(|entry| {
        let variables = entry.metadata().variables.iter().collect::<FxHashSet<_>>();
        let shared = variables.iter().any(|v| seen.contains(v));
        seen.extend(variables);
        shared
    })
}

/// The entry with the smallest cardinality drives a bind join.
fn driver_estimate(entries: &[JoinEntry]) -> f64 {
    entries.iter().map(estimate).fold(f64::INFINITY, f64::min)
}

fn estimate(entry: &JoinEntry) -> f64 {
    let cardinality = entry.metadata().cardinality.value();
    f64::from(u32::try_from(cardinality).unwrap_or(u32::MAX))
}
