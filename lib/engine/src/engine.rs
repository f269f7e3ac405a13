use crate::actor::{BindJoinActor, JoinActor, MultiBindJoinActor, PartialHashJoinActor};
use crate::{EngineOptions, OperationOutput, OperationRequest, PhysicalPlanMetadata};
use rdf_delta_common::error::DeltaError;
use rdf_delta_common::{DeltaResult, QueryContext, QueryOperationMediator};
use rdf_delta_functions::{AggregatorFactoryRef, DefaultAggregatorFactory};
use rdf_delta_physical::group::GroupOperator;
use rdf_delta_physical::join::{JoinCoefficients, JoinEntry};
use std::sync::Arc;
use tracing::debug;

/// Represents an instance of the RDF Delta engine.
///
/// An engine consists of:
/// - The [AggregatorFactory](rdf_delta_functions::AggregatorFactory) that creates the aggregators
///   of the group operator.
/// - A list of [JoinActor]s that compete for the evaluation of inner joins.
#[derive(Clone, Debug)]
pub struct IncrementalEngine {
    options: EngineOptions,
    aggregators: AggregatorFactoryRef,
    actors: Vec<Arc<dyn JoinActor>>,
}

impl IncrementalEngine {
    /// Creates a new [IncrementalEngine] with the join actors enabled in `options`. The bind joins
    /// evaluate their sub-operations with `mediator`.
    pub fn new(mediator: Arc<dyn QueryOperationMediator>, options: EngineOptions) -> Self {
        let mut actors: Vec<Arc<dyn JoinActor>> = Vec::new();
        if options.enable_partial_hash_join {
            actors.push(Arc::new(PartialHashJoinActor::default()));
        }
        if options.enable_bind_join {
            actors.push(Arc::new(BindJoinActor::new(
                Arc::clone(&mediator),
                options.bind_join,
            )));
        }
        if options.enable_multi_bind_join {
            actors.push(Arc::new(MultiBindJoinActor::new(
                Arc::clone(&mediator),
                options.multi_bind_join,
            )));
        }

        Self {
            options,
            aggregators: Arc::new(DefaultAggregatorFactory::default()),
            actors,
        }
    }

    #[must_use]
    pub fn with_aggregator_factory(mut self, aggregators: AggregatorFactoryRef) -> Self {
        self.aggregators = aggregators;
        self
    }

    /// Registers an additional join actor.
    #[must_use]
    pub fn with_join_actor(mut self, actor: Arc<dyn JoinActor>) -> Self {
        self.actors.push(actor);
        self
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Evaluates `request` incrementally.
    pub async fn evaluate(
        &self,
        request: OperationRequest,
        context: &QueryContext,
    ) -> DeltaResult<OperationOutput> {
        match request {
            OperationRequest::Group {
                variables,
                aggregates,
                input,
            } => {
                let operator =
                    GroupOperator::new(variables, aggregates, Arc::clone(&self.aggregators));
                Ok(OperationOutput {
                    bindings: operator.execute(input),
                    physical_plan_metadata: PhysicalPlanMetadata::new("group"),
                })
            }
            OperationRequest::InnerJoin { entries } => self.evaluate_join(entries, context).await,
        }
    }

    async fn evaluate_join(
        &self,
        entries: Vec<JoinEntry>,
        context: &QueryContext,
    ) -> DeltaResult<OperationOutput> {
        if entries.is_empty() {
            return Err(DeltaError::InvalidEntryCount {
                operator: "Inner join",
                expected: "at least 1",
                actual: 0,
            });
        }
        let entries = match <[JoinEntry; 1]>::try_from(entries) {
            Ok([entry]) => {
                return Ok(OperationOutput {
                    bindings: entry.output,
                    physical_plan_metadata: PhysicalPlanMetadata::new("pass-through"),
                })
            }
            Err(entries) => entries,
        };

        let mut rejections = Vec::new();
        let mut selected: Option<(&Arc<dyn JoinActor>, JoinCoefficients)> = None;
        for actor in &self.actors {
            match actor.test(&entries, context) {
                Ok(coefficients) => {
                    debug!(
                        actor = actor.name(),
                        cost = coefficients.cost(),
                        "Join actor passed test"
                    );
                    let better = selected
                        .as_ref()
                        .map_or(true, |(_, best)| coefficients.cost() < best.cost());
                    if better {
                        selected = Some((actor, coefficients));
                    }
                }
                Err(error) => {
                    debug!(actor = actor.name(), %error, "Join actor rejected entries");
                    rejections.push(format!("{}: {error}", actor.name()));
                }
            }
        }

        let Some((actor, coefficients)) = selected else {
            return Err(DeltaError::NoJoinActor(rejections.join(", ")));
        };
        debug!(actor = actor.name(), entries = entries.len(), "Running join actor");
        let bindings = actor.run(entries, context).await?;
        Ok(OperationOutput {
            bindings,
            physical_plan_metadata: PhysicalPlanMetadata::new(actor.name())
                .with_coefficients(coefficients),
        })
    }
}
