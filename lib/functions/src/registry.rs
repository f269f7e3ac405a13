use crate::aggregates::{
    AvgAccumulator, BindingsAggregator, CountAccumulator, ExpressionAggregator,
    ExtremumAccumulator, GroupConcatAccumulator, IncrementalAccumulator, SampleAccumulator,
    SumAccumulator, WildcardCountAggregator,
};
use crate::{
    AggregateName, AggregatorKind, DefaultExpressionEvaluatorFactory, ExpressionEvaluatorFactoryRef,
};
use rdf_delta_common::error::DeltaError;
use rdf_delta_common::DeltaResult;
use rdf_delta_model::algebra::{AggregateExpression, AggregateFunction};
use rdf_delta_model::NamedNode;
use rustc_hash::FxHashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use tracing::debug;

/// A reference-counted pointer to an implementation of the [AggregatorFactory] trait.
pub type AggregatorFactoryRef = Arc<dyn AggregatorFactory>;

/// Creates a fresh accumulator for a custom aggregate.
pub type AccumulatorConstructor = Arc<dyn Fn() -> Box<dyn IncrementalAccumulator> + Send + Sync>;

/// Creates the aggregators for the aggregate expressions of a group.
///
/// A new aggregator is created for every group, so aggregators never share state.
pub trait AggregatorFactory: Debug + Send + Sync {
    /// Fails with [DeltaError::UnsupportedAggregator] if the aggregate is not supported.
    fn create_aggregator(
        &self,
        aggregate: &AggregateExpression,
    ) -> DeltaResult<Box<dyn BindingsAggregator>>;
}

/// Supports all builtin SPARQL aggregates and custom aggregates that have been registered with
/// [DefaultAggregatorFactory::register_custom].
#[derive(Clone)]
pub struct DefaultAggregatorFactory {
    evaluators: ExpressionEvaluatorFactoryRef,
    custom: FxHashMap<NamedNode, AccumulatorConstructor>,
}

impl DefaultAggregatorFactory {
    pub fn new(evaluators: ExpressionEvaluatorFactoryRef) -> Self {
        Self {
            evaluators,
            custom: FxHashMap::default(),
        }
    }

    /// Registers a custom aggregate. A previous registration of `name` is replaced.
    pub fn register_custom(&mut self, name: NamedNode, constructor: AccumulatorConstructor) {
        debug!(%name, "Registering custom aggregate");
        self.custom.insert(name, constructor);
    }

    fn create_accumulator(
        &self,
        function: &AggregateFunction,
    ) -> DeltaResult<Box<dyn IncrementalAccumulator>> {
        let accumulator: Box<dyn IncrementalAccumulator> = match function {
            AggregateFunction::Count => Box::<CountAccumulator>::default(),
            AggregateFunction::Sum => Box::<SumAccumulator>::default(),
            AggregateFunction::Avg => Box::<AvgAccumulator>::default(),
            AggregateFunction::Min => Box::new(ExtremumAccumulator::min()),
            AggregateFunction::Max => Box::new(ExtremumAccumulator::max()),
            AggregateFunction::Sample => Box::<SampleAccumulator>::default(),
            AggregateFunction::GroupConcat { separator } => Box::new(GroupConcatAccumulator::new(
                separator
                    .as_deref()
                    .unwrap_or(GroupConcatAccumulator::DEFAULT_SEPARATOR),
            )),
            AggregateFunction::Custom(name) => match self.custom.get(name) {
                Some(constructor) => constructor(),
                None => {
                    return Err(DeltaError::UnsupportedAggregator(
                        AggregateName::from(function).to_string(),
                    ))
                }
            },
        };
        Ok(accumulator)
    }
}

impl Default for DefaultAggregatorFactory {
    fn default() -> Self {
        Self::new(Arc::new(DefaultExpressionEvaluatorFactory))
    }
}

impl Debug for DefaultAggregatorFactory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultAggregatorFactory")
            .field("evaluators", &self.evaluators)
            .field("custom", &self.custom.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl AggregatorFactory for DefaultAggregatorFactory {
    fn create_aggregator(
        &self,
        aggregate: &AggregateExpression,
    ) -> DeltaResult<Box<dyn BindingsAggregator>> {
        match aggregate {
            AggregateExpression::CountSolutions { distinct } => {
                debug!(kind = %AggregatorKind::WildcardCount, distinct, "Creating aggregator");
                Ok(Box::new(WildcardCountAggregator::new(*distinct)))
            }
            AggregateExpression::FunctionCall {
                name,
                expr,
                distinct,
            } => {
                let accumulator = self.create_accumulator(name)?;
                let evaluator = self.evaluators.create_evaluator(expr)?;
                debug!(kind = %AggregateName::from(name), distinct, "Creating aggregator");
                Ok(Box::new(ExpressionAggregator::new(
                    evaluator,
                    accumulator,
                    *distinct,
                )))
            }
        }
    }
}
