use crate::{BindingsOutput, DeltaResult, QueryContext};
use async_trait::async_trait;
use rdf_delta_model::algebra::GraphPattern;
use rdf_delta_model::Bindings;
use std::fmt::Debug;

/// Evaluates (sub-)operations on behalf of an operator.
///
/// The bind joins call this mediator with materialized operations, possibly many times for the
/// same operation. Dropping the returned stream closes it.
#[async_trait]
pub trait QueryOperationMediator: Debug + Send + Sync {
    async fn mediate(
        &self,
        operation: &GraphPattern,
        context: &QueryContext,
    ) -> DeltaResult<BindingsOutput>;
}

/// Combines two bindings that are joined.
///
/// Implementations can use this hook to merge additional information that is attached to the
/// bindings.
pub trait BindingsMerger: Debug + Send + Sync {
    /// Returns [None] if the bindings are not compatible.
    fn merge(&self, left: &Bindings, right: &Bindings) -> Option<Bindings>;
}

/// Merges compatible solution mappings as defined by SPARQL.
#[derive(Clone, Copy, Debug, Default)]
pub struct CompatibleBindingsMerger;

impl BindingsMerger for CompatibleBindingsMerger {
    fn merge(&self, left: &Bindings, right: &Bindings) -> Option<Bindings> {
        left.merge(right)
    }
}
