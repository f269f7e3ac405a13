//! Incremental grouping and aggregation.

mod state;
mod stream;

use crate::group::state::GroupsState;
use crate::group::stream::GroupStream;
use rdf_delta_common::{BindingsOutput, BindingsStreamMetadata, FxBindingsHasher, HashBindings};
use rdf_delta_functions::AggregatorFactoryRef;
use rdf_delta_model::algebra::AggregateExpression;
use rdf_delta_model::Variable;
use std::sync::Arc;
use tracing::debug;

/// Groups the bindings of a stream and maintains the aggregates of each group.
///
/// Every change of the input produces the changes of the affected group's output row: the
/// previous row as a deletion (if one was emitted) followed by the new row as an addition.
/// Changes that do not alter the row produce no output. Without group variables, all bindings
/// belong to a single implicit group that also produces a row if the input is empty.
#[derive(Debug, Clone)]
pub struct GroupOperator {
    variables: Vec<Variable>,
    aggregates: Vec<(Variable, AggregateExpression)>,
    factory: AggregatorFactoryRef,
    hasher: Arc<dyn HashBindings>,
}

impl GroupOperator {
    pub fn new(
        variables: Vec<Variable>,
        aggregates: Vec<(Variable, AggregateExpression)>,
        factory: AggregatorFactoryRef,
    ) -> Self {
        Self {
            variables,
            aggregates,
            factory,
            hasher: Arc::new(FxBindingsHasher),
        }
    }

    #[must_use]
    pub fn with_hasher(mut self, hasher: Arc<dyn HashBindings>) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn execute(&self, input: BindingsOutput) -> BindingsOutput {
        let variables = self
            .variables
            .iter()
            .chain(self.aggregates.iter().map(|(v, _)| v))
            .cloned()
            .collect::<Vec<_>>();
        let metadata = BindingsStreamMetadata::new(input.metadata.cardinality, variables)
            .with_undefs(input.metadata.can_contain_undefs || !self.aggregates.is_empty());
        debug!(
            group_variables = ?self.variables,
            aggregates = self.aggregates.len(),
            "Executing group operator"
        );

        let state = GroupsState::new(
            self.variables.clone(),
            self.aggregates.clone(),
            Arc::clone(&self.factory),
            Arc::clone(&self.hasher),
        );
        BindingsOutput::new(Box::pin(GroupStream::new(input.stream, state)), metadata)
    }
}
