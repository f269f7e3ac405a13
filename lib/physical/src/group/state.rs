use crate::BucketMemory;
use rdf_delta_common::error::DeltaError;
use rdf_delta_common::{DeltaResult, HashBindings};
use rdf_delta_functions::aggregates::BindingsAggregator;
use rdf_delta_functions::AggregatorFactory;
use rdf_delta_model::algebra::AggregateExpression;
use rdf_delta_model::{Bindings, Diff, SignedBindings, Variable};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

/// The aggregation state of a single group.
#[derive(Debug)]
struct Group {
    /// The number of input bindings that are currently part of the group.
    count: usize,
    aggregators: Vec<Box<dyn BindingsAggregator>>,
    /// The row that was last emitted for this group.
    emitted: Option<Bindings>,
}

/// The state of all groups of a [GroupOperator](crate::group::GroupOperator).
#[derive(Debug)]
pub(super) struct GroupsState {
    variables: Vec<Variable>,
    aggregates: Vec<(Variable, AggregateExpression)>,
    factory: Arc<dyn AggregatorFactory>,
    hasher: Arc<dyn HashBindings>,
    groups: BucketMemory<Group>,
}

impl GroupsState {
    pub fn new(
        variables: Vec<Variable>,
        aggregates: Vec<(Variable, AggregateExpression)>,
        factory: Arc<dyn AggregatorFactory>,
        hasher: Arc<dyn HashBindings>,
    ) -> Self {
        Self {
            variables,
            aggregates,
            factory,
            hasher,
            groups: BucketMemory::default(),
        }
    }

    fn has_implicit_group(&self) -> bool {
        self.variables.is_empty()
    }

    /// Applies a change of the input and pushes the resulting changes to `output`.
    pub fn apply(
        &mut self,
        item: SignedBindings,
        output: &mut VecDeque<SignedBindings>,
    ) -> DeltaResult<()> {
        let key = item.bindings.project(&self.variables);
        let hash = self.hasher.hash_bindings(&key, &self.variables);
        let implicit = self.has_implicit_group();

        let group = match item.diff {
            Diff::Addition => {
                let group = self.groups.get_or_try_insert_with(hash, &key, || {
                    create_group(self.factory.as_ref(), &self.aggregates, &key)
                })?;
                group.count += 1;
                for aggregator in &mut group.aggregators {
                    aggregator.put(&item.bindings)?;
                }
                group
            }
            Diff::Deletion => {
                // The implicit group exists without any input before the first addition.
                let group = match self.groups.get_mut(hash, &key) {
                    Some(group) if group.count > 0 => group,
                    _ => return Err(DeltaError::DeletionForNonExistingAddition),
                };
                for aggregator in &mut group.aggregators {
                    aggregator.remove(&item.bindings)?;
                }
                group.count -= 1;

                if group.count == 0 && !implicit {
                    if let Some(group) = self.groups.remove(hash, &key) {
                        debug!(%key, "Destroyed group");
                        if let Some(row) = group.emitted {
                            output.push_back(SignedBindings::deletion(row));
                        }
                    }
                    return Ok(());
                }
                group
            }
        };

        emit_changes(&key, &self.aggregates, group, output);
        Ok(())
    }

    /// Emits the row of the implicit group if it does not exist yet.
    ///
    /// This is called when the input is exhausted or not ready, so that an empty input still
    /// produces the row of an aggregation without group variables.
    pub fn emit_implicit_group(
        &mut self,
        output: &mut VecDeque<SignedBindings>,
    ) -> DeltaResult<()> {
        if !self.has_implicit_group() {
            return Ok(());
        }

        let key = Bindings::new();
        let hash = self.hasher.hash_bindings(&key, &self.variables);
        if self.groups.get(hash, &key).is_some() {
            return Ok(());
        }

        let group = self.groups.get_or_try_insert_with(hash, &key, || {
            create_group(self.factory.as_ref(), &self.aggregates, &key)
        })?;
        emit_changes(&key, &self.aggregates, group, output);
        Ok(())
    }
}

fn create_group(
    factory: &dyn AggregatorFactory,
    aggregates: &[(Variable, AggregateExpression)],
    key: &Bindings,
) -> DeltaResult<Group> {
    let aggregators = aggregates
        .iter()
        .map(|(_, expression)| factory.create_aggregator(expression))
        .collect::<DeltaResult<Vec<_>>>()?;
    debug!(%key, "Created group");
    Ok(Group {
        count: 0,
        aggregators,
        emitted: None,
    })
}

/// Emits the changes of the group's row since it was last emitted.
fn emit_changes(
    key: &Bindings,
    aggregates: &[(Variable, AggregateExpression)],
    group: &mut Group,
    output: &mut VecDeque<SignedBindings>,
) {
    let mut row = key.clone();
    for ((variable, _), aggregator) in aggregates.iter().zip(&group.aggregators) {
        if let Some(value) = aggregator.result() {
            row.insert(variable.clone(), value);
        }
    }

    if group.emitted.as_ref() == Some(&row) {
        return;
    }
    if let Some(previous) = group.emitted.replace(row.clone()) {
        output.push_back(SignedBindings::deletion(previous));
    }
    output.push_back(SignedBindings::addition(row));
}
