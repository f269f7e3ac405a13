use crate::join::JoinEntry;
use async_trait::async_trait;
use rdf_delta_common::error::DeltaError;
use rdf_delta_common::{CommonVariablePolicy, DeltaResult, QueryContext};
use rdf_delta_model::Variable;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt::Debug;

/// Decides the order in which the entries of a bind join are evaluated.
#[async_trait]
pub trait JoinEntriesSort: Debug + Send + Sync {
    async fn sort(
        &self,
        entries: Vec<JoinEntry>,
        context: &QueryContext,
    ) -> DeltaResult<Vec<JoinEntry>>;
}

/// Orders the entries by ascending cardinality. Entries with equal cardinality keep their order.
#[derive(Clone, Copy, Debug, Default)]
pub struct CardinalityJoinEntriesSort;

#[async_trait]
impl JoinEntriesSort for CardinalityJoinEntriesSort {
    async fn sort(
        &self,
        mut entries: Vec<JoinEntry>,
        _context: &QueryContext,
    ) -> DeltaResult<Vec<JoinEntry>> {
        entries.sort_by_key(|e| e.metadata().cardinality.value());
        Ok(entries)
    }
}

/// Orders the entries of a bind join. The first entry of the result drives the join.
///
/// If any entry can contain unbound variables, the order is not changed. Otherwise, the order is
/// decided by `sorter`, and the entries that share no variable with another entry are moved to the
/// back. If no variable is shared at all, the join is rejected unless `policy` allows it.
pub async fn sort_join_entries(
    sorter: &dyn JoinEntriesSort,
    entries: Vec<JoinEntry>,
    context: &QueryContext,
    policy: CommonVariablePolicy,
) -> DeltaResult<Vec<JoinEntry>> {
    if entries.iter().any(|e| e.metadata().can_contain_undefs) {
        return Ok(entries);
    }

    let common_variables = common_variables(&entries);
    if common_variables.is_empty() && policy == CommonVariablePolicy::Require {
        return Err(DeltaError::NoCommonVariables);
    }

    let sorted = sorter.sort(entries, context).await?;
    let (mut with_common, without_common): (Vec<_>, Vec<_>) =
        sorted.into_iter().partition(|entry| {
            entry
                .metadata()
                .variables
                .iter()
                .any(|v| common_variables.contains(v))
        });
    with_common.extend(without_common);
    Ok(with_common)
}

/// Returns the variables that occur in at least two entries.
fn common_variables(entries: &[JoinEntry]) -> FxHashSet<Variable> {
    let mut occurrences = FxHashMap::<&Variable, usize>::default();
    for entry in entries {
        for variable in entry.metadata().variables.iter().collect::<FxHashSet<_>>() {
            *occurrences.entry(variable).or_default() += 1;
        }
    }
    occurrences
        .into_iter()
        .filter(|(_, count)| *count >= 2)
        .map(|(variable, _)| variable.clone())
        .collect()
}
