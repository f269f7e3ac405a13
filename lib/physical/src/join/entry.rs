use rdf_delta_common::{BindingsOutput, BindingsStreamMetadata};
use rdf_delta_model::algebra::GraphPattern;
use rdf_delta_model::Variable;
use std::collections::BTreeSet;

/// An input of a join: the evaluated stream together with the operation that produced it.
///
/// The operation is required by the bind joins, which re-evaluate it with materialized bindings.
#[derive(Debug)]
pub struct JoinEntry {
    pub output: BindingsOutput,
    pub operation: GraphPattern,
}

impl JoinEntry {
    pub fn new(output: BindingsOutput, operation: GraphPattern) -> Self {
        Self { output, operation }
    }

    pub fn metadata(&self) -> &BindingsStreamMetadata {
        &self.output.metadata
    }

    /// Returns the variables that occur in `self` and `other`.
    pub fn common_variables(&self, other: &JoinEntry) -> Vec<Variable> {
        let other = other.metadata().variables.iter().collect::<BTreeSet<_>>();
        self.metadata()
            .variables
            .iter()
            .filter(|v| other.contains(v))
            .cloned()
            .collect()
    }
}

/// Cost estimates of a join actor for a set of entries. Lower is better.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct JoinCoefficients {
    /// The number of iterations of the join loop.
    pub iterations: f64,
    /// The number of items that are kept in memory.
    pub persisted_items: f64,
    /// The number of items that must be consumed before the first result.
    pub blocking_items: f64,
    /// The estimated time spent on sub-requests.
    pub request_time: f64,
}

impl JoinCoefficients {
    /// Combines the coefficients into a single cost.
    pub fn cost(&self) -> f64 {
        self.iterations + self.persisted_items + self.blocking_items + self.request_time
    }
}

/// Collects the variables of all entries without duplicates, keeping their first occurrence.
pub(crate) fn joined_variables<'a>(
    metadata: impl IntoIterator<Item = &'a BindingsStreamMetadata>,
) -> Vec<Variable> {
    let mut result = Vec::new();
    for variable in metadata.into_iter().flat_map(|m| m.variables.iter()) {
        if !result.contains(variable) {
            result.push(variable.clone());
        }
    }
    result
}
