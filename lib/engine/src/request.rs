use rdf_delta_common::BindingsOutput;
use rdf_delta_model::algebra::AggregateExpression;
use rdf_delta_model::Variable;
use rdf_delta_physical::join::{JoinCoefficients, JoinEntry};

/// An operation that is evaluated by an [IncrementalEngine](crate::IncrementalEngine).
#[derive(Debug)]
pub enum OperationRequest {
    /// Groups `input` by `variables` and computes the `aggregates` of each group.
    Group {
        variables: Vec<Variable>,
        aggregates: Vec<(Variable, AggregateExpression)>,
        input: BindingsOutput,
    },
    /// Computes the inner join of all `entries`.
    InnerJoin { entries: Vec<JoinEntry> },
}

/// Describes how an operation was evaluated.
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicalPlanMetadata {
    /// The name of the operator that evaluates the operation.
    pub operator: String,
    /// The estimated costs of the selected join actor.
    pub coefficients: Option<JoinCoefficients>,
}

impl PhysicalPlanMetadata {
    pub fn new(operator: impl Into<String>) -> Self {
        Self {
            operator: operator.into(),
            coefficients: None,
        }
    }

    #[must_use]
    pub fn with_coefficients(mut self, coefficients: JoinCoefficients) -> Self {
        self.coefficients = Some(coefficients);
        self
    }
}

/// The result of an [OperationRequest].
#[derive(Debug)]
pub struct OperationOutput {
    pub bindings: BindingsOutput,
    pub physical_plan_metadata: PhysicalPlanMetadata,
}
