use rdf_delta_model::algebra::AggregateFunction;
use rdf_delta_model::NamedNode;
use std::fmt::{Display, Formatter};

/// The builtin SPARQL aggregates.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum AggregatorKind {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    Sample,
    GroupConcat,
    /// `COUNT(*)`
    WildcardCount,
}

impl Display for AggregatorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AggregatorKind::Count => "COUNT",
            AggregatorKind::Sum => "SUM",
            AggregatorKind::Avg => "AVG",
            AggregatorKind::Min => "MIN",
            AggregatorKind::Max => "MAX",
            AggregatorKind::Sample => "SAMPLE",
            AggregatorKind::GroupConcat => "GROUP_CONCAT",
            AggregatorKind::WildcardCount => "COUNT(*)",
        };
        f.write_str(name)
    }
}

/// Identifier for an aggregate. Either it is a builtin or a custom aggregate.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum AggregateName {
    Builtin(AggregatorKind),
    Custom(NamedNode),
}

impl From<&AggregateFunction> for AggregateName {
    fn from(function: &AggregateFunction) -> Self {
        match function {
            AggregateFunction::Count => AggregateName::Builtin(AggregatorKind::Count),
            AggregateFunction::Sum => AggregateName::Builtin(AggregatorKind::Sum),
            AggregateFunction::Avg => AggregateName::Builtin(AggregatorKind::Avg),
            AggregateFunction::Min => AggregateName::Builtin(AggregatorKind::Min),
            AggregateFunction::Max => AggregateName::Builtin(AggregatorKind::Max),
            AggregateFunction::Sample => AggregateName::Builtin(AggregatorKind::Sample),
            AggregateFunction::GroupConcat { .. } => {
                AggregateName::Builtin(AggregatorKind::GroupConcat)
            }
            AggregateFunction::Custom(name) => AggregateName::Custom(name.clone()),
        }
    }
}

impl Display for AggregateName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregateName::Builtin(builtin) => builtin.fmt(f),
            AggregateName::Custom(name) => name.fmt(f),
        }
    }
}
