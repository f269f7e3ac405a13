use std::error::Error;

/// An error that terminates an incremental operator.
///
/// Expected SPARQL evaluation failures (e.g., a type error while evaluating an aggregate input)
/// are *not* represented by this type. They are handled via `ThinError` and only affect a single
/// row.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DeltaError {
    /// A deletion arrived for content that is currently not part of the operator's memory.
    #[error("Received deletion for non-existing addition")]
    DeletionForNonExistingAddition,
    /// The aggregate function is not known to the aggregator factory.
    #[error("Unsupported aggregator {0}")]
    UnsupportedAggregator(String),
    /// The expression cannot be evaluated by the expression evaluator.
    #[error("Unsupported expression {0}")]
    UnsupportedExpression(String),
    /// A bind join was asked to join entries that do not share a variable.
    #[error("Bind join can only join entries with at least one common variable")]
    NoCommonVariables,
    /// A join received a number of entries that it cannot handle.
    #[error("{operator} requires {expected} entries, received {actual}")]
    InvalidEntryCount {
        operator: &'static str,
        expected: &'static str,
        actual: usize,
    },
    /// A streaming source in the context does not support halting and resuming.
    #[error("A source can't halt or resume")]
    SourceCannotHalt,
    /// No registered join actor accepted the join entries.
    #[error("No join actor could join the entries: {0}")]
    NoJoinActor(String),
    /// An error raised by an external collaborator (e.g., a mediator).
    #[error("{0}")]
    Other(#[source] Box<dyn Error + Send + Sync + 'static>),
}

impl DeltaError {
    /// Wraps an error of an external collaborator.
    #[inline]
    pub fn other(error: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        Self::Other(error.into())
    }
}
