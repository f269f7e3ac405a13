use crate::DeltaResult;
use futures::stream::{self, Stream};
use rdf_delta_model::{SignedBindings, Variable};
use std::fmt::{Debug, Formatter};
use std::pin::Pin;

/// A stream of signed bindings. Dropping the stream closes it.
pub type SendableBindingsStream =
    Pin<Box<dyn Stream<Item = DeltaResult<SignedBindings>> + Send>>;

/// The number of bindings a stream is expected to produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cardinality {
    Exact(u64),
    Estimate(u64),
}

impl Cardinality {
    pub fn value(self) -> u64 {
        match self {
            Cardinality::Exact(value) | Cardinality::Estimate(value) => value,
        }
    }

    pub fn is_exact(self) -> bool {
        matches!(self, Cardinality::Exact(_))
    }

    /// Estimates the cardinality of a cross product of `self` and `other`.
    #[must_use]
    pub fn product(self, other: Cardinality) -> Cardinality {
        Cardinality::Estimate(self.value().saturating_mul(other.value()))
    }
}

/// Metadata that describes a [SendableBindingsStream].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindingsStreamMetadata {
    pub cardinality: Cardinality,
    pub variables: Vec<Variable>,
    /// Whether some variables may be unbound in some of the bindings.
    pub can_contain_undefs: bool,
}

impl BindingsStreamMetadata {
    pub fn new(cardinality: Cardinality, variables: Vec<Variable>) -> Self {
        Self {
            cardinality,
            variables,
            can_contain_undefs: false,
        }
    }

    #[must_use]
    pub fn with_undefs(mut self, can_contain_undefs: bool) -> Self {
        self.can_contain_undefs = can_contain_undefs;
        self
    }
}

/// The result of evaluating an operation that produces bindings.
pub struct BindingsOutput {
    pub stream: SendableBindingsStream,
    pub metadata: BindingsStreamMetadata,
}

impl BindingsOutput {
    pub fn new(stream: SendableBindingsStream, metadata: BindingsStreamMetadata) -> Self {
        Self { stream, metadata }
    }

    /// Creates an output that yields `items` and then ends.
    pub fn from_items(items: Vec<SignedBindings>, variables: Vec<Variable>) -> Self {
        let cardinality = Cardinality::Exact(u64::try_from(items.len()).unwrap_or(u64::MAX));
        let stream = Box::pin(stream::iter(items.into_iter().map(Ok)));
        Self::new(stream, BindingsStreamMetadata::new(cardinality, variables))
    }
}

impl Debug for BindingsOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingsOutput")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}
