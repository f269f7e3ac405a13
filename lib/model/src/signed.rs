use crate::Bindings;
use std::fmt::{Display, Formatter};
use std::ops::Not;

/// The polarity of a [SignedBindings].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Diff {
    /// The bindings became part of the result.
    Addition,
    /// The bindings are no longer part of the result.
    Deletion,
}

impl Diff {
    pub fn is_addition(self) -> bool {
        matches!(self, Diff::Addition)
    }
}

impl Not for Diff {
    type Output = Diff;

    fn not(self) -> Self::Output {
        match self {
            Diff::Addition => Diff::Deletion,
            Diff::Deletion => Diff::Addition,
        }
    }
}

/// A [Bindings] that is either added to or retracted from a result.
///
/// Memories of the incremental operators only store the [Bindings] part, such that additions and
/// deletions of the same content meet each other. Comparing two [SignedBindings] also compares the
/// polarity.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SignedBindings {
    pub bindings: Bindings,
    pub diff: Diff,
}

impl SignedBindings {
    pub fn new(bindings: Bindings, diff: Diff) -> Self {
        Self { bindings, diff }
    }

    pub fn addition(bindings: Bindings) -> Self {
        Self::new(bindings, Diff::Addition)
    }

    pub fn deletion(bindings: Bindings) -> Self {
        Self::new(bindings, Diff::Deletion)
    }

    pub fn is_addition(&self) -> bool {
        self.diff.is_addition()
    }

    /// Returns the same content with the opposite polarity.
    #[must_use]
    pub fn negate(self) -> Self {
        Self::new(self.bindings, !self.diff)
    }
}

impl Display for SignedBindings {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.diff {
            Diff::Addition => write!(f, "+ {}", self.bindings),
            Diff::Deletion => write!(f, "- {}", self.bindings),
        }
    }
}
