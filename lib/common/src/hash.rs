use rdf_delta_model::{Bindings, Variable};
use rustc_hash::FxHasher;
use std::fmt::Debug;
use std::hash::{Hash, Hasher};

/// A hash of a [Bindings] restricted to a set of variables.
///
/// Equal restrictions always have the same hash. Different restrictions may collide, so users of
/// this hash must compare the contents on a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingsHash(pub u64);

/// Computes [BindingsHash]es for the memories of the incremental operators.
pub trait HashBindings: Debug + Send + Sync {
    /// Hashes `bindings` restricted to `variables`. The order of `variables` must not influence
    /// the result.
    fn hash_bindings(&self, bindings: &Bindings, variables: &[Variable]) -> BindingsHash;
}

/// The default [HashBindings] based on [FxHasher].
#[derive(Clone, Copy, Debug, Default)]
pub struct FxBindingsHasher;

impl HashBindings for FxBindingsHasher {
    fn hash_bindings(&self, bindings: &Bindings, variables: &[Variable]) -> BindingsHash {
        let mut sorted = variables.iter().collect::<Vec<_>>();
        sorted.sort_unstable();
        sorted.dedup();

        let mut hasher = FxHasher::default();
        for variable in sorted {
            variable.hash(&mut hasher);
            // An unbound variable hashes as `None`.
            bindings.get(variable).hash(&mut hasher);
        }
        BindingsHash(hasher.finish())
    }
}
