use crate::join::entry::joined_variables;
use crate::join::inner::{IncrementalInnerJoinStream, IncrementalJoinState, JoinSide};
use crate::BucketMemory;
use rdf_delta_common::{
    BindingsHash, BindingsMerger, BindingsOutput, BindingsStreamMetadata,
    CompatibleBindingsMerger, DeltaResult, FxBindingsHasher, HashBindings,
};
use rdf_delta_model::{Bindings, Diff, SignedBindings, Variable};
use std::sync::Arc;
use tracing::debug;

/// A symmetric hash join that keeps a bucket memory for each input.
///
/// Every change of an input updates the memory of that input and is then joined with the
/// matching bucket of the other input. The results carry the polarity of the change.
///
/// Bindings that leave a common variable unbound cannot be located by their hash. They are kept
/// apart and joined with every stored binding of the other input.
#[derive(Debug, Clone)]
pub struct PartialHashJoin {
    hasher: Arc<dyn HashBindings>,
    merger: Arc<dyn BindingsMerger>,
}

impl PartialHashJoin {
    pub fn new(hasher: Arc<dyn HashBindings>, merger: Arc<dyn BindingsMerger>) -> Self {
        Self { hasher, merger }
    }

    /// Joins `left` with `right`.
    pub fn execute(&self, left: BindingsOutput, right: BindingsOutput) -> BindingsOutput {
        let common_variables = left
            .metadata
            .variables
            .iter()
            .filter(|v| right.metadata.variables.contains(v))
            .cloned()
            .collect::<Vec<_>>();
        debug!(?common_variables, "Executing partial hash join");

        let metadata = BindingsStreamMetadata::new(
            left.metadata
                .cardinality
                .product(right.metadata.cardinality),
            joined_variables([&left.metadata, &right.metadata]),
        )
        .with_undefs(left.metadata.can_contain_undefs || right.metadata.can_contain_undefs);

        let state = PartialHashJoinState {
            common_variables,
            hasher: Arc::clone(&self.hasher),
            merger: Arc::clone(&self.merger),
            left: SideMemory::default(),
            right: SideMemory::default(),
            replay: None,
        };
        let stream = IncrementalInnerJoinStream::new(left.stream, right.stream, state);
        BindingsOutput::new(Box::pin(stream), metadata)
    }
}

impl Default for PartialHashJoin {
    fn default() -> Self {
        Self::new(Arc::new(FxBindingsHasher), Arc::new(CompatibleBindingsMerger))
    }
}

/// The cross product of a single change with a snapshot of the matching opposite bucket.
#[derive(Debug)]
struct Replay {
    side: JoinSide,
    element: Bindings,
    diff: Diff,
    others: Vec<(Bindings, usize)>,
    index: usize,
    emitted: usize,
}

/// The stored bindings of one input with their multiplicities.
#[derive(Debug, Default)]
struct SideMemory {
    /// Bindings that bind all common variables.
    complete: BucketMemory<usize>,
    /// Bindings that leave at least one common variable unbound.
    partial: BucketMemory<usize>,
}

impl SideMemory {
    /// Returns the stored bindings that may be compatible with a change of the other input.
    fn candidates(&self, hash: BindingsHash, complete: bool) -> Vec<(Bindings, usize)> {
        let keyed = if complete {
            self.complete.bucket(hash).to_vec()
        } else {
            self.complete
                .iter()
                .map(|(bindings, count)| (bindings.clone(), *count))
                .collect()
        };
        keyed
            .into_iter()
            .chain(
                self.partial
                    .iter()
                    .map(|(bindings, count)| (bindings.clone(), *count)),
            )
            .collect()
    }
}

#[derive(Debug)]
struct PartialHashJoinState {
    common_variables: Vec<Variable>,
    hasher: Arc<dyn HashBindings>,
    merger: Arc<dyn BindingsMerger>,
    left: SideMemory,
    right: SideMemory,
    replay: Option<Replay>,
}

impl IncrementalJoinState for PartialHashJoinState {
    fn push(&mut self, side: JoinSide, item: SignedBindings) -> DeltaResult<()> {
        let hash = self
            .hasher
            .hash_bindings(&item.bindings, &self.common_variables);
        let complete = self
            .common_variables
            .iter()
            .all(|v| item.bindings.contains(v));
        let (own, other) = match side {
            JoinSide::Left => (&mut self.left, &self.right),
            JoinSide::Right => (&mut self.right, &self.left),
        };
        let own = if complete {
            &mut own.complete
        } else {
            &mut own.partial
        };

        match item.diff {
            Diff::Addition => {
                own.increment(hash, &item.bindings);
            }
            Diff::Deletion => {
                own.decrement(hash, &item.bindings)?;
            }
        }

        let others = other.candidates(hash, complete);
        if !others.is_empty() {
            self.replay = Some(Replay {
                side,
                element: item.bindings,
                diff: item.diff,
                others,
                index: 0,
                emitted: 0,
            });
        }
        Ok(())
    }

    fn pull(&mut self) -> Option<SignedBindings> {
        let replay = self.replay.as_mut()?;
        while let Some((other, count)) = replay.others.get(replay.index) {
            if replay.emitted < *count {
                let merged = match replay.side {
                    JoinSide::Left => self.merger.merge(&replay.element, other),
                    JoinSide::Right => self.merger.merge(other, &replay.element),
                };
                if let Some(merged) = merged {
                    replay.emitted += 1;
                    return Some(SignedBindings::new(merged, replay.diff));
                }
            }
            replay.index += 1;
            replay.emitted = 0;
        }
        self.replay = None;
        None
    }
}
