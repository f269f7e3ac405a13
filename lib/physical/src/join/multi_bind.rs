use crate::join::bind::{
    hash_content, mediate_owned, prepare_entries, MediationFuture, PreparedEntries,
};
use crate::join::materialize::materialize_operation;
use crate::join::sort::{CardinalityJoinEntriesSort, JoinEntriesSort};
use crate::join::JoinEntry;
use crate::BucketMemory;
use futures::{FutureExt, Stream, StreamExt};
use rdf_delta_common::error::DeltaError;
use rdf_delta_common::{
    BindingsHash, BindingsMerger, BindingsOutput, CompatibleBindingsMerger, DeltaResult,
    FxBindingsHasher, HashBindings, JoinOptions, QueryContext, QueryOperationMediator,
    SendableBindingsStream,
};
use rdf_delta_model::algebra::GraphPattern;
use rdf_delta_model::{Bindings, Diff, SignedBindings};
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tracing::debug;

/// Joins any number of entries by evaluating all remaining entries once per driving binding.
///
/// The remaining entries are materialized with the driving binding and joined into a single
/// sub-operation. In contrast to the [BindJoin](crate::join::BindJoin), the merged results of each
/// sub-evaluation are remembered. Repeated additions of the same driving binding therefore re-use
/// the running sub-evaluation, and deletions are answered from memory without re-evaluating
/// anything. The sub-evaluation is closed once the last copy of the driving binding is deleted.
#[derive(Debug, Clone)]
pub struct MultiBindJoin {
    mediator: Arc<dyn QueryOperationMediator>,
    sorter: Arc<dyn JoinEntriesSort>,
    hasher: Arc<dyn HashBindings>,
    merger: Arc<dyn BindingsMerger>,
    options: JoinOptions,
}

impl MultiBindJoin {
    pub fn new(mediator: Arc<dyn QueryOperationMediator>) -> Self {
        Self {
            mediator,
            sorter: Arc::new(CardinalityJoinEntriesSort),
            hasher: Arc::new(FxBindingsHasher),
            merger: Arc::new(CompatibleBindingsMerger),
            options: JoinOptions::default(),
        }
    }

    #[must_use]
    pub fn with_sorter(mut self, sorter: Arc<dyn JoinEntriesSort>) -> Self {
        self.sorter = sorter;
        self
    }

    #[must_use]
    pub fn with_hasher(mut self, hasher: Arc<dyn HashBindings>) -> Self {
        self.hasher = hasher;
        self
    }

    #[must_use]
    pub fn with_merger(mut self, merger: Arc<dyn BindingsMerger>) -> Self {
        self.merger = merger;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: JoinOptions) -> Self {
        self.options = options;
        self
    }

    pub async fn execute(
        &self,
        entries: Vec<JoinEntry>,
        context: &QueryContext,
    ) -> DeltaResult<BindingsOutput> {
        if entries.len() < 2 {
            return Err(DeltaError::InvalidEntryCount {
                operator: "Multi bind join",
                expected: "at least 2",
                actual: entries.len(),
            });
        }

        let PreparedEntries {
            driver,
            remaining,
            metadata,
        } = prepare_entries(self.sorter.as_ref(), entries, context, self.options).await?;
        debug!(
            variables = ?metadata.variables,
            remaining = remaining.len(),
            "Executing multi bind join"
        );

        let stream = MultiBindJoinStream {
            driver: Some(driver),
            remaining,
            context: context.clone(),
            mediator: Arc::clone(&self.mediator),
            hasher: Arc::clone(&self.hasher),
            merger: Arc::clone(&self.merger),
            memories: BucketMemory::default(),
            pending: None,
            buffer: VecDeque::new(),
            failed: false,
        };
        Ok(BindingsOutput::new(Box::pin(stream), metadata))
    }
}

/// The state of the sub-evaluation for a driving binding.
struct SubEvaluationMemory {
    /// How often the driving binding is currently present.
    count: usize,
    operation: GraphPattern,
    /// The merged results that are currently part of the sub-evaluation.
    results: BucketMemory<usize>,
    stream: Option<SendableBindingsStream>,
}

struct PendingMaterialization {
    driving: Bindings,
    hash: BindingsHash,
    operation: GraphPattern,
    future: MediationFuture,
}

struct MultiBindJoinStream {
    driver: Option<SendableBindingsStream>,
    remaining: Vec<GraphPattern>,
    context: QueryContext,
    mediator: Arc<dyn QueryOperationMediator>,
    hasher: Arc<dyn HashBindings>,
    merger: Arc<dyn BindingsMerger>,
    memories: BucketMemory<SubEvaluationMemory>,
    pending: Option<PendingMaterialization>,
    buffer: VecDeque<SignedBindings>,
    failed: bool,
}

impl MultiBindJoinStream {
    fn materialize(&self, bindings: &Bindings) -> GraphPattern {
        self.remaining
            .iter()
            .map(|operation| materialize_operation(operation, bindings))
            .reduce(|left, right| GraphPattern::Join {
                left: Box::new(left),
                right: Box::new(right),
            })
            .unwrap_or_else(|| GraphPattern::Bgp {
                patterns: Vec::new(),
            })
    }

    fn handle_driver_change(&mut self, item: SignedBindings) -> DeltaResult<()> {
        let hash = hash_content(self.hasher.as_ref(), &item.bindings);
        match item.diff {
            Diff::Addition => {
                if let Some(memory) = self.memories.get_mut(hash, &item.bindings) {
                    memory.count += 1;
                    replay_results(&memory.results, Diff::Addition, &mut self.buffer);
                    return Ok(());
                }

                let operation = self.materialize(&item.bindings);
                let future = mediate_owned(&self.mediator, operation.clone(), &self.context);
                self.pending = Some(PendingMaterialization {
                    driving: item.bindings,
                    hash,
                    operation,
                    future,
                });
            }
            Diff::Deletion => {
                let Some(memory) = self.memories.get_mut(hash, &item.bindings) else {
                    return Err(DeltaError::DeletionForNonExistingAddition);
                };
                memory.count -= 1;
                replay_results(&memory.results, Diff::Deletion, &mut self.buffer);
                if memory.count == 0 {
                    if let Some(memory) = self.memories.remove(hash, &item.bindings) {
                        let _guard = self.context.halt_sources();
                        drop(memory.stream);
                        debug!(
                            driving = %item.bindings,
                            operation = %memory.operation,
                            "Closed sub-evaluation of multi bind join"
                        );
                    }
                }
            }
        }
        Ok(())
    }

    /// Polls the pending materialization. Returns whether it has completed.
    fn poll_pending(&mut self, cx: &mut Context<'_>) -> DeltaResult<bool> {
        let Some(pending) = &mut self.pending else {
            return Ok(false);
        };
        let Poll::Ready(output) = pending.future.poll_unpin(cx) else {
            return Ok(false);
        };
        let output = output?;
        if let Some(pending) = self.pending.take() {
            self.memories
                .get_or_insert_with(pending.hash, &pending.driving, || SubEvaluationMemory {
                    count: 1,
                    operation: pending.operation,
                    results: BucketMemory::default(),
                    stream: Some(output.stream),
                });
        }
        Ok(true)
    }

    /// Polls each sub-stream once. Returns whether any sub-stream made progress.
    fn poll_sub_evaluations(&mut self, cx: &mut Context<'_>) -> DeltaResult<bool> {
        let mut progressed = false;
        for (driving, memory) in self.memories.iter_mut() {
            let Some(stream) = &mut memory.stream else {
                continue;
            };
            match stream.poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(item))) => {
                    if let Some(merged) = self.merger.merge(driving, &item.bindings) {
                        let hash = hash_content(self.hasher.as_ref(), &merged);
                        match item.diff {
                            Diff::Addition => {
                                memory.results.increment(hash, &merged);
                            }
                            Diff::Deletion => {
                                memory.results.decrement(hash, &merged)?;
                            }
                        }
                        for _ in 0..memory.count {
                            self.buffer
                                .push_back(SignedBindings::new(merged.clone(), item.diff));
                        }
                    }
                }
                Poll::Ready(Some(Err(error))) => return Err(error),
                Poll::Ready(None) => memory.stream = None,
                Poll::Pending => continue,
            }
            progressed = true;
        }
        Ok(progressed)
    }

    fn has_live_sub_evaluations(&self) -> bool {
        self.memories.iter().any(|(_, m)| m.stream.is_some())
    }

    fn fail(&mut self, error: DeltaError) -> Poll<Option<DeltaResult<SignedBindings>>> {
        self.failed = true;
        self.driver = None;
        self.pending = None;
        self.memories = BucketMemory::default();
        self.buffer.clear();
        Poll::Ready(Some(Err(error)))
    }

    fn poll_inner(&mut self, cx: &mut Context<'_>) -> Poll<Option<DeltaResult<SignedBindings>>> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Poll::Ready(Some(Ok(item)));
            }
            if self.failed {
                return Poll::Ready(None);
            }

            let mut progressed = match self.poll_pending(cx) {
                Ok(progressed) => progressed,
                Err(error) => return self.fail(error),
            };
            match self.poll_sub_evaluations(cx) {
                Ok(sub_progressed) => progressed |= sub_progressed,
                Err(error) => return self.fail(error),
            }

            if self.pending.is_none() {
                if let Some(driver) = &mut self.driver {
                    match driver.poll_next_unpin(cx) {
                        Poll::Ready(Some(Ok(item))) => {
                            if let Err(error) = self.handle_driver_change(item) {
                                return self.fail(error);
                            }
                            progressed = true;
                        }
                        Poll::Ready(Some(Err(error))) => return self.fail(error),
                        Poll::Ready(None) => {
                            self.driver = None;
                            progressed = true;
                        }
                        Poll::Pending => {}
                    }
                }
            }

            if !progressed && self.buffer.is_empty() {
                let finished = self.driver.is_none()
                    && self.pending.is_none()
                    && !self.has_live_sub_evaluations();
                return if finished {
                    Poll::Ready(None)
                } else {
                    Poll::Pending
                };
            }
        }
    }
}

/// Emits every remembered result, respecting its multiplicity.
fn replay_results(
    results: &BucketMemory<usize>,
    diff: Diff,
    buffer: &mut VecDeque<SignedBindings>,
) {
    for (bindings, multiplicity) in results.iter() {
        for _ in 0..*multiplicity {
            buffer.push_back(SignedBindings::new(bindings.clone(), diff));
        }
    }
}

impl Stream for MultiBindJoinStream {
    type Item = DeltaResult<SignedBindings>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        this.poll_inner(cx)
    }
}
