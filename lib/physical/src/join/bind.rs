use crate::join::entry::joined_variables;
use crate::join::materialize::materialize_operation;
use crate::join::sort::{sort_join_entries, CardinalityJoinEntriesSort, JoinEntriesSort};
use crate::join::JoinEntry;
use crate::BucketMemory;
use futures::future::BoxFuture;
use futures::{FutureExt, Stream, StreamExt, TryStreamExt};
use rdf_delta_common::error::DeltaError;
use rdf_delta_common::{
    BindingsHash, BindingsMerger, BindingsOutput, BindingsStreamMetadata, Cardinality,
    CompatibleBindingsMerger, DeltaResult, FxBindingsHasher, HashBindings, JoinOptions,
    QueryContext, QueryOperationMediator, SendableBindingsStream,
};
use rdf_delta_model::algebra::GraphPattern;
use rdf_delta_model::{Bindings, Diff, SignedBindings, Variable};
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tracing::debug;

pub(super) type MediationFuture = BoxFuture<'static, DeltaResult<BindingsOutput>>;

/// Evaluates `operation` with an owned copy of the inputs so that the future can be stored.
pub(super) fn mediate_owned(
    mediator: &Arc<dyn QueryOperationMediator>,
    operation: GraphPattern,
    context: &QueryContext,
) -> MediationFuture {
    let mediator = Arc::clone(mediator);
    let context = context.clone();
    Box::pin(async move { mediator.mediate(&operation, &context).await })
}

/// Hashes `bindings` over all of its variables.
pub(super) fn hash_content(hasher: &dyn HashBindings, bindings: &Bindings) -> BindingsHash {
    let variables = bindings.variables().cloned().collect::<Vec<Variable>>();
    hasher.hash_bindings(bindings, &variables)
}

/// The driving entry of a bind join and the operations of the remaining entries.
pub(super) struct PreparedEntries {
    pub driver: SendableBindingsStream,
    pub remaining: Vec<GraphPattern>,
    pub metadata: BindingsStreamMetadata,
}

/// Orders the entries and splits them into the driving stream and the remaining operations. The
/// streams of the remaining entries are closed.
pub(super) async fn prepare_entries(
    sorter: &dyn JoinEntriesSort,
    entries: Vec<JoinEntry>,
    context: &QueryContext,
    options: JoinOptions,
) -> DeltaResult<PreparedEntries> {
    let entries = sort_join_entries(sorter, entries, context, options.common_variables).await?;

    let cardinality = entries
        .iter()
        .map(|e| e.metadata().cardinality)
        .reduce(|a, b| a.product(b));
    let metadata = BindingsStreamMetadata::new(
        cardinality.unwrap_or(Cardinality::Exact(0)),
        joined_variables(entries.iter().map(JoinEntry::metadata)),
    )
    .with_undefs(entries.iter().any(|e| e.metadata().can_contain_undefs));

    let mut entries = entries.into_iter();
    let Some(driver) = entries.next() else {
        return Err(DeltaError::InvalidEntryCount {
            operator: "Bind join",
            expected: "at least 2",
            actual: 0,
        });
    };
    let remaining = entries.map(|e| e.operation).collect();
    Ok(PreparedEntries {
        driver: driver.output.stream,
        remaining,
        metadata,
    })
}

/// Joins two entries by evaluating the second entry once for every binding of the first one.
///
/// For each driving addition, the remaining operation is materialized with the values of the
/// binding and evaluated via the [QueryOperationMediator]. The results of these sub-evaluations
/// are merged with the driving binding and forwarded with their own polarity.
///
/// A driving deletion pops the most recent sub-evaluation of the binding. While the sources are
/// halted, the pending changes of the old sub-stream are forwarded and the sub-evaluation is
/// replaced by a fresh evaluation whose results are emitted as deletions.
#[derive(Debug, Clone)]
pub struct BindJoin {
    mediator: Arc<dyn QueryOperationMediator>,
    sorter: Arc<dyn JoinEntriesSort>,
    hasher: Arc<dyn HashBindings>,
    merger: Arc<dyn BindingsMerger>,
    options: JoinOptions,
}

impl BindJoin {
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
        if entries.len() != 2 {
            return Err(DeltaError::InvalidEntryCount {
                operator: "Bind join",
                expected: "exactly 2",
                actual: entries.len(),
            });
        }

        let PreparedEntries {
            driver,
            mut remaining,
            metadata,
        } = prepare_entries(self.sorter.as_ref(), entries, context, self.options).await?;
        let Some(remaining) = remaining.pop() else {
            return Err(DeltaError::InvalidEntryCount {
                operator: "Bind join",
                expected: "exactly 2",
                actual: 1,
            });
        };
        debug!(variables = ?metadata.variables, "Executing bind join");

        let stream = BindJoinStream {
            driver: Some(driver),
            remaining,
            context: context.clone(),
            mediator: Arc::clone(&self.mediator),
            hasher: Arc::clone(&self.hasher),
            merger: Arc::clone(&self.merger),
            active: BucketMemory::default(),
            pending: None,
            buffer: VecDeque::new(),
            failed: false,
        };
        Ok(BindingsOutput::new(Box::pin(stream), metadata))
    }
}

/// The sub-evaluations that were started for a driving binding.
struct ActiveBindings {
    operation: GraphPattern,
    /// A stack of sub-streams. Ended sub-streams stay on the stack until they are replaced.
    sub_evaluations: Vec<Option<SendableBindingsStream>>,
}

enum PendingTask {
    /// Evaluates the materialized operation for a driving addition.
    Materialize {
        driving: Bindings,
        hash: BindingsHash,
        operation: GraphPattern,
        future: MediationFuture,
    },
    /// Replaces a sub-evaluation for a driving deletion and collects its current results.
    Replace {
        driving: Bindings,
        future: BoxFuture<'static, DeltaResult<Replacement>>,
    },
}

/// The outcome of replacing a sub-evaluation.
struct Replacement {
    /// Changes that the old sub-stream had already produced but that were not forwarded yet.
    drained: Vec<SignedBindings>,
    /// The results of the fresh sub-evaluation.
    current: Vec<SignedBindings>,
}

/// Takes all changes that `stream` can produce without waiting and closes it.
///
/// A replaced sub-stream may still queue changes that arrived before the sources were halted.
fn drain_ready(mut stream: SendableBindingsStream) -> DeltaResult<Vec<SignedBindings>> {
    let mut drained = Vec::new();
    while let Some(Some(item)) = stream.next().now_or_never() {
        drained.push(item?);
    }
    Ok(drained)
}

struct BindJoinStream {
    driver: Option<SendableBindingsStream>,
    remaining: GraphPattern,
    context: QueryContext,
    mediator: Arc<dyn QueryOperationMediator>,
    hasher: Arc<dyn HashBindings>,
    merger: Arc<dyn BindingsMerger>,
    active: BucketMemory<ActiveBindings>,
    pending: Option<PendingTask>,
    buffer: VecDeque<SignedBindings>,
    failed: bool,
}

impl BindJoinStream {
    /// Starts the task for a change of the driving stream.
    fn start_task(&mut self, item: SignedBindings) -> DeltaResult<()> {
        let hash = hash_content(self.hasher.as_ref(), &item.bindings);
        match item.diff {
            Diff::Addition => {
                let operation = match self.active.get(hash, &item.bindings) {
                    Some(active) => active.operation.clone(),
                    None => materialize_operation(&self.remaining, &item.bindings),
                };
                let future = mediate_owned(&self.mediator, operation.clone(), &self.context);
                self.pending = Some(PendingTask::Materialize {
                    driving: item.bindings,
                    hash,
                    operation,
                    future,
                });
            }
            Diff::Deletion => {
                let Some(active) = self.active.get_mut(hash, &item.bindings) else {
                    return Err(DeltaError::DeletionForNonExistingAddition);
                };
                let Some(old_stream) = active.sub_evaluations.pop() else {
                    return Err(DeltaError::DeletionForNonExistingAddition);
                };
                let operation = active.operation.clone();
                if active.sub_evaluations.is_empty() {
                    self.active.remove(hash, &item.bindings);
                }

                let mediator = Arc::clone(&self.mediator);
                let context = self.context.clone();
                let future = async move {
                    let _guard = context.halt_sources();
                    let drained = match old_stream {
                        Some(stream) => drain_ready(stream)?,
                        None => Vec::new(),
                    };
                    let output = mediator.mediate(&operation, &context).await?;
                    let current = output.stream.try_collect::<Vec<_>>().await?;
                    Ok::<_, DeltaError>(Replacement { drained, current })
                };
                debug!(driving = %item.bindings, "Replacing sub-evaluation of bind join");
                self.pending = Some(PendingTask::Replace {
                    driving: item.bindings,
                    future: Box::pin(future),
                });
            }
        }
        Ok(())
    }

    /// Polls the pending task. Returns whether the task has completed.
    fn poll_pending(&mut self, cx: &mut Context<'_>) -> DeltaResult<bool> {
        let Some(task) = &mut self.pending else {
            return Ok(false);
        };

        match task {
            PendingTask::Materialize { future, .. } => {
                let Poll::Ready(output) = future.poll_unpin(cx) else {
                    return Ok(false);
                };
                let output = output?;
                if let Some(PendingTask::Materialize {
                    driving,
                    hash,
                    operation,
                    ..
                }) = self.pending.take()
                {
                    let active = self.active.get_or_insert_with(hash, &driving, || {
                        ActiveBindings {
                            operation,
                            sub_evaluations: Vec::new(),
                        }
                    });
                    active.sub_evaluations.push(Some(output.stream));
                }
            }
            PendingTask::Replace { future, .. } => {
                let Poll::Ready(replacement) = future.poll_unpin(cx) else {
                    return Ok(false);
                };
                let Replacement { drained, current } = replacement?;
                if let Some(PendingTask::Replace { driving, .. }) = self.pending.take() {
                    let changes = drained
                        .into_iter()
                        .chain(current.into_iter().map(SignedBindings::negate));
                    for item in changes {
                        if let Some(merged) = self.merger.merge(&driving, &item.bindings) {
                            self.buffer.push_back(SignedBindings::new(merged, item.diff));
                        }
                    }
                }
            }
        }
        Ok(true)
    }

    /// Polls each active sub-stream once. Returns whether any sub-stream made progress.
    fn poll_sub_evaluations(&mut self, cx: &mut Context<'_>) -> DeltaResult<bool> {
        let mut progressed = false;
        for (driving, active) in self.active.iter_mut() {
            for slot in &mut active.sub_evaluations {
                let Some(stream) = slot else {
                    continue;
                };
                match stream.poll_next_unpin(cx) {
                    Poll::Ready(Some(Ok(item))) => {
                        if let Some(merged) = self.merger.merge(driving, &item.bindings) {
                            self.buffer
                                .push_back(SignedBindings::new(merged, item.diff));
                        }
                    }
                    Poll::Ready(Some(Err(error))) => return Err(error),
                    Poll::Ready(None) => *slot = None,
                    Poll::Pending => continue,
                }
                progressed = true;
            }
        }
        Ok(progressed)
    }

    fn has_live_sub_evaluations(&self) -> bool {
        self.active
            .iter()
            .any(|(_, active)| active.sub_evaluations.iter().any(Option::is_some))
    }

    fn fail(&mut self, error: DeltaError) -> Poll<Option<DeltaResult<SignedBindings>>> {
        self.failed = true;
        self.driver = None;
        self.pending = None;
        self.active = BucketMemory::default();
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

            // The next driving change is only read once the previous one is fully handled.
            if self.pending.is_none() {
                if let Some(driver) = &mut self.driver {
                    match driver.poll_next_unpin(cx) {
                        Poll::Ready(Some(Ok(item))) => {
                            if let Err(error) = self.start_task(item) {
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

impl Stream for BindJoinStream {
    type Item = DeltaResult<SignedBindings>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        this.poll_inner(cx)
    }
}
