use crate::group::state::GroupsState;
use futures::{Stream, StreamExt};
use rdf_delta_common::error::DeltaError;
use rdf_delta_common::{DeltaResult, SendableBindingsStream};
use rdf_delta_model::SignedBindings;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Feeds the changes of the input into a [GroupsState] and yields the resulting row changes.
pub(super) struct GroupStream {
    input: Option<SendableBindingsStream>,
    state: GroupsState,
    buffer: VecDeque<SignedBindings>,
    failed: bool,
}

impl GroupStream {
    pub fn new(input: SendableBindingsStream, state: GroupsState) -> Self {
        Self {
            input: Some(input),
            state,
            buffer: VecDeque::new(),
            failed: false,
        }
    }

    fn fail(&mut self, error: DeltaError) -> Poll<Option<DeltaResult<SignedBindings>>> {
        self.failed = true;
        self.input = None;
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
            let Some(input) = &mut self.input else {
                return Poll::Ready(None);
            };

            match input.poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(item))) => {
                    if let Err(error) = self.state.apply(item, &mut self.buffer) {
                        return self.fail(error);
                    }
                }
                Poll::Ready(Some(Err(error))) => return self.fail(error),
                Poll::Ready(None) => {
                    self.input = None;
                    if let Err(error) = self.state.emit_implicit_group(&mut self.buffer) {
                        return self.fail(error);
                    }
                }
                Poll::Pending => {
                    if let Err(error) = self.state.emit_implicit_group(&mut self.buffer) {
                        return self.fail(error);
                    }
                    if self.buffer.is_empty() {
                        return Poll::Pending;
                    }
                }
            }
        }
    }
}

impl Stream for GroupStream {
    type Item = DeltaResult<SignedBindings>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        this.poll_inner(cx)
    }
}
