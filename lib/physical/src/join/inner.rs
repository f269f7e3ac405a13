use futures::{Stream, StreamExt};
use rdf_delta_common::{DeltaResult, SendableBindingsStream};
use rdf_delta_model::SignedBindings;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Identifies an input of a binary join.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JoinSide {
    Left,
    Right,
}

impl JoinSide {
    #[must_use]
    pub fn other(self) -> JoinSide {
        match self {
            JoinSide::Left => JoinSide::Right,
            JoinSide::Right => JoinSide::Left,
        }
    }
}

/// The state of an incremental binary join that is driven by an [IncrementalInnerJoinStream].
pub trait IncrementalJoinState: Send {
    /// Processes a change from one of the inputs.
    ///
    /// This is only called once all outputs of the previous change have been pulled.
    fn push(&mut self, side: JoinSide, item: SignedBindings) -> DeltaResult<()>;

    /// Returns the next output of the most recent change, if any is left.
    fn pull(&mut self) -> Option<SignedBindings>;
}

/// Drives an [IncrementalJoinState] with two input streams.
///
/// The stream reads alternately from both inputs. If one input is not ready, the other one is
/// read instead. All outputs of a change are produced before the next change is read. The stream
/// ends once both inputs have ended and all outputs have been produced. After an error, the stream
/// ends.
pub struct IncrementalInnerJoinStream<S> {
    left: Option<SendableBindingsStream>,
    right: Option<SendableBindingsStream>,
    next_side: JoinSide,
    state: S,
    failed: bool,
}

impl<S: IncrementalJoinState> IncrementalInnerJoinStream<S> {
    pub fn new(left: SendableBindingsStream, right: SendableBindingsStream, state: S) -> Self {
        Self {
            left: Some(left),
            right: Some(right),
            next_side: JoinSide::Left,
            state,
            failed: false,
        }
    }

    /// Returns the join state.
    pub fn state(&self) -> &S {
        &self.state
    }

    fn input(&mut self, side: JoinSide) -> &mut Option<SendableBindingsStream> {
        match side {
            JoinSide::Left => &mut self.left,
            JoinSide::Right => &mut self.right,
        }
    }

    fn fail<T>(&mut self, error: T) -> Poll<Option<Result<SignedBindings, T>>> {
        self.failed = true;
        self.left = None;
        self.right = None;
        Poll::Ready(Some(Err(error)))
    }

    fn poll_inner(&mut self, cx: &mut Context<'_>) -> Poll<Option<DeltaResult<SignedBindings>>> {
        if self.failed {
            return Poll::Ready(None);
        }

        loop {
            if let Some(output) = self.state.pull() {
                return Poll::Ready(Some(Ok(output)));
            }

            if self.left.is_none() && self.right.is_none() {
                return Poll::Ready(None);
            }

            let first = self.next_side;
            let mut progressed = false;
            for side in [first, first.other()] {
                let Some(input) = self.input(side) else {
                    continue;
                };

                match input.poll_next_unpin(cx) {
                    Poll::Ready(Some(Ok(item))) => {
                        self.next_side = side.other();
                        if let Err(error) = self.state.push(side, item) {
                            return self.fail(error);
                        }
                    }
                    Poll::Ready(Some(Err(error))) => return self.fail(error),
                    Poll::Ready(None) => *self.input(side) = None,
                    Poll::Pending => continue,
                }
                progressed = true;
                break;
            }

            if !progressed {
                return Poll::Pending;
            }
        }
    }
}

impl<S: IncrementalJoinState + Unpin> Stream for IncrementalInnerJoinStream<S> {
    type Item = DeltaResult<SignedBindings>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        this.poll_inner(cx)
    }
}
