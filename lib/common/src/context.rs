use crate::error::DeltaError;
use crate::DeltaResult;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::debug;

/// A streaming source can temporarily stop delivering changes to its streams.
///
/// While a source is halted, streams created from it deliver the current state and end. This
/// allows an operator to re-evaluate a sub-query against a stable snapshot.
pub trait Haltable: Send + Sync {
    fn halt(&self);

    fn resume(&self);
}

/// A data source that is reachable via the [QueryContext].
pub trait QuerySource: Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Returns the halt/resume capability of this source, if it has one.
    fn as_haltable(&self) -> Option<&dyn Haltable> {
        None
    }
}

/// Context that is passed through the evaluation of a query.
#[derive(Clone, Debug, Default)]
pub struct QueryContext {
    sources: Vec<Arc<dyn QuerySource>>,
}

impl QueryContext {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_source(mut self, source: Arc<dyn QuerySource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn sources(&self) -> &[Arc<dyn QuerySource>] {
        &self.sources
    }

    /// Fails with [DeltaError::SourceCannotHalt] if a source cannot halt or resume.
    pub fn ensure_haltable_sources(&self) -> DeltaResult<()> {
        match self.sources.iter().find(|s| s.as_haltable().is_none()) {
            None => Ok(()),
            Some(source) => {
                debug!(source = source.name(), "Source cannot halt or resume");
                Err(DeltaError::SourceCannotHalt)
            }
        }
    }

    /// Halts all haltable sources. They are resumed once the returned guard is dropped.
    pub fn halt_sources(&self) -> SourceHaltGuard {
        SourceHaltGuard::new(self.sources.clone())
    }
}

/// Keeps the streaming sources of a [QueryContext] halted while it is alive.
///
/// Each halted source is resumed exactly once, also if the guard is dropped because the owning
/// stream is cancelled.
#[must_use]
#[derive(Debug)]
pub struct SourceHaltGuard {
    sources: Vec<Arc<dyn QuerySource>>,
}

impl SourceHaltGuard {
    fn new(sources: Vec<Arc<dyn QuerySource>>) -> Self {
        let sources = sources
            .into_iter()
            .filter(|s| s.as_haltable().is_some())
            .collect::<Vec<_>>();
        for haltable in sources.iter().filter_map(|s| s.as_haltable()) {
            haltable.halt();
        }
        debug!(sources = sources.len(), "Halted streaming sources");
        Self { sources }
    }
}

impl Drop for SourceHaltGuard {
    fn drop(&mut self) {
        for haltable in self.sources.iter().filter_map(|s| s.as_haltable()) {
            haltable.resume();
        }
        debug!(sources = self.sources.len(), "Resumed streaming sources");
    }
}
