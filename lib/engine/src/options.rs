use rdf_delta_common::JoinOptions;

/// Configures the operators that an [IncrementalEngine](crate::IncrementalEngine) uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineOptions {
    /// Options of the bind join.
    pub bind_join: JoinOptions,
    /// Options of the multi bind join.
    pub multi_bind_join: JoinOptions,
    pub enable_partial_hash_join: bool,
    pub enable_bind_join: bool,
    pub enable_multi_bind_join: bool,
}

impl EngineOptions {
    #[must_use]
    pub fn with_bind_join(mut self, options: JoinOptions) -> Self {
        self.bind_join = options;
        self
    }

    #[must_use]
    pub fn with_multi_bind_join(mut self, options: JoinOptions) -> Self {
        self.multi_bind_join = options;
        self
    }

    #[must_use]
    pub fn without_partial_hash_join(mut self) -> Self {
        self.enable_partial_hash_join = false;
        self
    }

    #[must_use]
    pub fn without_bind_join(mut self) -> Self {
        self.enable_bind_join = false;
        self
    }

    #[must_use]
    pub fn without_multi_bind_join(mut self) -> Self {
        self.enable_multi_bind_join = false;
        self
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            bind_join: JoinOptions::default(),
            multi_bind_join: JoinOptions::default(),
            enable_partial_hash_join: true,
            enable_bind_join: true,
            enable_multi_bind_join: true,
        }
    }
}
