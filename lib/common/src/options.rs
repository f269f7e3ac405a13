/// Whether a bind join accepts entries that do not share any variable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CommonVariablePolicy {
    /// Reject the join if no variable occurs in at least two entries.
    #[default]
    Require,
    /// Join the entries as a cross product.
    Allow,
}

/// Options for a bind join operator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JoinOptions {
    pub common_variables: CommonVariablePolicy,
}

impl JoinOptions {
    #[must_use]
    pub fn with_common_variables(mut self, policy: CommonVariablePolicy) -> Self {
        self.common_variables = policy;
        self
    }
}
