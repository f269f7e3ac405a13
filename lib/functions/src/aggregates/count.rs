use crate::aggregates::{integer_term, IncrementalAccumulator};
use rdf_delta_common::error::DeltaError;
use rdf_delta_common::DeltaResult;
use rdf_delta_model::{Term, ThinResult};

/// `COUNT(expr)`: counts all values.
#[derive(Debug, Default)]
pub struct CountAccumulator {
    count: u64,
}

impl IncrementalAccumulator for CountAccumulator {
    fn addition(&mut self, _value: &Term) -> ThinResult<()> {
        self.count += 1;
        Ok(())
    }

    fn deletion(&mut self, _value: &Term) -> DeltaResult<()> {
        self.count = self
            .count
            .checked_sub(1)
            .ok_or(DeltaError::DeletionForNonExistingAddition)?;
        Ok(())
    }

    fn current_value(&self) -> Option<Term> {
        Some(integer_term(self.count))
    }
}
