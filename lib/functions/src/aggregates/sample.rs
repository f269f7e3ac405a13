use crate::aggregates::IncrementalAccumulator;
use rdf_delta_common::error::DeltaError;
use rdf_delta_common::DeltaResult;
use rdf_delta_model::{Term, ThinResult};

/// `SAMPLE(expr)`: returns the oldest value that is still part of the group.
#[derive(Debug, Default)]
pub struct SampleAccumulator {
    /// Distinct values with their multiplicity, in the order of their first addition.
    values: Vec<(Term, usize)>,
}

impl IncrementalAccumulator for SampleAccumulator {
    fn addition(&mut self, value: &Term) -> ThinResult<()> {
        match self.values.iter_mut().find(|(v, _)| v == value) {
            Some((_, count)) => *count += 1,
            None => self.values.push((value.clone(), 1)),
        }
        Ok(())
    }

    fn deletion(&mut self, value: &Term) -> DeltaResult<()> {
        let Some(position) = self.values.iter().position(|(v, _)| v == value) else {
            return Err(DeltaError::DeletionForNonExistingAddition);
        };

        self.values[position].1 -= 1;
        if self.values[position].1 == 0 {
            self.values.remove(position);
        }
        Ok(())
    }

    fn current_value(&self) -> Option<Term> {
        self.values.first().map(|(value, _)| value.clone())
    }
}
