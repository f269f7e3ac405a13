use crate::aggregates::{IncrementalAccumulator, SumAccumulator};
use rdf_delta_common::DeltaResult;
use rdf_delta_model::{Integer, Numeric, Term, ThinResult};

/// `AVG(expr)`
///
/// The average of integers and decimals is a decimal. The average of no values is the integer `0`.
#[derive(Debug, Default)]
pub struct AvgAccumulator {
    sum: SumAccumulator,
}

impl AvgAccumulator {
    fn average(&self) -> ThinResult<Numeric> {
        let sum = self.sum.sum()?;
        let count = self.sum.count();
        if count == 0 {
            return Ok(sum);
        }
        let count = Numeric::Integer(Integer::from(i64::try_from(count)?));
        sum.checked_div(count)
    }
}

impl IncrementalAccumulator for AvgAccumulator {
    fn addition(&mut self, value: &Term) -> ThinResult<()> {
        self.sum.addition(value)
    }

    fn deletion(&mut self, value: &Term) -> DeltaResult<()> {
        self.sum.deletion(value)
    }

    fn current_value(&self) -> Option<Term> {
        self.average().ok().map(|avg| avg.into_literal().into())
    }
}
