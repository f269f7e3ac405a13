use crate::aggregates::IncrementalAccumulator;
use rdf_delta_common::error::DeltaError;
use rdf_delta_common::DeltaResult;
use rdf_delta_model::{
    Decimal, Double, Float, Integer, Numeric, NumericKind, Term, ThinError, ThinResult,
};

/// `SUM(expr)`
///
/// The accumulator keeps a separate running sum for each numeric datatype. Removing the last value
/// of a datatype therefore restores the datatype of the remaining values. The datatype of the
/// result is the widest datatype that is present.
///
/// Decimals are summed exactly, even beyond the range of `xsd:decimal`. The sum is unbound while
/// it is out of range, and removing values brings it back.
#[derive(Debug, Default)]
pub struct SumAccumulator {
    integer: i128,
    integers: usize,
    decimal: WideDecimalSum,
    decimals: usize,
    float: Float,
    floats: usize,
    double: Double,
    doubles: usize,
}

impl SumAccumulator {
    /// The number of values that are part of the sum.
    pub fn count(&self) -> usize {
        self.integers + self.decimals + self.floats + self.doubles
    }

    /// Returns the sum of all values. The sum of no values is the integer `0`.
    pub fn sum(&self) -> ThinResult<Numeric> {
        let mut sum = Numeric::Integer(Integer::from(i64::try_from(self.integer)?));
        if self.decimals > 0 {
            sum = sum.checked_add(Numeric::Decimal(self.decimal.value()?))?;
        }
        if self.floats > 0 {
            sum = sum.checked_add(Numeric::Float(self.float))?;
        }
        if self.doubles > 0 {
            sum = sum.checked_add(Numeric::Double(self.double))?;
        }
        Ok(sum)
    }

    fn count_of(&mut self, kind: NumericKind) -> &mut usize {
        match kind {
            NumericKind::Integer => &mut self.integers,
            NumericKind::Decimal => &mut self.decimals,
            NumericKind::Float => &mut self.floats,
            NumericKind::Double => &mut self.doubles,
        }
    }
}

impl IncrementalAccumulator for SumAccumulator {
    fn addition(&mut self, value: &Term) -> ThinResult<()> {
        let value = Numeric::from_term(value)?;
        match value {
            Numeric::Integer(value) => self.integer += i128::from(i64::from(value)),
            Numeric::Decimal(value) => self.decimal.add(value),
            Numeric::Float(value) => self.float = self.float + value,
            Numeric::Double(value) => self.double = self.double + value,
        }
        *self.count_of(value.kind()) += 1;
        Ok(())
    }

    fn deletion(&mut self, value: &Term) -> DeltaResult<()> {
        let Ok(value) = Numeric::from_term(value) else {
            return Ok(());
        };

        let count = self.count_of(value.kind());
        *count = count
            .checked_sub(1)
            .ok_or(DeltaError::DeletionForNonExistingAddition)?;
        let remaining = *count;

        match value {
            Numeric::Integer(value) => self.integer -= i128::from(i64::from(value)),
            Numeric::Decimal(value) => self.decimal.sub(value),
            Numeric::Float(value) => self.float = self.float - value,
            Numeric::Double(value) => self.double = self.double - value,
        }

        // Floating point subtraction is not exact. Reset the sum once a datatype is gone.
        if remaining == 0 {
            match value.kind() {
                NumericKind::Integer => self.integer = 0,
                NumericKind::Decimal => self.decimal = WideDecimalSum::default(),
                NumericKind::Float => self.float = Float::default(),
                NumericKind::Double => self.double = Double::default(),
            }
        }
        Ok(())
    }

    fn current_value(&self) -> Option<Term> {
        self.sum().ok().map(|sum| sum.into_literal().into())
    }
}

/// A sum of decimals with 128 additional bits.
///
/// `low` holds the two's complement representation of a [Decimal] and `high` counts how often it
/// wrapped around.
#[derive(Clone, Copy, Debug, Default)]
struct WideDecimalSum {
    low: i128,
    high: i64,
}

impl WideDecimalSum {
    fn add(&mut self, value: Decimal) {
        let raw = i128::from_be_bytes(value.to_be_bytes());
        let (low, wrapped) = self.low.overflowing_add(raw);
        self.low = low;
        if wrapped {
            self.high += if raw > 0 { 1 } else { -1 };
        }
    }

    fn sub(&mut self, value: Decimal) {
        let raw = i128::from_be_bytes(value.to_be_bytes());
        let (low, wrapped) = self.low.overflowing_sub(raw);
        self.low = low;
        if wrapped {
            self.high -= if raw > 0 { 1 } else { -1 };
        }
    }

    /// Returns the sum if it is in the range of [Decimal].
    fn value(self) -> ThinResult<Decimal> {
        if self.high != 0 {
            return ThinError::expected();
        }
        Ok(Decimal::from_be_bytes(self.low.to_be_bytes()))
    }
}
