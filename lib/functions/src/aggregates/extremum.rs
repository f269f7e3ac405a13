use crate::aggregates::{IncrementalAccumulator, Multiset};
use crate::compare_terms;
use rdf_delta_common::DeltaResult;
use rdf_delta_model::{Term, ThinResult};
use std::cmp::Ordering;

/// `MIN(expr)` and `MAX(expr)`
///
/// Keeps all values to recover the next extremum once the current one is removed. If no value
/// remains, the aggregate is unbound.
#[derive(Debug)]
pub struct ExtremumAccumulator {
    /// [Ordering::Less] for a minimum, [Ordering::Greater] for a maximum.
    preferred: Ordering,
    values: Multiset<Term>,
    current: Option<Term>,
}

impl ExtremumAccumulator {
    pub fn min() -> Self {
        Self::new(Ordering::Less)
    }

    pub fn max() -> Self {
        Self::new(Ordering::Greater)
    }

    fn new(preferred: Ordering) -> Self {
        Self {
            preferred,
            values: Multiset::default(),
            current: None,
        }
    }

    fn is_preferred(&self, value: &Term, current: &Term) -> bool {
        compare_terms(value, current) == self.preferred
    }
}

impl IncrementalAccumulator for ExtremumAccumulator {
    fn addition(&mut self, value: &Term) -> ThinResult<()> {
        self.values.insert(value.clone());
        let replace = match &self.current {
            None => true,
            Some(current) => self.is_preferred(value, current),
        };
        if replace {
            self.current = Some(value.clone());
        }
        Ok(())
    }

    fn deletion(&mut self, value: &Term) -> DeltaResult<()> {
        let removed_last = self.values.remove(value)?;
        if removed_last && self.current.as_ref() == Some(value) {
            let mut next: Option<&Term> = None;
            for candidate in self.values.values() {
                next = match next {
                    Some(n) if !self.is_preferred(candidate, n) => Some(n),
                    _ => Some(candidate),
                };
            }
            self.current = next.cloned();
        }
        Ok(())
    }

    fn current_value(&self) -> Option<Term> {
        self.current.clone()
    }
}
