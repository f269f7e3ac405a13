use crate::aggregates::{integer_term, BindingsAggregator, Multiset};
use rdf_delta_common::error::DeltaError;
use rdf_delta_common::DeltaResult;
use rdf_delta_model::{Bindings, Term};

/// `COUNT(*)` and `COUNT(DISTINCT *)`: counts the bindings of a group.
#[derive(Debug, Default)]
pub struct WildcardCountAggregator {
    distinct: Option<Multiset<Bindings>>,
    count: u64,
}

impl WildcardCountAggregator {
    pub fn new(distinct: bool) -> Self {
        Self {
            distinct: distinct.then(Multiset::default),
            count: 0,
        }
    }
}

impl BindingsAggregator for WildcardCountAggregator {
    fn put(&mut self, bindings: &Bindings) -> DeltaResult<()> {
        if let Some(distinct) = &mut self.distinct {
            if !distinct.insert(bindings.clone()) {
                return Ok(());
            }
        }
        self.count += 1;
        Ok(())
    }

    fn remove(&mut self, bindings: &Bindings) -> DeltaResult<()> {
        if let Some(distinct) = &mut self.distinct {
            if !distinct.remove(bindings)? {
                return Ok(());
            }
        }
        self.count = self
            .count
            .checked_sub(1)
            .ok_or(DeltaError::DeletionForNonExistingAddition)?;
        Ok(())
    }

    fn result(&self) -> Option<Term> {
        Some(integer_term(self.count))
    }
}
