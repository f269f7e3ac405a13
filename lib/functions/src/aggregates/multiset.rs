use rdf_delta_common::error::DeltaError;
use rdf_delta_common::DeltaResult;
use rustc_hash::FxHashMap;
use std::hash::Hash;

/// Counts the occurrences of values.
#[derive(Clone, Debug)]
pub struct Multiset<T> {
    counts: FxHashMap<T, usize>,
}

impl<T> Default for Multiset<T> {
    fn default() -> Self {
        Self {
            counts: FxHashMap::default(),
        }
    }
}

impl<T: Hash + Eq> Multiset<T> {
    /// Adds one occurrence of `value`. Returns `true` if this is the first occurrence.
    pub fn insert(&mut self, value: T) -> bool {
        let count = self.counts.entry(value).or_insert(0);
        *count += 1;
        *count == 1
    }

    /// Removes one occurrence of `value`. Returns `true` if this was the last occurrence.
    pub fn remove(&mut self, value: &T) -> DeltaResult<bool> {
        let Some(count) = self.counts.get_mut(value) else {
            return Err(DeltaError::DeletionForNonExistingAddition);
        };

        *count -= 1;
        if *count == 0 {
            self.counts.remove(value);
            return Ok(true);
        }
        Ok(false)
    }

    pub fn count(&self, value: &T) -> usize {
        self.counts.get(value).copied().unwrap_or(0)
    }

    /// Iterates over the distinct values.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.counts.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
