use rdf_delta_common::error::DeltaError;
use rdf_delta_common::{BindingsHash, DeltaResult};
use rdf_delta_model::Bindings;
use rustc_hash::FxHashMap;

/// Stores values for [Bindings], grouped by their [BindingsHash].
///
/// A bucket is an array of all stored bindings with the same hash. Bindings within a bucket are
/// told apart by comparing their content. Removing an entry swaps the last entry of the bucket
/// into its place, and empty buckets are dropped.
#[derive(Debug)]
pub struct BucketMemory<V> {
    buckets: FxHashMap<BindingsHash, Vec<(Bindings, V)>>,
    len: usize,
}

impl<V> Default for BucketMemory<V> {
    fn default() -> Self {
        Self {
            buckets: FxHashMap::default(),
            len: 0,
        }
    }
}

impl<V> BucketMemory<V> {
    /// Returns all entries with the given hash.
    pub fn bucket(&self, hash: BindingsHash) -> &[(Bindings, V)] {
        self.buckets.get(&hash).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn get(&self, hash: BindingsHash, bindings: &Bindings) -> Option<&V> {
        self.bucket(hash)
            .iter()
            .find(|(b, _)| b == bindings)
            .map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, hash: BindingsHash, bindings: &Bindings) -> Option<&mut V> {
        self.buckets
            .get_mut(&hash)?
            .iter_mut()
            .find(|(b, _)| b == bindings)
            .map(|(_, v)| v)
    }

    /// Returns the value for `bindings`, inserting the result of `create` if it is not present.
    pub fn get_or_insert_with(
        &mut self,
        hash: BindingsHash,
        bindings: &Bindings,
        create: impl FnOnce() -> V,
    ) -> &mut V {
        let bucket = self.buckets.entry(hash).or_default();
        let position = match bucket.iter().position(|(b, _)| b == bindings) {
            Some(position) => position,
            None => {
                bucket.push((bindings.clone(), create()));
                self.len += 1;
                bucket.len() - 1
            }
        };
        &mut bucket[position].1
    }

    /// Same as [Self::get_or_insert_with] but fallible.
    pub fn get_or_try_insert_with(
        &mut self,
        hash: BindingsHash,
        bindings: &Bindings,
        create: impl FnOnce() -> DeltaResult<V>,
    ) -> DeltaResult<&mut V> {
        let position = match self.bucket(hash).iter().position(|(b, _)| b == bindings) {
            Some(position) => position,
            None => {
                let value = create()?;
                let bucket = self.buckets.entry(hash).or_default();
                bucket.push((bindings.clone(), value));
                self.len += 1;
                bucket.len() - 1
            }
        };
        let bucket = self.buckets.entry(hash).or_default();
        Ok(&mut bucket[position].1)
    }

    /// Removes the entry for `bindings` and returns its value.
    pub fn remove(&mut self, hash: BindingsHash, bindings: &Bindings) -> Option<V> {
        let bucket = self.buckets.get_mut(&hash)?;
        let position = bucket.iter().position(|(b, _)| b == bindings)?;
        let (_, value) = bucket.swap_remove(position);
        if bucket.is_empty() {
            self.buckets.remove(&hash);
        }
        self.len -= 1;
        Some(value)
    }

    /// Iterates over all entries.
    pub fn iter(&self) -> impl Iterator<Item = (&Bindings, &V)> {
        self.buckets
            .values()
            .flat_map(|bucket| bucket.iter().map(|(b, v)| (b, v)))
    }

    /// Iterates over all entries with mutable access to the values.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&Bindings, &mut V)> {
        self.buckets
            .values_mut()
            .flat_map(|bucket| bucket.iter_mut().map(|(b, v)| (&*b, v)))
    }

    /// The number of stored entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl BucketMemory<usize> {
    /// Increments the multiplicity of `bindings` and returns the new multiplicity.
    pub fn increment(&mut self, hash: BindingsHash, bindings: &Bindings) -> usize {
        let count = self.get_or_insert_with(hash, bindings, || 0);
        *count += 1;
        *count
    }

    /// Decrements the multiplicity of `bindings` and returns the new multiplicity. The entry is
    /// removed once the multiplicity reaches zero.
    pub fn decrement(&mut self, hash: BindingsHash, bindings: &Bindings) -> DeltaResult<usize> {
        let Some(count) = self.get_mut(hash, bindings) else {
            return Err(DeltaError::DeletionForNonExistingAddition);
        };
        *count -= 1;
        let count = *count;
        if count == 0 {
            self.remove(hash, bindings);
        }
        Ok(count)
    }
}
