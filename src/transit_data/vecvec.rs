use std::marker::PhantomData;
use std::ops::Index;

use super::idx::Idx;

/// A vector of vectors stored in a single flat buffer.
///
/// Bucket `k` occupies `data[bucket_starts[k]..bucket_starts[k+1]]`.
#[derive(Debug, Clone)]
pub struct VecVec<K, V> {
    data: Vec<V>,
    bucket_starts: Vec<usize>,
    _key: PhantomData<K>,
}

impl<K: Idx, V> Default for VecVec<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Idx, V> VecVec<K, V> {
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            bucket_starts: vec![0],
            _key: PhantomData,
        }
    }

    /// Builds `nb_of_buckets` buckets from `(key, value)` entries.
    /// Entries of a bucket keep their relative order.
    pub fn from_keyed(nb_of_buckets: usize, mut entries: Vec<(K, V)>) -> Self {
        entries.sort_by_key(|(key, _)| key.idx());
        let mut result = Self::new();
        result.data.reserve(entries.len());
        let mut entries = entries.into_iter().peekable();
        for bucket in 0..nb_of_buckets {
            while let Some((_, value)) = entries.next_if(|(key, _)| key.idx() == bucket) {
                result.data.push(value);
            }
            result.bucket_starts.push(result.data.len());
        }
        debug_assert!(entries.next().is_none());
        result
    }

    pub fn push<Bucket>(&mut self, bucket: Bucket) -> K
    where
        Bucket: IntoIterator<Item = V>,
    {
        let key = K::new(self.len());
        self.data.extend(bucket);
        self.bucket_starts.push(self.data.len());
        key
    }

    /// Number of buckets.
    pub fn len(&self) -> usize {
        self.bucket_starts.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of values across all buckets.
    pub fn nb_of_values(&self) -> usize {
        self.data.len()
    }

    pub fn get(&self, key: K) -> Option<&[V]> {
        let idx = key.idx();
        if idx >= self.len() {
            return None;
        }
        Some(&self.data[self.bucket_starts[idx]..self.bucket_starts[idx + 1]])
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, &[V])> {
        self.bucket_starts
            .windows(2)
            .enumerate()
            .map(move |(idx, bounds)| (K::new(idx), &self.data[bounds[0]..bounds[1]]))
    }
}

impl<K: Idx, V> Index<K> for VecVec<K, V> {
    type Output = [V];

    fn index(&self, key: K) -> &Self::Output {
        let idx = key.idx();
        &self.data[self.bucket_starts[idx]..self.bucket_starts[idx + 1]]
    }
}
