//! Reference MinHash signature generator.
//!
//! The forest only needs `&[u64]` signatures of a fixed length; any MinHash
//! implementation works. This one is here so that tests, benchmarks and the
//! demo can build signatures from plain sets.
//!
//! For each of `num_hashes` seeded hash functions `h_i`, the signature holds
//! `min_{x ∈ S} h_i(x)`. Two sets agree at a position with probability equal
//! to their Jaccard similarity (Broder 1997).

use rand::prelude::*;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Seeded family of MinHash functions.
#[derive(Debug, Clone)]
pub struct MinHash {
    seeds: Vec<u64>,
}

impl MinHash {
    /// `num_hashes` functions with a fixed default seed.
    pub fn new(num_hashes: usize) -> Self {
        Self::with_seed(num_hashes, 42)
    }

    /// Same seed and length always give the same functions.
    pub fn with_seed(num_hashes: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let seeds = (0..num_hashes).map(|_| rng.gen::<u64>()).collect();
        Self { seeds }
    }

    pub fn num_hashes(&self) -> usize {
        self.seeds.len()
    }

    /// Start an empty sketch that items can be pushed into.
    pub fn sketch(&self) -> MinHashSketch<'_> {
        MinHashSketch {
            family: self,
            mins: vec![u64::MAX; self.seeds.len()],
        }
    }

    /// Signature of every item yielded by `items`.
    pub fn signature<T: Hash, I: IntoIterator<Item = T>>(&self, items: I) -> MinHashSignature {
        let mut sketch = self.sketch();
        sketch.extend(items);
        sketch.signature()
    }

    fn hash_with_seed<T: Hash + ?Sized>(item: &T, seed: u64) -> u64 {
        let mut hasher = DefaultHasher::new();
        seed.hash(&mut hasher);
        item.hash(&mut hasher);
        hasher.finish()
    }
}

/// Running minimums for one set.
#[derive(Debug, Clone)]
pub struct MinHashSketch<'a> {
    family: &'a MinHash,
    mins: Vec<u64>,
}

impl MinHashSketch<'_> {
    /// Add one item to the set.
    pub fn push<T: Hash + ?Sized>(&mut self, item: &T) {
        for (min, &seed) in self.mins.iter_mut().zip(&self.family.seeds) {
            let h = MinHash::hash_with_seed(item, seed);
            if h < *min {
                *min = h;
            }
        }
    }

    pub fn extend<T: Hash, I: IntoIterator<Item = T>>(&mut self, items: I) {
        for item in items {
            self.push(&item);
        }
    }

    /// Current signature. An empty sketch is all `u64::MAX`.
    pub fn signature(&self) -> MinHashSignature {
        MinHashSignature {
            values: self.mins.clone(),
        }
    }
}

/// Ordered MinHash values of one set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MinHashSignature {
    pub values: Vec<u64>,
}

impl MinHashSignature {
    pub fn as_slice(&self) -> &[u64] {
        &self.values
    }

    /// Fraction of agreeing positions: an estimate of Jaccard similarity.
    ///
    /// Signatures of different lengths are not comparable and score 0.
    pub fn jaccard(&self, other: &MinHashSignature) -> f64 {
        if self.values.len() != other.values.len() || self.values.is_empty() {
            return 0.0;
        }
        let matches = self
            .values
            .iter()
            .zip(&other.values)
            .filter(|(a, b)| a == b)
            .count();
        matches as f64 / self.values.len() as f64
    }

    /// Signature of the union of both sets (element-wise minimum).
    pub fn merge(&self, other: &MinHashSignature) -> MinHashSignature {
        let values = self
            .values
            .iter()
            .zip(&other.values)
            .map(|(&a, &b)| a.min(b))
            .collect();
        MinHashSignature { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Vec<u64>> for MinHashSignature {
    fn from(values: Vec<u64>) -> Self {
        Self { values }
    }
}

impl AsRef<[u64]> for MinHashSignature {
    fn as_ref(&self) -> &[u64] {
        &self.values
    }
}
