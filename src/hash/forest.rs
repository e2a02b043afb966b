//! MinHash LSH Forest.
//!
//! Each of the L bands owns one table: a `Vec` of `(HashKey, slot)` entries
//! that is sorted by key when [`MinHashForest::index`] runs. Lookups are a
//! lower-bound binary search followed by a scan over the run of equal keys,
//! so a table costs one packed key plus a `u32` per item and no hash-map
//! buckets.
//!
//! ```text
//! add:   sig ──split──▶ band_0 .. band_{L-1} ──pack──▶ append to table_i
//! index: sort every table, freeze prefix [0, n)
//! query: sig ──split/pack──▶ lower_bound(table_i[..n]) ──▶ equal-key run ──▶ ∪ keys
//! ```
//!
//! Entries added after the last `index()` sit past the frozen prefix and are
//! invisible to queries until the next `index()`.
//!
//! # References
//!
//! - Bawa, Condie & Ganesan (2005). "LSH Forest: self-tuning indexes for
//!   similarity search."

use crate::error::{LshError, Result};
use crate::hash::key::{HashKey, HashValueSize, KeyPacker};
use crate::hash::params::{optimal_kl_with_precision, BandingParams, DEFAULT_INTEGRATION_PRECISION};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::Hash;

/// Construction parameters for [`MinHashForest`].
///
/// Serializable, so a deployment can keep its forest configuration next to
/// the rest of its settings and rebuild identical banding from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    /// Signature length produced by the MinHash generator.
    pub num_hash: usize,
    /// Target Jaccard similarity threshold in `[0, 1]`.
    pub threshold: f64,
    /// Bytes kept per hash value in band keys.
    pub hash_value_size: HashValueSize,
    /// Entries to pre-allocate per band table.
    pub initial_capacity: usize,
    /// Quadrature step used by the (K, L) search.
    pub integration_precision: f64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            num_hash: 128,
            threshold: 0.5,
            hash_value_size: HashValueSize::Bits32,
            initial_capacity: 0,
            integration_precision: DEFAULT_INTEGRATION_PRECISION,
        }
    }
}

/// Whether every added entry is visible to queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForestState {
    /// Some entries were added since the last `index()`.
    Building,
    /// Every entry is indexed.
    Queryable,
}

/// One band-table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Entry {
    pub(crate) hash_key: HashKey,
    /// Position of the item's key in `MinHashForest::keys`.
    pub(crate) slot: u32,
}

/// Banded MinHash index over sorted tables.
#[derive(Debug, Clone)]
pub struct MinHashForest<K> {
    pub(crate) banding: BandingParams,
    pub(crate) packer: KeyPacker,
    /// Item keys in insertion order; entries refer to them by slot.
    pub(crate) keys: Vec<K>,
    pub(crate) tables: Vec<Vec<Entry>>,
    /// Length of the sorted, queryable prefix of every table.
    pub(crate) num_indexed: usize,
}

impl<K> MinHashForest<K> {
    /// Create a forest with 32-bit band values and no pre-allocation.
    pub fn new(num_hash: usize, threshold: f64) -> Result<Self> {
        Self::with_params(ForestParams {
            num_hash,
            threshold,
            ..Default::default()
        })
    }

    /// 16-bit band values. Wider signatures are truncated.
    pub fn new_16(num_hash: usize, threshold: f64, initial_capacity: usize) -> Result<Self> {
        Self::with_hash_value_size(num_hash, threshold, HashValueSize::Bits16, initial_capacity)
    }

    /// 32-bit band values.
    pub fn new_32(num_hash: usize, threshold: f64, initial_capacity: usize) -> Result<Self> {
        Self::with_hash_value_size(num_hash, threshold, HashValueSize::Bits32, initial_capacity)
    }

    /// Full 64-bit band values.
    pub fn new_64(num_hash: usize, threshold: f64, initial_capacity: usize) -> Result<Self> {
        Self::with_hash_value_size(num_hash, threshold, HashValueSize::Bits64, initial_capacity)
    }

    pub fn with_hash_value_size(
        num_hash: usize,
        threshold: f64,
        hash_value_size: HashValueSize,
        initial_capacity: usize,
    ) -> Result<Self> {
        Self::with_params(ForestParams {
            num_hash,
            threshold,
            hash_value_size,
            initial_capacity,
            ..Default::default()
        })
    }

    /// Create a forest, choosing K and L with the error-minimizing search.
    pub fn with_params(params: ForestParams) -> Result<Self> {
        let banding = optimal_kl_with_precision(
            params.num_hash,
            params.threshold,
            params.integration_precision,
        )?;
        tracing::debug!(
            num_hash = params.num_hash,
            threshold = params.threshold,
            k = banding.k,
            l = banding.l,
            false_positive = banding.false_positive,
            false_negative = banding.false_negative,
            "selected forest banding"
        );

        let tables = (0..banding.l)
            .map(|_| Vec::with_capacity(params.initial_capacity))
            .collect();

        Ok(Self {
            banding,
            packer: KeyPacker::new(params.hash_value_size),
            keys: Vec::with_capacity(params.initial_capacity),
            tables,
            num_indexed: 0,
        })
    }

    /// Reassemble a forest from persisted parts.
    pub(crate) fn from_parts(
        banding: BandingParams,
        hash_value_size: HashValueSize,
        keys: Vec<K>,
        tables: Vec<Vec<Entry>>,
        num_indexed: usize,
    ) -> Self {
        Self {
            banding,
            packer: KeyPacker::new(hash_value_size),
            keys,
            tables,
            num_indexed,
        }
    }

    /// `(K, L)`: hash values per band and number of bands.
    pub fn params(&self) -> (usize, usize) {
        (self.banding.k, self.banding.l)
    }

    /// Chosen banding with its false-positive / false-negative estimates.
    pub fn banding(&self) -> &BandingParams {
        &self.banding
    }

    pub fn hash_value_size(&self) -> HashValueSize {
        self.packer.hash_value_size()
    }

    /// Signature length accepted by `add` and `query` (`K * L`).
    pub fn signature_len(&self) -> usize {
        self.banding.signature_len()
    }

    /// Number of added items, indexed or not.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of items visible to queries.
    pub fn num_indexed(&self) -> usize {
        self.num_indexed
    }

    /// Items added since the last `index()`.
    pub fn pending(&self) -> usize {
        self.keys.len() - self.num_indexed
    }

    pub fn state(&self) -> ForestState {
        if self.pending() == 0 {
            ForestState::Queryable
        } else {
            ForestState::Building
        }
    }

    /// Approximate heap footprint in bytes.
    pub fn size_bytes(&self) -> usize {
        let key_len = self.packer.key_len(self.banding.k);
        let spilled = if key_len > 32 { key_len } else { 0 };
        let entries: usize = self
            .tables
            .iter()
            .map(|t| t.capacity() * std::mem::size_of::<Entry>() + t.len() * spilled)
            .sum();
        entries + self.keys.capacity() * std::mem::size_of::<K>()
    }

    /// Make every added item searchable.
    ///
    /// Sorts each band table by key and freezes the queryable prefix at the
    /// current table length. A no-op when nothing was added since the last call.
    pub fn index(&mut self) {
        let pending = self.pending();
        if pending == 0 {
            return;
        }
        for table in &mut self.tables {
            table.sort_unstable_by(|a, b| a.hash_key.cmp(&b.hash_key));
        }
        self.num_indexed = self.tables.first().map_or(0, Vec::len);
        tracing::debug!(
            indexed = self.num_indexed,
            newly_indexed = pending,
            bands = self.tables.len(),
            "forest indexed"
        );
    }

    fn check_len(&self, signature: &[u64]) -> Result<()> {
        let expected = self.signature_len();
        if signature.len() != expected {
            return Err(LshError::SignatureLength {
                expected,
                actual: signature.len(),
            });
        }
        Ok(())
    }
}

impl<K: Clone + Eq + Hash> MinHashForest<K> {
    /// Add an item. It stays invisible to `query` until `index()` is called.
    ///
    /// `signature` must hold exactly `K * L` values; band `i` is
    /// `signature[i*K .. (i+1)*K]`. On error nothing is modified.
    pub fn add(&mut self, key: K, signature: &[u64]) -> Result<()> {
        self.check_len(signature)?;
        let slot = u32::try_from(self.keys.len())
            .map_err(|_| LshError::CapacityExceeded(self.keys.len()))?;

        let bands = signature.chunks_exact(self.banding.k);
        for (table, band) in self.tables.iter_mut().zip(bands) {
            table.push(Entry {
                hash_key: self.packer.pack(band),
                slot,
            });
        }
        self.keys.push(key);
        Ok(())
    }

    /// Candidate keys sharing at least one full band with `signature`.
    ///
    /// Only the indexed prefix of each table is searched. Candidates are
    /// deduplicated by key; verify them with an exact similarity if needed.
    pub fn query(&self, signature: &[u64]) -> Result<HashSet<K>> {
        self.check_len(signature)?;

        let mut slots: HashSet<u32> = HashSet::new();
        let bands = signature.chunks_exact(self.banding.k);
        for (table, band) in self.tables.iter().zip(bands) {
            let indexed = &table[..self.num_indexed];
            let target = self.packer.pack(band);
            let start = indexed.partition_point(|e| e.hash_key < target);
            slots.extend(
                indexed[start..]
                    .iter()
                    .take_while(|e| e.hash_key == target)
                    .map(|e| e.slot),
            );
        }

        tracing::trace!(candidates = slots.len(), "forest query");
        Ok(slots
            .into_iter()
            .map(|slot| self.keys[slot as usize].clone())
            .collect())
    }
}
