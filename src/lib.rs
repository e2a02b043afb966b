//! minhash-forest: candidate retrieval for Jaccard similarity.
//!
//! Given MinHash signatures (fixed-length `u64` arrays summarizing sets),
//! the forest returns items whose sets are likely above a similarity
//! threshold without comparing every pair of signatures.
//!
//! - `hash/`: banding parameter search, key packing, the forest itself and a
//!   reference MinHash generator
//! - `persistence/`: versioned, compressed save/load
//!
//! # Critical Nuances
//!
//! ## Candidates, not answers
//!
//! A query returns every item sharing at least one full band with the query
//! signature. Some of them will be below the threshold (false positives) and
//! some items above it will be missed (false negatives). The banding search
//! balances the two, but callers that need exact results must verify
//! candidates against the real sets.
//!
//! ## Add, then index
//!
//! Insertion appends; `index()` sorts. Items added after the last `index()`
//! are invisible to queries. Build in bulk and index once: every `index()`
//! re-sorts all L tables.
//!
//! ## Signature length
//!
//! The forest consumes exactly `K * L` values, which can be fewer than the
//! `num_hash` it was configured with. Passing any other length is an error,
//! never a silent truncation.
//!
//! ## Key width
//!
//! Band values can be truncated to 16 or 32 bits to save memory. Truncation
//! only adds collisions (more candidates); it never loses a true band match.

pub mod error;
pub mod hash;
pub mod persistence;

// Re-exports
pub use error::{LshError, Result};
pub use hash::{
    optimal_kl, BandingParams, ForestParams, ForestState, HashValueSize, MinHash, MinHashForest,
    MinHashSignature,
};
pub use persistence::PersistenceError;
