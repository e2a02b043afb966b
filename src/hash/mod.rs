//! MinHash LSH Forest: candidate retrieval for Jaccard similarity.
//!
//! ## The banding trick
//!
//! A MinHash signature of `n` values agrees with another signature at each
//! position with probability `J`, the Jaccard similarity of the two sets.
//! Split the signature into L bands of K values and call two items candidates
//! when *any* band agrees on all K values:
//!
//! ```text
//! P[candidate] = 1 - (1 - J^K)^L
//! ```
//!
//! This S-curve is steep around the threshold `t`. Larger K pushes the curve
//! right (fewer false positives), larger L pushes it left (fewer false
//! negatives). [`optimal_kl`] picks the pair minimizing both error areas for
//! a given `n` and `t`.
//!
//! ## Storage
//!
//! Each band becomes a packed byte key ([`key`]) stored in a sorted table per
//! band. Building is append-then-sort; lookups are binary searches. See
//! [`forest`] for the life cycle.
//!
//! ```rust
//! use minhash_forest::hash::{MinHash, MinHashForest};
//!
//! let mh = MinHash::new(128);
//! let mut forest = MinHashForest::new(128, 0.5).unwrap();
//! let (k, l) = forest.params();
//! let len = k * l;
//!
//! let doc1 = mh.signature(["the", "quick", "brown", "fox"]);
//! let doc2 = mh.signature(["the", "quick", "brown", "dog"]);
//! forest.add("doc1", &doc1.values[..len]).unwrap();
//! forest.add("doc2", &doc2.values[..len]).unwrap();
//! forest.index();
//!
//! let candidates = forest.query(&doc1.values[..len]).unwrap();
//! assert!(candidates.contains("doc1"));
//! ```
//!
//! ## References
//!
//! - Broder (1997). "On the resemblance and containment of documents."
//! - Bawa, Condie & Ganesan (2005). "LSH Forest: self-tuning indexes for
//!   similarity search."
//! - Leskovec, Rajaraman & Ullman. "Mining of Massive Datasets", ch. 3.

pub mod forest;
pub mod key;
pub mod minhash;
pub mod params;

pub use forest::{ForestParams, ForestState, MinHashForest};
pub use key::{pack, HashKey, HashValueSize, KeyPacker};
pub use minhash::{MinHash, MinHashSignature, MinHashSketch};
pub use params::{optimal_kl, optimal_kl_with_precision, BandingParams};
