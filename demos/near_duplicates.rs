//! Near-duplicate detection with a MinHash LSH Forest.
//!
//! Builds word-shingle signatures for a handful of sentences, indexes them,
//! and shows which documents each query pulls in as candidates.
//!
//! ```bash
//! cargo run --example near_duplicates
//! ```

use minhash_forest::hash::params::match_probability;
use minhash_forest::hash::{MinHash, MinHashForest};
use std::collections::HashSet;

const NUM_HASH: usize = 128;
const THRESHOLD: f64 = 0.5;

fn shingles(text: &str, n: usize) -> HashSet<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    words.windows(n).map(|w| w.join(" ")).collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let inter = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        inter as f64 / union as f64
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("MinHash LSH Forest");
    println!("==================\n");

    let docs = [
        "the quick brown fox jumps over the lazy dog near the river bank today",
        "the quick brown fox jumps over the lazy dog near the river bank tonight",
        "the quick brown fox leaps over the lazy dog near the river bank today",
        "lorem ipsum dolor sit amet consectetur adipiscing elit sed do eiusmod",
        "a completely different sentence about distributed storage engines and logs",
    ];

    let mh = MinHash::new(NUM_HASH);
    let mut forest = MinHashForest::new(NUM_HASH, THRESHOLD)?;
    let (k, l) = forest.params();
    let banding = *forest.banding();

    println!("Banding for {NUM_HASH} hashes at threshold {THRESHOLD}:");
    println!("  K = {k} values per band, L = {l} bands");
    println!(
        "  false positive mass {:.4}, false negative mass {:.4}\n",
        banding.false_positive, banding.false_negative
    );

    println!("Collision probability curve:");
    for j in [0.2, 0.4, 0.5, 0.6, 0.8, 0.95] {
        println!("  J = {j:.2} -> P = {:.3}", match_probability(j, k, l));
    }
    println!();

    let sets: Vec<HashSet<String>> = docs.iter().map(|d| shingles(d, 2)).collect();
    let len = forest.signature_len();
    for (i, set) in sets.iter().enumerate() {
        forest.add(i, &mh.signature(set).values[..len])?;
    }
    forest.index();

    for (i, set) in sets.iter().enumerate() {
        let mut candidates: Vec<usize> = forest
            .query(&mh.signature(set).values[..len])?
            .into_iter()
            .filter(|&c| c != i)
            .collect();
        candidates.sort_unstable();

        println!("doc{i}: {}", docs[i]);
        if candidates.is_empty() {
            println!("  no candidates");
        }
        for c in candidates {
            println!("  candidate doc{c} (exact J = {:.3})", jaccard(set, &sets[c]));
        }
    }

    Ok(())
}
