//! End-to-end tests: signatures in, candidate sets out.

use minhash_forest::hash::{MinHash, MinHashForest};
use rand::prelude::*;
use std::collections::HashSet;

fn random_signature(size: usize, seed: u64) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..size).map(|_| rng.gen::<u64>()).collect()
}

#[test]
fn identical_signatures_found_together() {
    let mut forest = MinHashForest::new_16(256, 0.6, 0).expect("Failed to create");
    assert_eq!(forest.signature_len(), 256);

    let sig_a = random_signature(256, 1);
    let sig_b = random_signature(256, 2);
    let sig_c = random_signature(256, 2);

    forest.add("A", &sig_a).expect("Failed to add");
    forest.add("B", &sig_b).expect("Failed to add");
    forest.add("C", &sig_c).expect("Failed to add");
    forest.index();

    let found = forest.query(&sig_b).expect("Query failed");
    assert_eq!(found, HashSet::from(["B", "C"]));

    let found = forest.query(&sig_a).expect("Query failed");
    assert_eq!(found, HashSet::from(["A"]));
}

#[test]
fn freeze_then_extend() {
    let mut forest = MinHashForest::new(128, 0.5).expect("Failed to create");
    let sig = random_signature(forest.signature_len(), 3);

    forest.add("a".to_string(), &sig).expect("Failed to add");
    forest.index();
    forest.add("b".to_string(), &sig).expect("Failed to add");

    let found = forest.query(&sig).expect("Query failed");
    assert_eq!(found, HashSet::from(["a".to_string()]));

    forest.index();
    let found = forest.query(&sig).expect("Query failed");
    assert_eq!(found, HashSet::from(["a".to_string(), "b".to_string()]));
}

#[test]
fn minhash_sets_retrieve_themselves() {
    let num_hash = 256;
    let mh = MinHash::with_seed(num_hash, 1);
    let mut forest = MinHashForest::new_16(num_hash, 0.6, 0).expect("Failed to create");
    let len = forest.signature_len();

    let sig1 = mh.signature(["hello", "world", "minhash"]);
    let sig2 = mh.signature(["hello", "minhash"]);
    let sig3 = mh.signature(["world", "minhash"]);

    forest.add("s1", &sig1.values[..len]).expect("Failed to add");
    forest.add("s2", &sig2.values[..len]).expect("Failed to add");
    forest.add("s3", &sig3.values[..len]).expect("Failed to add");
    forest.index();

    let results = forest.query(&sig3.values[..len]).expect("Query failed");
    assert!(results.contains("s3"));
}

#[test]
fn near_duplicates_found_dissimilar_skipped() {
    let num_hash = 128;
    let mh = MinHash::with_seed(num_hash, 99);
    let mut forest = MinHashForest::new(num_hash, 0.5).expect("Failed to create");
    let len = forest.signature_len();

    // Jaccard(base, near) = 95 / 100.
    let base = mh.signature(0..100);
    let near = mh.signature(0..95);
    let far = mh.signature(1000..1100);

    forest.add("near", &near.values[..len]).expect("Failed to add");
    forest.add("far", &far.values[..len]).expect("Failed to add");
    forest.index();

    let found = forest.query(&base.values[..len]).expect("Query failed");
    assert!(found.contains("near"));
    assert!(!found.contains("far"));
}

#[test]
fn random_signatures_stay_apart() {
    let mut forest = MinHashForest::new_16(128, 0.3, 200).expect("Failed to create");
    let len = forest.signature_len();
    let sigs: Vec<Vec<u64>> = (0..200).map(|i| random_signature(len, 1000 + i)).collect();

    for (i, sig) in sigs.iter().enumerate() {
        forest.add(i, sig).expect("Failed to add");
    }
    forest.index();

    for (i, sig) in sigs.iter().enumerate() {
        let found = forest.query(sig).expect("Query failed");
        assert_eq!(found, HashSet::from([i]), "signature {i} matched others");
    }
}

#[test]
fn bulk_index_matches_incremental_index() {
    let len = MinHashForest::<u32>::new(64, 0.5).unwrap().signature_len();
    let sigs: Vec<Vec<u64>> = (0..40).map(|i| random_signature(len, i)).collect();

    let mut bulk = MinHashForest::new(64, 0.5).unwrap();
    let mut incremental = MinHashForest::new(64, 0.5).unwrap();
    for (i, sig) in sigs.iter().enumerate() {
        bulk.add(i as u32, sig).unwrap();
        incremental.add(i as u32, sig).unwrap();
        if i % 7 == 0 {
            incremental.index();
        }
    }
    bulk.index();
    incremental.index();

    for sig in &sigs {
        assert_eq!(bulk.query(sig).unwrap(), incremental.query(sig).unwrap());
    }
}
