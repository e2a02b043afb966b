//! Edge case tests for minhash-forest.
//!
//! Tests unusual inputs and boundary conditions that could cause failures.

use minhash_forest::hash::{ForestParams, ForestState, HashValueSize, MinHashForest};
use minhash_forest::LshError;
use std::collections::HashSet;

// =============================================================================
// Configuration edge cases
// =============================================================================

#[test]
fn single_hash_value() {
    let mut forest = MinHashForest::new(1, 0.5).expect("Failed to create");
    assert_eq!(forest.params(), (1, 1));

    forest.add("x", &[7]).expect("Failed to add");
    forest.add("y", &[8]).expect("Failed to add");
    forest.index();

    assert_eq!(forest.query(&[7]).unwrap(), HashSet::from(["x"]));
    assert!(forest.query(&[9]).unwrap().is_empty());
}

#[test]
fn threshold_bounds_accepted() {
    assert!(MinHashForest::<u8>::new(32, 0.0).is_ok());
    assert!(MinHashForest::<u8>::new(32, 1.0).is_ok());
}

#[test]
fn infeasible_configuration_rejected() {
    for (num_hash, threshold) in [(0, 0.5), (16, -0.01), (16, 1.01), (16, f64::NAN)] {
        let err = MinHashForest::<u8>::new(num_hash, threshold).unwrap_err();
        assert!(
            matches!(err, LshError::InvalidParameter(_)),
            "num_hash={num_hash} threshold={threshold}: {err}"
        );
    }
}

#[test]
fn custom_integration_precision() {
    let forest = MinHashForest::<u8>::with_params(ForestParams {
        num_hash: 64,
        threshold: 0.5,
        hash_value_size: HashValueSize::Bits64,
        initial_capacity: 4,
        integration_precision: 0.05,
    })
    .expect("Failed to create");
    let (k, l) = forest.params();
    assert!(k * l <= 64);
    assert_eq!(forest.hash_value_size(), HashValueSize::Bits64);
}

// =============================================================================
// Signature edge cases
// =============================================================================

#[test]
fn wrong_signature_length_is_reported() {
    let mut forest = MinHashForest::new(64, 0.5).expect("Failed to create");
    let len = forest.signature_len();

    assert_eq!(
        forest.add(1u32, &vec![0; len + 3]),
        Err(LshError::SignatureLength {
            expected: len,
            actual: len + 3
        })
    );
    assert!(forest.add(1u32, &[]).is_err());
    assert!(forest.query(&vec![0; len - 1]).is_err());
    assert!(forest.is_empty());
}

#[test]
fn all_zero_and_all_max_signatures() {
    let mut forest = MinHashForest::new(64, 0.5).expect("Failed to create");
    let len = forest.signature_len();

    forest.add("zero", &vec![0; len]).unwrap();
    forest.add("max", &vec![u64::MAX; len]).unwrap();
    forest.index();

    assert_eq!(forest.query(&vec![0; len]).unwrap(), HashSet::from(["zero"]));
    assert_eq!(forest.query(&vec![u64::MAX; len]).unwrap(), HashSet::from(["max"]));
}

#[test]
fn truncated_width_merges_high_bits() {
    let mut narrow = MinHashForest::new_16(32, 0.5, 0).unwrap();
    let mut wide = MinHashForest::new_64(32, 0.5, 0).unwrap();
    let len = narrow.signature_len();

    let a: Vec<u64> = (0..len as u64).collect();
    // Same low 16 bits everywhere, different high bits.
    let b: Vec<u64> = a.iter().map(|v| v | 0xABCD_0000_0000_0000).collect();

    for forest in [&mut narrow, &mut wide] {
        forest.add("a", &a).unwrap();
        forest.index();
    }

    assert_eq!(narrow.query(&b).unwrap(), HashSet::from(["a"]));
    assert!(wide.query(&b).unwrap().is_empty());
}

// =============================================================================
// Lifecycle edge cases
// =============================================================================

#[test]
fn index_on_empty_forest() {
    let mut forest: MinHashForest<u64> = MinHashForest::new(16, 0.5).unwrap();
    forest.index();
    forest.index();
    assert_eq!(forest.state(), ForestState::Queryable);
    assert_eq!(forest.num_indexed(), 0);
}

#[test]
fn many_identical_signatures() {
    let mut forest = MinHashForest::new(32, 0.5).unwrap();
    let sig = vec![42u64; forest.signature_len()];
    for i in 0..500u32 {
        forest.add(i, &sig).unwrap();
    }
    forest.index();

    let found = forest.query(&sig).unwrap();
    assert_eq!(found.len(), 500);
}

#[test]
fn pending_counts_unindexed_items() {
    let mut forest = MinHashForest::new(16, 0.5).unwrap();
    let len = forest.signature_len();
    for i in 0..3u64 {
        forest.add(i, &vec![i; len]).unwrap();
    }
    assert_eq!(forest.pending(), 3);
    assert_eq!(forest.state(), ForestState::Building);

    forest.index();
    forest.add(3, &vec![3; len]).unwrap();
    assert_eq!(forest.pending(), 1);
    assert_eq!(forest.num_indexed(), 3);
    assert_eq!(forest.len(), 4);
}

#[test]
fn test_forest_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<MinHashForest<String>>();
    assert_send_sync::<MinHashForest<u64>>();
}
