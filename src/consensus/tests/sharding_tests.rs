use super::*;
use crate::consensus::entropy::SeededEntropy;
use crate::consensus::sharding::{index_coverage, IndexTriple, ShardAssigner, INDEXES_PER_ORACLE};
use proptest::prelude::*;

#[test]
fn test_triple_matches_by_equality() {
    let triple = IndexTriple::new([0, 4, 4]);
    assert!(triple.contains(0));
    assert!(triple.contains(4));
    assert!(!triple.contains(1));
    assert_eq!(triple.iter().count(), INDEXES_PER_ORACLE);
    assert_eq!(triple.to_string(), "[0, 4, 4]");
}

#[test]
fn test_coverage_counts_repeated_index_once() {
    let triples = [IndexTriple::new([1, 1, 1]), IndexTriple::new([1, 2, 3])];
    let coverage = index_coverage(&triples, 5);
    assert_eq!(coverage, vec![0, 2, 1, 1, 0]);
}

#[test]
fn test_zero_range_clamped() {
    let assigner = ShardAssigner::new(0);
    assert_eq!(assigner.index_range(), 1);
    let mut entropy = SeededEntropy::new(1);
    assert_eq!(assigner.assign_indexes(&mut entropy, &addr(1)), IndexTriple::new([0, 0, 0]));
}

#[test]
fn test_twenty_oracles_cover_most_indexes() {
    let mut consensus = consensus_with(Box::new(SeededEntropy::new(7)));
    let triples: Vec<IndexTriple> = (0..20)
        .map(|n| consensus.register_oracle(addr(100 + n), FEE).unwrap())
        .collect();
    let coverage = index_coverage(&triples, 10);
    assert_eq!(coverage.len(), 10);
    // 60 draws over 10 indices; every oracle contributes to at least one index.
    assert!(coverage.iter().sum::<usize>() >= 20);
}

proptest! {
    #[test]
    fn prop_indexes_in_range(seed in any::<u64>(), range in 1u8..=255) {
        let assigner = ShardAssigner::new(range);
        let mut entropy = SeededEntropy::new(seed);
        let triple = assigner.assign_indexes(&mut entropy, &addr(1));
        prop_assert!(triple.iter().all(|index| assigner.in_range(index)));
        prop_assert!(assigner.request_index(&mut entropy, &addr(1)) < range);
    }
}
