//! Aggregation over whole merger trees

use std::f64::consts::PI;

use halotrace::analysis::{
    branch_lengths, collect_branch_statistic, compare_branch_lengths, compare_branch_statistic,
    compare_link_counts, link_counts, main_branch_roots, BranchComparison,
};
use halotrace::*;
use test_helpers::*;

fn two_chains() -> (MergerTree, SnapshotIndex) {
    let index = unit_index(3);
    let tree = chain_forest(3, &[vec![10, 20, 60], vec![30, 10, 30]]);
    (tree, index)
}

#[test]
fn growth_samples_follow_root_then_branch_order() {
    let (tree, index) = two_chains();
    let samples = collect_branch_statistic(&tree, &index, BranchStatistic::LogMassGrowth, 10);

    assert_eq!(samples.roots, 2);
    assert_eq!(samples.values, vec![2.5, 1.0, 2.5, -1.5]);
    assert_eq!(samples.undefined, 0);
    assert!(samples.failures.is_empty());
}

#[test]
fn fluctuation_counts_halos_without_progenitor_as_undefined() {
    let (tree, index) = two_chains();
    let samples = collect_branch_statistic(&tree, &index, BranchStatistic::MassFluctuation, 10);

    let first = (2.5f64.atan() - 1.0f64.atan()) / PI;
    let second = (2.5f64.atan() - (-1.5f64).atan()) / PI;
    assert_eq!(samples.values.len(), 2);
    assert!((samples.values[0] - first).abs() < 1e-12);
    assert!((samples.values[1] - second).abs() < 1e-12);
    // The earliest halo of each chain has no progenitor.
    assert_eq!(samples.undefined, 2);
}

#[test]
fn undefined_values_are_skipped_not_stored() {
    let index = unit_index(4);
    // Second step drops below the cutoff on its descendant side.
    let tree = chain_forest(4, &[vec![40, 5, 40, 80]]);
    let samples = collect_branch_statistic(&tree, &index, BranchStatistic::LogMassGrowth, 10);

    // 40 -> 80 is defined; 5 is skipped outright; 40 -> 5 is undefined.
    assert_eq!(samples.values.len(), 1);
    assert_eq!(samples.undefined, 1);
    assert!(samples.values.iter().all(|v| v.is_finite()));
}

#[test]
fn light_roots_are_not_walked() {
    let index = unit_index(3);
    let tree = chain_forest(3, &[vec![10, 20, 60], vec![100, 100, 9]]);

    assert_eq!(main_branch_roots(&tree, &index, 10), vec![chain_id(0, 2)]);
    let samples = collect_branch_statistic(&tree, &index, BranchStatistic::LogMassGrowth, 10);
    assert_eq!(samples.roots, 1);
    assert_eq!(samples.values, vec![2.5, 1.0]);
}

#[test]
fn missing_progenitor_excludes_only_that_lineage() {
    let (mut tree, index) = two_chains();
    tree.insert(
        snap(2),
        7,
        HaloRecord::new(50, vec![Link::new(404, 40)], Vec::new()),
    );

    let samples = collect_branch_statistic(&tree, &index, BranchStatistic::LogMassGrowth, 10);
    assert_eq!(samples.roots, 3);
    assert_eq!(samples.values, vec![2.5, 1.0, 2.5, -1.5]);
    assert_eq!(samples.failures.len(), 1);
    assert_eq!(samples.failures[0].root_id, 7);
    assert_eq!(
        samples.failures[0].error,
        TraversalError::KeyNotFound {
            snapshot: snap(1),
            halo_id: 404,
        }
    );
}

#[test]
fn failed_lineage_discards_values_gathered_before_the_failure() {
    let index = unit_index(3);
    let mut tree = MergerTree::new();
    // Healthy upper part, but the earliest halo claims a progenitor.
    tree.insert(
        snap(0),
        1,
        HaloRecord::new(20, vec![Link::new(99, 10)], vec![Link::new(2, 40)]),
    );
    tree.insert(
        snap(1),
        2,
        HaloRecord::new(40, vec![Link::new(1, 20)], vec![Link::new(3, 80)]),
    );
    tree.insert(
        snap(2),
        3,
        HaloRecord::new(80, vec![Link::new(2, 40)], Vec::new()),
    );

    let samples = collect_branch_statistic(&tree, &index, BranchStatistic::LogMassGrowth, 10);
    assert!(samples.values.is_empty());
    assert_eq!(
        samples.failures[0].error,
        TraversalError::InvalidTraversal {
            snapshot: snap(0),
            halo_id: 1,
            n_prog: 1,
        }
    );
}

#[test]
fn identical_datasets_compare_equal() {
    let (tree, index) = two_chains();
    let comparison = compare_branch_statistic(
        (&tree, &index),
        (&tree, &index),
        BranchStatistic::LogMassGrowth,
        10,
    );
    let ks = comparison.ks.unwrap();
    assert_eq!(ks.statistic, 0.0);
    assert_eq!(ks.p_value, 1.0);
    assert_eq!(comparison.first, comparison.second);
}

#[test]
fn comparison_without_values_skips_ks() {
    let (tree, index) = two_chains();
    let empty = MergerTree::new();
    let comparison = compare_branch_statistic(
        (&tree, &index),
        (&empty, &index),
        BranchStatistic::LogMassGrowth,
        10,
    );
    assert_eq!(comparison.ks, Err(StatisticsError::EmptySample));
    assert_eq!(comparison.second.roots, 0);
}

#[test]
fn comparison_of_collected_samples_matches_full_run() {
    let (tree, index) = two_chains();
    let other = chain_forest(3, &[vec![15, 30, 45]]);
    let full = compare_branch_statistic(
        (&tree, &index),
        (&other, &index),
        BranchStatistic::LogMassGrowth,
        10,
    );
    let first = collect_branch_statistic(&tree, &index, BranchStatistic::LogMassGrowth, 10);
    let second = collect_branch_statistic(&other, &index, BranchStatistic::LogMassGrowth, 10);
    assert_eq!(BranchComparison::new(first, second), full);
    assert!(full.ks.unwrap().statistic > 0.0);
}

#[test]
fn non_finite_values_surface_as_ks_error() {
    let samples = |values: Vec<f64>| BranchSamples {
        values,
        ..BranchSamples::default()
    };
    let comparison = BranchComparison::new(samples(vec![1.0]), samples(vec![f64::NAN]));
    assert_eq!(comparison.ks, Err(StatisticsError::NonFinite));
}

#[test]
fn branch_lengths_count_every_halo() {
    let index = unit_index(5);
    let tree = chain_forest(5, &[vec![10, 20, 60], vec![11, 12, 13, 14, 15], vec![50]]);
    let lengths = branch_lengths(&tree, &index, 10);
    assert_eq!(lengths.lengths, vec![3, 5, 1]);
    assert!(lengths.failures.is_empty());
}

#[test]
fn branch_length_comparison_tests_both_datasets() {
    let index = unit_index(5);
    let short = chain_forest(5, &[vec![10, 20], vec![11, 12], vec![50]]);
    let long = chain_forest(5, &[vec![10, 20, 30, 40, 50], vec![11, 12, 13, 14]]);

    let comparison = compare_branch_lengths((&short, &index), (&long, &index), 10);
    assert_eq!(comparison.first.lengths, vec![2, 2, 1]);
    assert_eq!(comparison.second.lengths, vec![5, 4]);
    assert_eq!(comparison.ks.unwrap().statistic, 1.0);

    let empty = MergerTree::new();
    let comparison = compare_branch_lengths((&short, &index), (&empty, &index), 10);
    assert_eq!(comparison.ks, Err(StatisticsError::EmptySample));
}

#[test]
fn link_counts_visit_snapshots_in_order() {
    let (tree, index) = two_chains();
    let counts = link_counts(&tree, &index, 10);
    assert_eq!(counts.progenitors, vec![0, 0, 1, 1, 1, 1]);
    assert_eq!(counts.descendants, vec![1, 1, 1, 1, 0, 0]);

    let heavy = link_counts(&tree, &index, 25);
    assert_eq!(heavy.len(), 3);
}

#[test]
fn link_count_comparison_tests_both_sides() {
    let (tree, index) = two_chains();
    let comparison = compare_link_counts((&tree, &index), (&tree, &index), 10);
    assert_eq!(comparison.progenitor_ks.unwrap().statistic, 0.0);
    assert_eq!(comparison.descendant_ks.unwrap().p_value, 1.0);
}
