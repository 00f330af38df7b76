//! Aggregation benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use halotrace::analysis::{branch_lengths, collect_branch_statistic};
use halotrace::*;

const SNAPSHOTS: usize = SNAPSHOT_COUNT;

/// Forest of linear chains with masses from a fixed LCG.
fn forest(chains: usize) -> MergerTree {
    let mut state = 0x2545_f491_4f6c_dd1du64;
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        state >> 33
    };

    let mut tree = MergerTree::new();
    for chain in 0..chains {
        let len = 1 + next() as usize % SNAPSHOTS;
        let masses: Vec<u64> = (0..len).map(|_| 1 + next() % 5000).collect();
        let first = SNAPSHOTS - len;
        let id = |ordinal: usize| (chain * 1000 + ordinal) as HaloId;
        for (k, &mass) in masses.iter().enumerate() {
            let ordinal = first + k;
            let progenitors = match k {
                0 => Vec::new(),
                _ => vec![Link::new(id(ordinal - 1), masses[k - 1])],
            };
            let descendants = match masses.get(k + 1) {
                Some(&m) => vec![Link::new(id(ordinal + 1), m)],
                None => Vec::new(),
            };
            let snapshot = SnapshotId::new(ordinal as u16).unwrap();
            tree.insert(snapshot, id(ordinal), HaloRecord::new(mass, progenitors, descendants));
        }
    }
    tree
}

fn benchmark_aggregation(c: &mut Criterion) {
    let index = SnapshotIndex::new((1..=SNAPSHOTS).map(|t| t as f64 * 0.1).collect()).unwrap();

    let mut group = c.benchmark_group("collect_branch_statistic");
    for chains in [1_000usize, 10_000] {
        let tree = forest(chains);
        for statistic in [BranchStatistic::LogMassGrowth, BranchStatistic::MassFluctuation] {
            group.bench_with_input(
                BenchmarkId::new(statistic.name(), chains),
                &tree,
                |b, tree| {
                    b.iter(|| {
                        black_box(collect_branch_statistic(tree, &index, statistic, DEFAULT_CUTOFF))
                    });
                },
            );
        }
    }
    group.finish();

    let tree = forest(10_000);
    c.bench_function("branch_lengths/10000", |b| {
        b.iter(|| black_box(branch_lengths(&tree, &index, DEFAULT_CUTOFF)));
    });
}

criterion_group!(benches, benchmark_aggregation);
criterion_main!(benches);
