use halotrace::statistics::{growth_rate, log_mass_growth};
use halotrace::*;
use proptest::prelude::*;
use test_helpers::*;

const SNAPSHOTS: usize = 24;

proptest! {
    #[test]
    fn walk_steps_back_one_snapshot_at_a_time(
        masses in proptest::collection::vec(1u64..5000, 1..=SNAPSHOTS),
        minors in proptest::collection::vec(any::<bool>(), SNAPSHOTS),
    ) {
        let index = unit_index(SNAPSHOTS);
        let mut tree = chain_forest(SNAPSHOTS, &[masses.clone()]);

        // Lighter extra progenitors listed after the main one must never be
        // followed.
        let first = SNAPSHOTS - masses.len();
        for (k, with_minor) in minors.iter().enumerate().take(masses.len()).skip(1) {
            if !with_minor {
                continue;
            }
            let ordinal = first + k;
            let minor_id = 500 + ordinal as HaloId;
            let main = tree.get(snap(ordinal as u16), chain_id(0, ordinal)).unwrap().clone();
            let mut progenitors = main.progenitors().to_vec();
            progenitors.push(Link::new(minor_id, 0));
            tree.insert(
                snap(ordinal as u16),
                chain_id(0, ordinal),
                HaloRecord::new(main.particles, progenitors, main.descendants().to_vec()),
            );
            tree.insert(
                snap(ordinal as u16 - 1),
                minor_id,
                HaloRecord::new(0, Vec::new(), vec![Link::new(chain_id(0, ordinal), main.particles)]),
            );
        }

        let root = chain_id(0, SNAPSHOTS - 1);
        let steps: Vec<_> = MainBranch::walk(&tree, &index, index.latest(), root)
            .collect::<Result<_, _>>()
            .expect("chain walks cleanly");

        prop_assert_eq!(steps.len(), masses.len());
        prop_assert!(steps.len() <= index.len());
        for pair in steps.windows(2) {
            prop_assert_eq!(pair[0].snapshot.ordinal(), pair[1].snapshot.ordinal() + 1);
        }
        for (step, &mass) in steps.iter().zip(masses.iter().rev()) {
            prop_assert_eq!(step.record.particles, mass);
            prop_assert!(step.halo_id < 500, "followed a minor progenitor");
        }
        prop_assert_eq!(steps.last().map(|s| s.record.n_prog()), Some(0));
    }

    #[test]
    fn walk_is_restartable(masses in proptest::collection::vec(1u64..5000, 1..=SNAPSHOTS)) {
        let index = unit_index(SNAPSHOTS);
        let tree = chain_forest(SNAPSHOTS, &[masses]);
        let root = chain_id(0, SNAPSHOTS - 1);

        let first = MainBranch::walk(&tree, &index, index.latest(), root).into_path().unwrap();
        let second = MainBranch::walk(&tree, &index, index.latest(), root).into_path().unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn swapping_masses_negates_growth(
        m0 in 1.0f64..1e6,
        m1 in 1.0f64..1e6,
        t0 in 0.01f64..10.0,
        dt in 0.01f64..10.0,
    ) {
        let t1 = t0 + dt;
        let forward = growth_rate(m0, m1, t0, t1).unwrap();
        let backward = growth_rate(m1, m0, t0, t1).unwrap();
        prop_assert!((forward + backward).abs() <= 1e-9 * forward.abs().max(1.0));

        // Swapping both masses and times leaves the rate unchanged.
        let mirrored = growth_rate(m1, m0, t1, t0).unwrap();
        prop_assert!((forward - mirrored).abs() <= 1e-9 * forward.abs().max(1.0));
    }

    #[test]
    fn growth_below_cutoff_is_undefined(
        mass in 0u64..100,
        descendant in 0u64..100,
        cutoff in 1u64..100,
    ) {
        let index = unit_index(3);
        let record = HaloRecord::new(mass, Vec::new(), vec![Link::new(1, descendant)]);
        let growth = log_mass_growth(&record, snap(1), &index, cutoff);
        if mass < cutoff || descendant < cutoff {
            prop_assert_eq!(growth, None);
        } else {
            let value = growth.expect("both masses pass the cutoff");
            prop_assert!(value.is_finite());
        }
    }
}
