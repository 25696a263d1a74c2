use creditprep::normalize::{mean_std, STD_EPSILON};
use creditprep::split::permutation;
use creditprep::{split, Column, SplitParams, SplitPlan, Table, ZScore};
use proptest::prelude::*;
use std::collections::HashSet;

fn numbered_table(rows: usize) -> Table {
    let mut table = Table::new("id", (0..rows as i64).map(|i| i * 10).collect())
        .expect("unique identifiers");
    table
        .push_column("x", Column::Float((0..rows).map(|i| i as f64).collect()))
        .expect("column length");
    table
        .push_column(
            "y",
            Column::Float((0..rows).map(|i| (i % 2) as f64).collect()),
        )
        .expect("column length");
    table
}

proptest! {
    #[test]
    fn permutation_is_deterministic_and_complete(len in 0usize..200, seed in any::<u64>()) {
        let a = permutation(len, seed);
        prop_assert_eq!(&a, &permutation(len, seed));

        let mut sorted = a;
        sorted.sort_unstable();
        prop_assert_eq!(sorted, (0..len).collect::<Vec<_>>());
    }

    #[test]
    fn partitions_cover_rows_exactly_once(
        rows in 0usize..150,
        seed in any::<u64>(),
        fraction in 0.0f64..=1.0,
        cap in proptest::option::of(1usize..40),
    ) {
        let params = SplitParams::new(seed, fraction, cap).expect("fraction in range");
        let plan = SplitPlan::new(rows, &params).expect("valid plan");

        prop_assert_eq!(plan.boundary(), (fraction * rows as f64).floor() as usize);
        prop_assert_eq!(plan.train_rows().len() + plan.test_rows().len(), rows);

        let union: HashSet<usize> = plan
            .train_rows()
            .iter()
            .chain(plan.test_rows())
            .copied()
            .collect();
        prop_assert_eq!(union.len(), rows);

        if let Some(max) = cap {
            prop_assert!(plan.capped_train_rows().len() <= max);
            prop_assert!(plan.capped_test_rows().len() <= max);
        }
        prop_assert!(plan.train_rows().starts_with(plan.capped_train_rows()));
        prop_assert!(plan.test_rows().starts_with(plan.capped_test_rows()));
    }

    #[test]
    fn split_is_reproducible_and_disjoint(
        rows in 1usize..80,
        seed in any::<u64>(),
        fraction in 0.0f64..=1.0,
    ) {
        let table = numbered_table(rows);
        let params = SplitParams::new(seed, fraction, None).expect("fraction in range");
        let a = split(&table, "y", &params).expect("split");
        let b = split(&table, "y", &params).expect("split");
        prop_assert_eq!(&a, &b);

        let train: HashSet<i64> = a.train_ids.iter().copied().collect();
        prop_assert!(a.test_ids.iter().all(|id| !train.contains(id)));
        prop_assert!(!a.feature_names.iter().any(|n| n == "y"));

        // targets follow their rows
        for (i, id) in a.train_ids.iter().enumerate() {
            prop_assert_eq!(a.train_targets[i], ((id / 10) % 2) as f64);
        }
    }

    #[test]
    fn zscore_centers_reference_rows(values in prop::collection::vec(-1e6f64..1e6, 2..60)) {
        let mut table = Table::with_sequential_index("id", values.len());
        table.push_column("v", Column::Float(values.clone())).expect("column length");

        let scaler = ZScore::fit(&table, &["v".to_string()]).expect("numeric column");
        scaler.apply(&mut table).expect("apply");

        let scaled = table.column("v").expect("column").as_f64().unwrap_or_default();
        let (mean, std) = mean_std(&scaled);
        prop_assert!(mean.abs() < 1e-6);

        let (_, raw_std) = mean_std(&values);
        let expected_std = raw_std / (raw_std + STD_EPSILON);
        prop_assert!((std - expected_std).abs() < 1e-6);
    }
}
