//! Seeded train/test splitting
//!
//! The permutation is drawn from a `StdRng` seeded inside the call, so the
//! same `(row count, seed, fraction)` always yields the same partition. The
//! sample cap truncates each partition from its start without moving the
//! boundary.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{PrepError, Result};
use crate::table::{Column, Table};

/// Name of the column added by [`tag_rows`].
pub const IS_TRAIN_COLUMN: &str = "is_train";

/// Split parameters as configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub seed: u64,
    /// `None` lets the pipeline variant pick.
    pub train_fraction: Option<f64>,
    /// Per-partition row cap; `0` means no cap.
    pub max_samples: Option<usize>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            train_fraction: None,
            max_samples: None,
        }
    }
}

/// Fully resolved split parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SplitParams {
    pub seed: u64,
    pub train_fraction: f64,
    pub max_samples: Option<usize>,
}

impl SplitParams {
    pub fn new(seed: u64, train_fraction: f64, max_samples: Option<usize>) -> Result<Self> {
        if !(0.0..=1.0).contains(&train_fraction) {
            return Err(PrepError::InvalidParameter(format!(
                "train fraction {} outside [0, 1]",
                train_fraction
            )));
        }
        Ok(Self {
            seed,
            train_fraction,
            max_samples: max_samples.filter(|&max| max > 0),
        })
    }
}

/// Seeded permutation of `0..len`.
pub fn permutation(len: usize, seed: u64) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut order: Vec<usize> = (0..len).collect();
    order.shuffle(&mut rng);
    order
}

/// Row positions of each partition, before and after capping.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitPlan {
    order: Vec<usize>,
    boundary: usize,
    max_samples: Option<usize>,
}

impl SplitPlan {
    pub fn new(rows: usize, params: &SplitParams) -> Result<Self> {
        let params = SplitParams::new(params.seed, params.train_fraction, params.max_samples)?;
        let boundary = ((params.train_fraction * rows as f64).floor() as usize).min(rows);
        Ok(Self {
            order: permutation(rows, params.seed),
            boundary,
            max_samples: params.max_samples,
        })
    }

    /// Index into the permutation where the test partition starts.
    pub fn boundary(&self) -> usize {
        self.boundary
    }

    /// Train partition before capping.
    pub fn train_rows(&self) -> &[usize] {
        &self.order[..self.boundary]
    }

    /// Test partition before capping.
    pub fn test_rows(&self) -> &[usize] {
        &self.order[self.boundary..]
    }

    pub fn capped_train_rows(&self) -> &[usize] {
        cap(self.train_rows(), self.max_samples)
    }

    pub fn capped_test_rows(&self) -> &[usize] {
        cap(self.test_rows(), self.max_samples)
    }

    /// Gather the capped partitions into matrices, popping `target` out of
    /// the inputs.
    pub fn materialize(&self, table: &Table, target: &str) -> Result<SplitData> {
        if table.len() != self.order.len() {
            return Err(PrepError::Shape(format!(
                "split planned for {} rows, table has {}",
                self.order.len(),
                table.len()
            )));
        }

        let targets = numeric_column(table, target)?;
        let mut feature_names = Vec::with_capacity(table.width().saturating_sub(1));
        let mut features = Vec::with_capacity(table.width().saturating_sub(1));
        for (name, column) in table.columns() {
            if name == target {
                continue;
            }
            let values = column.as_f64().ok_or_else(|| {
                PrepError::Schema(format!(
                    "column {} is {}, matrix inputs must be numeric",
                    name,
                    column.kind()
                ))
            })?;
            feature_names.push(name.to_string());
            features.push(values);
        }

        let gather = |rows: &[usize]| -> (Vec<i64>, DenseMatrix, Vec<f64>) {
            let mut values = Vec::with_capacity(rows.len() * features.len());
            for &r in rows {
                values.extend(features.iter().map(|col| col[r]));
            }
            (
                rows.iter().map(|&r| table.index()[r]).collect(),
                DenseMatrix {
                    rows: rows.len(),
                    cols: features.len(),
                    values,
                },
                rows.iter().map(|&r| targets[r]).collect(),
            )
        };

        let (train_ids, train_inputs, train_targets) = gather(self.capped_train_rows());
        let (test_ids, test_inputs, test_targets) = gather(self.capped_test_rows());

        info!(
            train = train_ids.len(),
            test = test_ids.len(),
            boundary = self.boundary,
            features = feature_names.len(),
            "split materialized"
        );

        Ok(SplitData {
            feature_names,
            train_ids,
            train_inputs,
            train_targets,
            test_ids,
            test_inputs,
            test_targets,
        })
    }
}

fn cap(rows: &[usize], max_samples: Option<usize>) -> &[usize] {
    match max_samples {
        Some(max) if max < rows.len() => &rows[..max],
        _ => rows,
    }
}

fn numeric_column(table: &Table, name: &str) -> Result<Vec<f64>> {
    let column = table.column(name)?;
    column.as_f64().ok_or_else(|| {
        PrepError::Schema(format!(
            "target column {} is {}, expected numeric",
            name,
            column.kind()
        ))
    })
}

/// Row-major dense matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix {
    pub rows: usize,
    pub cols: usize,
    pub values: Vec<f64>,
}

impl DenseMatrix {
    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.cols..(i + 1) * self.cols]
    }
}

/// Result of a train/test split.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitData {
    pub feature_names: Vec<String>,
    pub train_ids: Vec<i64>,
    pub train_inputs: DenseMatrix,
    pub train_targets: Vec<f64>,
    pub test_ids: Vec<i64>,
    pub test_inputs: DenseMatrix,
    pub test_targets: Vec<f64>,
}

/// Split `table` into capped train/test matrices.
pub fn split(table: &Table, target: &str, params: &SplitParams) -> Result<SplitData> {
    SplitPlan::new(table.len(), params)?.materialize(table, target)
}

/// Row-tagging variant: keep the rows of both capped partitions in their
/// original order and add an `is_train` column.
pub fn tag_rows(table: &Table, params: &SplitParams) -> Result<Table> {
    let plan = SplitPlan::new(table.len(), params)?;
    tag_with_plan(table, &plan)
}

pub(crate) fn tag_with_plan(table: &Table, plan: &SplitPlan) -> Result<Table> {
    let mut membership: Vec<Option<bool>> = vec![None; table.len()];
    for &r in plan.capped_train_rows() {
        membership[r] = Some(true);
    }
    for &r in plan.capped_test_rows() {
        membership[r] = Some(false);
    }

    let kept: Vec<usize> = (0..table.len())
        .filter(|&r| membership[r].is_some())
        .collect();
    let flags = kept.iter().filter_map(|&r| membership[r]).collect();

    let mut tagged = table.take_rows(&kept);
    tagged.push_column(IS_TRAIN_COLUMN, Column::Bool(flags))?;
    Ok(tagged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn table(rows: usize) -> Table {
        let ids: Vec<i64> = (0..rows as i64).map(|i| 1000 + i).collect();
        let mut t = Table::new("id", ids).unwrap();
        t.push_column("x", Column::Float((0..rows).map(|i| i as f64).collect()))
            .unwrap();
        t.push_column(
            "flag",
            Column::Bool((0..rows).map(|i| i % 2 == 0).collect()),
        )
        .unwrap();
        t.push_column(
            "will_default",
            Column::Float((0..rows).map(|i| if i < 3 { 1.0 } else { 0.0 }).collect()),
        )
        .unwrap();
        t
    }

    #[test]
    fn test_permutation_is_reproducible() {
        assert_eq!(permutation(50, 42), permutation(50, 42));
        assert_ne!(permutation(50, 42), permutation(50, 43));

        let mut sorted = permutation(50, 7);
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_ten_rows_seventy_percent() {
        let t = table(10);
        let params = SplitParams::new(42, 0.7, None).unwrap();
        let a = split(&t, "will_default", &params).unwrap();
        let b = split(&t, "will_default", &params).unwrap();

        assert_eq!(a.train_ids.len(), 7);
        assert_eq!(a.test_ids.len(), 3);
        assert_eq!(a, b);

        let all: HashSet<i64> = a.train_ids.iter().chain(&a.test_ids).copied().collect();
        assert_eq!(all.len(), 10);

        let positives: f64 = a.train_targets.iter().chain(&a.test_targets).sum();
        assert_eq!(positives, 3.0);
    }

    #[test]
    fn test_target_not_in_inputs() {
        let t = table(6);
        let data = split(&t, "will_default", &SplitParams::new(1, 0.5, None).unwrap()).unwrap();
        assert_eq!(data.feature_names, vec!["x", "flag"]);
        assert_eq!(data.train_inputs.cols, 2);

        // each input row still lines up with its identifier
        for (i, id) in data.train_ids.iter().enumerate() {
            let row = data.train_inputs.row(i);
            assert_eq!(row[0], (*id - 1000) as f64);
            assert_eq!(row[1], if (*id - 1000) % 2 == 0 { 1.0 } else { 0.0 });
        }
    }

    #[test]
    fn test_sample_cap_leaves_boundary() {
        let t = table(100);
        let params = SplitParams::new(42, 0.8, Some(5)).unwrap();
        let plan = SplitPlan::new(t.len(), &params).unwrap();
        assert_eq!(plan.boundary(), 80);
        assert_eq!(plan.train_rows().len(), 80);
        assert_eq!(plan.test_rows().len(), 20);

        let data = plan.materialize(&t, "will_default").unwrap();
        assert_eq!(data.train_ids.len(), 5);
        assert_eq!(data.test_ids.len(), 5);
        assert_eq!(data.train_inputs.rows, 5);
        assert_eq!(data.test_targets.len(), 5);

        // capping keeps the head of each partition
        let uncapped = split(&t, "will_default", &SplitParams::new(42, 0.8, None).unwrap()).unwrap();
        assert_eq!(data.train_ids[..], uncapped.train_ids[..5]);
        assert_eq!(data.test_ids[..], uncapped.test_ids[..5]);
    }

    #[test]
    fn test_zero_cap_means_uncapped() {
        let t = table(10);
        let params = SplitParams::new(42, 0.7, Some(0)).unwrap();
        assert_eq!(params, SplitParams::new(42, 0.7, None).unwrap());

        let data = split(&t, "will_default", &params).unwrap();
        assert_eq!(data.train_ids.len(), 7);
        assert_eq!(data.test_ids.len(), 3);
    }

    #[test]
    fn test_degenerate_fractions() {
        let t = table(4);
        let none = split(&t, "will_default", &SplitParams::new(3, 0.0, None).unwrap()).unwrap();
        assert!(none.train_ids.is_empty());
        assert_eq!(none.test_ids.len(), 4);
        assert_eq!(none.train_inputs.rows, 0);

        let all = split(&t, "will_default", &SplitParams::new(3, 1.0, None).unwrap()).unwrap();
        assert_eq!(all.train_ids.len(), 4);
        assert!(all.test_ids.is_empty());
    }

    #[test]
    fn test_fraction_out_of_range() {
        assert!(matches!(
            SplitParams::new(1, 1.5, None),
            Err(PrepError::InvalidParameter(_))
        ));
        assert!(SplitParams::new(1, -0.1, None).is_err());
        assert!(SplitParams::new(1, f64::NAN, None).is_err());
    }

    #[test]
    fn test_string_input_rejected() {
        let mut t = table(3);
        t.push_column("city", Column::Text(vec!["a".into(); 3])).unwrap();
        let err = split(&t, "will_default", &SplitParams::new(1, 0.5, None).unwrap()).unwrap_err();
        assert!(matches!(err, PrepError::Schema(_)));
    }

    #[test]
    fn test_missing_target() {
        let t = table(3);
        let err = split(&t, "label", &SplitParams::new(1, 0.5, None).unwrap()).unwrap_err();
        assert!(matches!(err, PrepError::Schema(_)));
    }

    #[test]
    fn test_tag_rows() {
        let t = table(10);
        let params = SplitParams::new(42, 0.7, None).unwrap();
        let tagged = tag_rows(&t, &params).unwrap();

        assert_eq!(tagged.len(), 10);
        assert_eq!(tagged.index(), t.index());
        let Column::Bool(flags) = tagged.column(IS_TRAIN_COLUMN).unwrap() else {
            panic!("is_train should be boolean");
        };
        assert_eq!(flags.iter().filter(|&&f| f).count(), 7);

        let data = split(&t, "will_default", &params).unwrap();
        for (pos, id) in tagged.index().iter().enumerate() {
            assert_eq!(flags[pos], data.train_ids.contains(id));
        }
    }

    #[test]
    fn test_tag_rows_with_cap_drops_rows() {
        let t = table(20);
        let tagged = tag_rows(&t, &SplitParams::new(9, 0.5, Some(3)).unwrap()).unwrap();
        assert_eq!(tagged.len(), 6);
    }
}
