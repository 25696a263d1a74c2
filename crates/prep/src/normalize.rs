//! Z-score normalization
//!
//! Statistics are fitted on a reference set of rows and then applied to any
//! table with the same columns, so that held-out rows never influence the
//! scaling they receive.

use serde::{Deserialize, Serialize};

use crate::errors::{PrepError, Result};
use crate::table::{Column, Table};

/// Added to the standard deviation before dividing.
pub const STD_EPSILON: f64 = 1e-8;

/// Where normalization statistics come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum NormalizeMode {
    /// Leave numeric columns untouched.
    Off,
    /// Fit on every row of the transformed batch.
    Batch,
    /// Fit on the training partition only, apply to all rows.
    #[value(name = "train")]
    #[serde(alias = "train")]
    TrainReference,
}

/// Fitted statistics for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub name: String,
    pub mean: f64,
    /// Sample standard deviation (ddof = 1).
    pub std: f64,
}

/// Fitted z-score scaler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZScore {
    stats: Vec<ColumnStats>,
}

impl ZScore {
    /// Fit on every row of `table`.
    pub fn fit(table: &Table, columns: &[String]) -> Result<Self> {
        let rows: Vec<usize> = (0..table.len()).collect();
        Self::fit_rows(table, columns, &rows)
    }

    /// Fit on the given row positions only.
    pub fn fit_rows(table: &Table, columns: &[String], rows: &[usize]) -> Result<Self> {
        let stats = columns
            .iter()
            .map(|name| {
                let values = numeric_values(table, name)?;
                let sample: Vec<f64> = rows.iter().map(|&r| values[r]).collect();
                let (mean, std) = mean_std(&sample);
                Ok(ColumnStats {
                    name: name.clone(),
                    mean,
                    std,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { stats })
    }

    pub fn stats(&self) -> &[ColumnStats] {
        &self.stats
    }

    /// Replace each fitted column with `(x - mean) / (std + eps)`.
    pub fn apply(&self, table: &mut Table) -> Result<()> {
        for stat in &self.stats {
            let values = numeric_values(table, &stat.name)?;
            let scaled = values
                .iter()
                .map(|x| (x - stat.mean) / (stat.std + STD_EPSILON))
                .collect();
            *table.column_mut(&stat.name)? = Column::Float(scaled);
        }
        Ok(())
    }
}

fn numeric_values(table: &Table, name: &str) -> Result<Vec<f64>> {
    let column = table.column(name)?;
    column.as_f64().ok_or_else(|| {
        PrepError::Schema(format!(
            "column {} is {}, expected numeric",
            name,
            column.kind()
        ))
    })
}

/// Mean and sample standard deviation. Fewer than two values give std 0.
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < 2 {
        return (mean, 0.0);
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, var.sqrt())
}
