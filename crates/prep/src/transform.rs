//! Feature transforms
//!
//! Turns the raw client table into model-ready columns:
//! - configured renames (e.g. `PAY_0 -> PAY_1`)
//! - one-hot indicators from an explicit category vocabulary
//! - "paid duly" indicators derived from payment-status codes
//! - optional batch z-score normalization of numeric columns
//! - target rename and lower-cased column names
//!
//! The output column list depends only on the configuration and the input
//! column list, never on the values in the batch.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use crate::errors::{PrepError, Result};
use crate::normalize::{NormalizeMode, ZScore};
use crate::table::{Column, Table};

/// Ordered category list of one categorical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalColumn {
    pub name: String,
    pub values: Vec<String>,
}

/// Known category values per categorical column, in output order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryVocabulary {
    columns: Vec<CategoricalColumn>,
}

impl CategoryVocabulary {
    pub fn new(columns: Vec<CategoricalColumn>) -> Self {
        Self { columns }
    }

    /// Build a vocabulary from the distinct values present in `table`,
    /// sorted numerically when every value is numeric.
    pub fn scan(table: &Table, names: &[&str]) -> Result<Self> {
        let mut columns = Vec::with_capacity(names.len());
        for &name in names {
            let column = table.column(name)?;
            let values = match column {
                Column::Float(v) => {
                    let mut distinct: Vec<f64> = Vec::new();
                    for &x in v {
                        if !distinct.contains(&x) {
                            distinct.push(x);
                        }
                    }
                    distinct.sort_by(f64::total_cmp);
                    distinct
                        .into_iter()
                        .map(|x| crate::table::Value::Float(x).category_label())
                        .collect()
                }
                _ => {
                    let distinct: BTreeSet<String> =
                        (0..column.len()).map(|i| column.value(i).category_label()).collect();
                    distinct.into_iter().collect()
                }
            };
            columns.push(CategoricalColumn {
                name: name.to_string(),
                values,
            });
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[CategoricalColumn] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// What to do with a value missing from the vocabulary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownCategory {
    /// Fail with a schema error.
    #[default]
    Error,
    /// Emit all-zero indicators for that row.
    Ignore,
}

/// Column rename applied before any other step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRename {
    pub from: String,
    pub to: String,
}

impl ColumnRename {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Indicator column set to 1 where `source` equals the sentinel code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedIndicator {
    pub source: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Applied before anything else; absent columns are skipped.
    pub renames: Vec<ColumnRename>,
    pub categorical: CategoryVocabulary,
    pub on_unknown: UnknownCategory,
    pub paid_duly: Vec<DerivedIndicator>,
    /// Payment-status code meaning "paid on time".
    pub paid_duly_code: f64,
    pub numeric: Vec<String>,
    /// `None` lets the pipeline variant pick.
    pub normalize: Option<NormalizeMode>,
    pub target: String,
    pub target_name: String,
}

impl Default for TransformConfig {
    fn default() -> Self {
        let months = 1..=6;
        let categorical = CategoryVocabulary::new(vec![
            categorical("SEX", 1..=2),
            categorical("EDUCATION", 0..=6),
            categorical("MARRIAGE", 0..=3),
        ]);
        let numeric = ["LIMIT_BAL", "AGE"]
            .iter()
            .map(|s| s.to_string())
            .chain(months.clone().map(|i| format!("BILL_AMT{}", i)))
            .chain(months.clone().map(|i| format!("PAY_AMT{}", i)))
            .collect();

        Self {
            renames: vec![ColumnRename::new("PAY_0", "PAY_1")],
            categorical,
            on_unknown: UnknownCategory::Error,
            paid_duly: months
                .map(|i| DerivedIndicator {
                    source: format!("PAY_{}", i),
                    name: format!("PAY_DULY_{}", i),
                })
                .collect(),
            paid_duly_code: -1.0,
            numeric,
            normalize: None,
            target: "default payment next month".to_string(),
            target_name: "will_default".to_string(),
        }
    }
}

fn categorical(name: &str, codes: std::ops::RangeInclusive<i64>) -> CategoricalColumn {
    CategoricalColumn {
        name: name.to_string(),
        values: codes.map(|c| c.to_string()).collect(),
    }
}

/// Applies a [`TransformConfig`] to raw tables.
#[derive(Debug, Clone)]
pub struct FeatureTransformer {
    config: TransformConfig,
    normalize: NormalizeMode,
}

impl FeatureTransformer {
    pub fn new(config: TransformConfig, normalize: NormalizeMode) -> Self {
        Self { config, normalize }
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// Lower-cased target column name in the output.
    pub fn target_column(&self) -> String {
        self.config.target_name.to_lowercase()
    }

    /// Lower-cased names of the numeric columns in the output.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.config.numeric.iter().map(|c| c.to_lowercase()).collect()
    }

    /// Output column list for a raw table with the given columns.
    pub fn output_columns(&self, raw_columns: &[String]) -> Vec<String> {
        let categorical: BTreeSet<&str> = self
            .config
            .categorical
            .columns()
            .iter()
            .map(|c| c.name.as_str())
            .collect();

        let mut out: Vec<String> = raw_columns
            .iter()
            .map(|c| {
                self.config
                    .renames
                    .iter()
                    .find(|r| r.from == *c)
                    .map_or(c, |r| &r.to)
            })
            .filter(|c| !categorical.contains(c.as_str()))
            .map(|c| {
                if *c == self.config.target {
                    self.config.target_name.clone()
                } else {
                    c.clone()
                }
            })
            .collect();
        for column in self.config.categorical.columns() {
            out.extend(column.values.iter().map(|v| indicator_name(&column.name, v)));
        }
        out.extend(self.config.paid_duly.iter().map(|d| d.name.clone()));
        out.iter().map(|c| c.to_lowercase()).collect()
    }

    /// Transform a raw table. The input is left untouched.
    pub fn transform(&self, raw: &Table) -> Result<Table> {
        let mut table = raw.clone();

        for rename in &self.config.renames {
            if !table.rename_column(&rename.from, &rename.to)? {
                debug!(column = %rename.from, "rename skipped; column absent");
            }
        }

        self.check_columns(&table)?;

        for column in self.config.categorical.columns() {
            self.one_hot(&mut table, column)?;
        }

        for derived in &self.config.paid_duly {
            let codes = numeric(&table, &derived.source)?;
            let flags = codes
                .iter()
                .map(|&c| if c == self.config.paid_duly_code { 1.0 } else { 0.0 })
                .collect();
            table.push_column(derived.name.clone(), Column::Float(flags))?;
        }

        if self.normalize == NormalizeMode::Batch {
            let scaler = ZScore::fit(&table, &self.config.numeric)?;
            scaler.apply(&mut table)?;
            debug!(columns = self.config.numeric.len(), "applied batch z-score");
        }

        table.rename_column(&self.config.target, &self.config.target_name)?;
        table.rename_all(|name| name.to_lowercase())?;

        info!(
            rows = table.len(),
            columns = table.width(),
            "feature transform complete"
        );
        Ok(table)
    }

    fn check_columns(&self, table: &Table) -> Result<()> {
        for column in self.config.categorical.columns() {
            table.column(&column.name)?;
        }
        for derived in &self.config.paid_duly {
            numeric(table, &derived.source)?;
        }
        for name in &self.config.numeric {
            numeric(table, name)?;
        }
        table.column(&self.config.target)?;
        Ok(())
    }

    fn one_hot(&self, table: &mut Table, vocab: &CategoricalColumn) -> Result<()> {
        let source = table.remove_column(&vocab.name)?;
        let mut indicators = vec![vec![0.0; source.len()]; vocab.values.len()];
        let mut unknown = 0usize;

        for row in 0..source.len() {
            let label = source.value(row).category_label();
            match vocab.values.iter().position(|v| *v == label) {
                Some(slot) => indicators[slot][row] = 1.0,
                None if self.config.on_unknown == UnknownCategory::Ignore => unknown += 1,
                None => {
                    return Err(PrepError::Schema(format!(
                        "unknown category {} in column {}",
                        label, vocab.name
                    )))
                }
            }
        }

        if unknown > 0 {
            warn!(
                column = %vocab.name,
                rows = unknown,
                "values outside the category vocabulary left unencoded"
            );
        }

        for (value, flags) in vocab.values.iter().zip(indicators) {
            table.push_column(indicator_name(&vocab.name, value), Column::Float(flags))?;
        }
        Ok(())
    }
}

fn indicator_name(column: &str, value: &str) -> String {
    format!("{}_{}", column, value)
}

fn numeric(table: &Table, name: &str) -> Result<Vec<f64>> {
    let column = table.column(name)?;
    column.as_f64().ok_or_else(|| {
        PrepError::Schema(format!(
            "column {} is {}, expected numeric",
            name,
            column.kind()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::mean_std;

    fn small_config() -> TransformConfig {
        TransformConfig {
            renames: vec![ColumnRename::new("PAY_0", "PAY_1")],
            categorical: CategoryVocabulary::new(vec![categorical("SEX", 1..=2)]),
            on_unknown: UnknownCategory::Error,
            paid_duly: vec![DerivedIndicator {
                source: "PAY_1".to_string(),
                name: "PAY_DULY_1".to_string(),
            }],
            paid_duly_code: -1.0,
            numeric: vec!["AGE".to_string()],
            normalize: None,
            target: "default payment next month".to_string(),
            target_name: "will_default".to_string(),
        }
    }

    fn raw() -> Table {
        let mut t = Table::new("ID", vec![1, 2, 3, 4]).unwrap();
        t.push_column("AGE", Column::Float(vec![24.0, 37.0, 29.0, 50.0]))
            .unwrap();
        t.push_column("SEX", Column::Float(vec![1.0, 2.0, 2.0, 1.0])).unwrap();
        t.push_column("PAY_0", Column::Float(vec![-1.0, 0.0, 2.0, -1.0]))
            .unwrap();
        t.push_column(
            "default payment next month",
            Column::Float(vec![1.0, 0.0, 0.0, 1.0]),
        )
        .unwrap();
        t
    }

    #[test]
    fn test_transform_columns_and_values() {
        let transformer = FeatureTransformer::new(small_config(), NormalizeMode::Off);
        let out = transformer.transform(&raw()).unwrap();

        assert_eq!(
            out.column_names(),
            &["age", "pay_1", "will_default", "sex_1", "sex_2", "pay_duly_1"]
        );
        assert_eq!(out.index_name(), "id");
        assert_eq!(
            out.column("sex_1").unwrap(),
            &Column::Float(vec![1.0, 0.0, 0.0, 1.0])
        );
        assert_eq!(
            out.column("sex_2").unwrap(),
            &Column::Float(vec![0.0, 1.0, 1.0, 0.0])
        );
        assert_eq!(
            out.column("pay_duly_1").unwrap(),
            &Column::Float(vec![1.0, 0.0, 0.0, 1.0])
        );
        assert_eq!(
            out.column("age").unwrap(),
            &Column::Float(vec![24.0, 37.0, 29.0, 50.0])
        );
    }

    #[test]
    fn test_output_columns_match_transform() {
        let transformer = FeatureTransformer::new(small_config(), NormalizeMode::Off);
        let raw = raw();
        let out = transformer.transform(&raw).unwrap();
        assert_eq!(transformer.output_columns(raw.column_names()), out.column_names());
    }

    #[test]
    fn test_width_independent_of_observed_values() {
        let transformer = FeatureTransformer::new(small_config(), NormalizeMode::Off);
        let only_first = raw().take_rows(&[0]);
        let all = raw();
        assert_eq!(
            transformer.transform(&only_first).unwrap().column_names(),
            transformer.transform(&all).unwrap().column_names()
        );
    }

    #[test]
    fn test_unknown_category_error_and_ignore() {
        let mut table = raw();
        *table.column_mut("SEX").unwrap() = Column::Float(vec![1.0, 2.0, 3.0, 1.0]);

        let strict = FeatureTransformer::new(small_config(), NormalizeMode::Off);
        assert!(matches!(strict.transform(&table), Err(PrepError::Schema(_))));

        let lenient = FeatureTransformer::new(
            TransformConfig {
                on_unknown: UnknownCategory::Ignore,
                ..small_config()
            },
            NormalizeMode::Off,
        );
        let out = lenient.transform(&table).unwrap();
        assert_eq!(
            out.column("sex_1").unwrap(),
            &Column::Float(vec![1.0, 0.0, 0.0, 1.0])
        );
        assert_eq!(
            out.column("sex_2").unwrap(),
            &Column::Float(vec![0.0, 1.0, 0.0, 0.0])
        );
    }

    #[test]
    fn test_missing_configured_column() {
        let mut table = raw();
        table.remove_column("AGE").unwrap();
        let transformer = FeatureTransformer::new(small_config(), NormalizeMode::Off);
        assert!(matches!(transformer.transform(&table), Err(PrepError::Schema(_))));
    }

    #[test]
    fn test_batch_normalization() {
        let transformer = FeatureTransformer::new(small_config(), NormalizeMode::Batch);
        let out = transformer.transform(&raw()).unwrap();
        let (mean, std) = mean_std(&out.column("age").unwrap().as_f64().unwrap());
        assert!(mean.abs() < 1e-9);
        assert!((std - 1.0).abs() < 1e-6);
        // indicators are not scaled
        assert_eq!(
            out.column("pay_duly_1").unwrap(),
            &Column::Float(vec![1.0, 0.0, 0.0, 1.0])
        );
    }

    #[test]
    fn test_vocabulary_scan() {
        let vocab = CategoryVocabulary::scan(&raw(), &["SEX", "PAY_0"]).unwrap();
        assert_eq!(vocab.columns()[0].values, vec!["1", "2"]);
        assert_eq!(vocab.columns()[1].values, vec!["-1", "0", "2"]);
    }

    #[test]
    fn test_default_config_column_count() {
        let transformer =
            FeatureTransformer::new(TransformConfig::default(), NormalizeMode::Off);
        let mut raw_columns: Vec<String> = vec![
            "LIMIT_BAL", "SEX", "EDUCATION", "MARRIAGE", "AGE", "PAY_0",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        raw_columns.extend((2..=6).map(|i| format!("PAY_{}", i)));
        raw_columns.extend((1..=6).map(|i| format!("BILL_AMT{}", i)));
        raw_columns.extend((1..=6).map(|i| format!("PAY_AMT{}", i)));
        raw_columns.push("default payment next month".to_string());

        let out = transformer.output_columns(&raw_columns);
        // 21 passthrough (target included) + 2 + 7 + 4 indicators + 6 paid-duly flags
        assert_eq!(out.len(), 40);
        assert!(out.contains(&"education_6".to_string()));
        assert!(out.contains(&"pay_duly_6".to_string()));
        assert!(out.contains(&"will_default".to_string()));
    }
}
