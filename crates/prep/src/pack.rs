//! Record packing
//!
//! Row-record mode turns every row into an [`Example`] keyed by lower-cased
//! column name; matrix mode wraps the split matrices into a [`Dataset`].
//! Both encode with the schema crate's binary format.

use std::collections::BTreeMap;

use creditprep_schema::{
    feature, Dataset, Example, ExampleBuilder, Examples, Feature, Matrix, Record,
};
use tracing::debug;

use crate::errors::{PrepError, Result};
use crate::split::{DenseMatrix, SplitData};
use crate::table::{Column, Table, Value};

/// Index name given to tables rebuilt by [`unpack_examples`].
pub const UNPACKED_INDEX: &str = "row";

/// Serialize every row of `table` as an example record.
pub fn pack_examples(table: &Table) -> Result<Vec<u8>> {
    let names: Vec<String> = table
        .column_names()
        .iter()
        .map(|n| n.to_lowercase())
        .collect();

    let mut examples = Vec::with_capacity(table.len());
    for row in 0..table.len() {
        let mut builder = ExampleBuilder::new();
        for ((_, column), name) in table.columns().zip(&names) {
            builder.insert(name.as_str(), to_feature(name, column.value(row))?);
        }
        if builder.len() != names.len() {
            return Err(PrepError::Schema(
                "column names collide once lower-cased".to_string(),
            ));
        }
        examples.push(builder.build());
    }

    let batch: Examples = examples.into_iter().collect();
    let bytes = batch.to_bytes();
    debug!(rows = table.len(), bytes = bytes.len(), "packed examples");
    Ok(bytes)
}

/// Numbers are narrowed to `f32`. A finite value past `f32::MAX` is an error;
/// magnitudes below the smallest `f32` round to zero like any other
/// precision loss, and NaN passes through.
fn to_feature(name: &str, value: Value<'_>) -> Result<Feature> {
    match value {
        Value::Text(s) => Ok(Feature::bytes(s.as_bytes())),
        Value::Bool(b) => Ok(Feature::float(if b { 1.0 } else { 0.0 })),
        Value::Float(v) => {
            let narrowed = v as f32;
            if v.is_finite() && !narrowed.is_finite() {
                return Err(PrepError::Serialization(format!(
                    "{}: value {} does not fit a float feature",
                    name, v
                )));
            }
            Ok(Feature::float(narrowed))
        }
    }
}

/// Serialize split matrices and targets as a dataset record.
pub fn pack_dataset(data: &SplitData) -> Result<Vec<u8>> {
    let dataset = Dataset::new(
        to_matrix(&data.train_inputs)?,
        data.train_targets.clone(),
        to_matrix(&data.test_inputs)?,
        data.test_targets.clone(),
    )?;
    let bytes = dataset.to_bytes();
    debug!(
        train = data.train_targets.len(),
        test = data.test_targets.len(),
        bytes = bytes.len(),
        "packed dataset"
    );
    Ok(bytes)
}

fn to_matrix(m: &DenseMatrix) -> Result<Matrix> {
    Ok(Matrix::from_row_major(m.rows, m.cols, m.values.clone())?)
}

/// Decode an example batch back into a table.
///
/// Columns come back in name order; identifiers are `0..n` since they are not
/// part of the record. A column is text when every row holds bytes and
/// numeric when every row holds floats.
pub fn unpack_examples(bytes: &[u8]) -> Result<Table> {
    let batch = Examples::from_bytes(bytes)?;
    let rows = batch.examples.len();

    let mut columns: BTreeMap<String, Column> = BTreeMap::new();
    if let Some(first) = batch.examples.first() {
        for (name, first_feature) in features_of(first) {
            let column = match first_feature.kind {
                Some(feature::Kind::BytesList(_)) => Column::Text(Vec::with_capacity(rows)),
                _ => Column::Float(Vec::with_capacity(rows)),
            };
            columns.insert(name.clone(), column);
        }
    }

    for (row, example) in batch.examples.iter().enumerate() {
        let features = features_of(example);
        if features.len() != columns.len() {
            return Err(PrepError::Serialization(format!(
                "example {} has {} features, expected {}",
                row,
                features.len(),
                columns.len()
            )));
        }
        for (name, column) in columns.iter_mut() {
            let feature = features.get(name).ok_or_else(|| {
                PrepError::Serialization(format!("example {} lacks feature {}", row, name))
            })?;
            push_feature(column, name, feature)?;
        }
    }

    let mut table = Table::with_sequential_index(UNPACKED_INDEX, rows);
    for (name, column) in columns {
        table.push_column(name, column)?;
    }
    Ok(table)
}

fn features_of(example: &Example) -> &BTreeMap<String, Feature> {
    static EMPTY: BTreeMap<String, Feature> = BTreeMap::new();
    example
        .features
        .as_ref()
        .map(|f| &f.feature)
        .unwrap_or(&EMPTY)
}

fn push_feature(column: &mut Column, name: &str, feature: &Feature) -> Result<()> {
    match column {
        Column::Text(values) => {
            let raw = feature.as_bytes().ok_or_else(|| mixed(name))?;
            let text = std::str::from_utf8(raw).map_err(|e| {
                PrepError::Serialization(format!("{}: invalid utf-8: {}", name, e))
            })?;
            values.push(text.to_string());
        }
        Column::Float(values) => {
            let v = feature.as_float().ok_or_else(|| mixed(name))?;
            values.push(f64::from(v));
        }
        Column::Bool(_) => return Err(mixed(name)),
    }
    Ok(())
}

fn mixed(name: &str) -> PrepError {
    PrepError::Serialization(format!("feature {} changes kind between examples", name))
}

/// Decode a dataset record, re-checking matrix shapes and target lengths.
pub fn unpack_dataset(bytes: &[u8]) -> Result<Dataset> {
    let decoded = Dataset::from_bytes(bytes)?;
    let Dataset {
        train_inputs,
        train_targets,
        test_inputs,
        test_targets,
    } = decoded;
    let missing = |which: &str| PrepError::Serialization(format!("dataset lacks {} inputs", which));
    Ok(Dataset::new(
        train_inputs.ok_or_else(|| missing("train"))?,
        train_targets,
        test_inputs.ok_or_else(|| missing("test"))?,
        test_targets,
    )?)
}
