//! In-memory tabular data
//!
//! A [`Table`] is a set of equally long, named, typed columns keyed by a
//! unique integer row identifier. Column order is insertion order and is
//! preserved by every operation.

use std::collections::HashSet;
use std::fmt;

use crate::errors::{PrepError, Result};

/// Column storage; one variant per value domain.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Float(Vec<f64>),
    Bool(Vec<bool>),
    Text(Vec<String>),
}

/// Borrowed cell value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Float(f64),
    Bool(bool),
    Text(&'a str),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Float(v) => v.len(),
            Column::Bool(v) => v.len(),
            Column::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Column::Float(_) => "float",
            Column::Bool(_) => "bool",
            Column::Text(_) => "string",
        }
    }

    /// Cell at `row`. Panics if out of bounds.
    pub fn value(&self, row: usize) -> Value<'_> {
        match self {
            Column::Float(v) => Value::Float(v[row]),
            Column::Bool(v) => Value::Bool(v[row]),
            Column::Text(v) => Value::Text(&v[row]),
        }
    }

    /// Numeric view of the column (booleans as 0/1), `None` for strings.
    pub fn as_f64(&self) -> Option<Vec<f64>> {
        match self {
            Column::Float(v) => Some(v.clone()),
            Column::Bool(v) => Some(v.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect()),
            Column::Text(_) => None,
        }
    }

    /// Gather rows by position.
    pub fn take(&self, rows: &[usize]) -> Column {
        match self {
            Column::Float(v) => Column::Float(rows.iter().map(|&r| v[r]).collect()),
            Column::Bool(v) => Column::Bool(rows.iter().map(|&r| v[r]).collect()),
            Column::Text(v) => Column::Text(rows.iter().map(|&r| v[r].clone()).collect()),
        }
    }
}

impl Value<'_> {
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Float(v) => Some(v),
            Value::Bool(b) => Some(if b { 1.0 } else { 0.0 }),
            Value::Text(_) => None,
        }
    }

    /// Label used for category names: integral floats print without a
    /// fractional part so that code `1.0` becomes `1`.
    pub fn category_label(&self) -> String {
        match *self {
            Value::Float(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{}", v as i64),
            Value::Float(v) => v.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Text(s) => s.to_string(),
        }
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Float(v) => write!(f, "{}", v),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// Rectangular table indexed by a unique row identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    index_name: String,
    index: Vec<i64>,
    names: Vec<String>,
    columns: Vec<Column>,
}

impl Table {
    /// Create an empty-column table over the given identifiers.
    pub fn new(index_name: impl Into<String>, index: Vec<i64>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(index.len());
        for id in &index {
            if !seen.insert(*id) {
                return Err(PrepError::Source(format!("duplicate row identifier {}", id)));
            }
        }
        Ok(Self {
            index_name: index_name.into(),
            index,
            names: Vec::new(),
            columns: Vec::new(),
        })
    }

    /// Table with identifiers `0..rows`.
    pub fn with_sequential_index(index_name: impl Into<String>, rows: usize) -> Self {
        Self {
            index_name: index_name.into(),
            index: (0..rows as i64).collect(),
            names: Vec::new(),
            columns: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of columns, excluding the index.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn index(&self) -> &[i64] {
        &self.index
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.position(name)
            .map(|i| &self.columns[i])
            .ok_or_else(|| missing_column(name))
    }

    pub fn column_mut(&mut self, name: &str) -> Result<&mut Column> {
        match self.position(name) {
            Some(i) => Ok(&mut self.columns[i]),
            None => Err(missing_column(name)),
        }
    }

    /// Iterate `(name, column)` pairs in order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names.iter().map(String::as_str).zip(self.columns.iter())
    }

    /// Append a column at the end.
    pub fn push_column(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        let name = name.into();
        if column.len() != self.len() {
            return Err(PrepError::Shape(format!(
                "column {} has {} rows, table has {}",
                name,
                column.len(),
                self.len()
            )));
        }
        if self.has_column(&name) {
            return Err(PrepError::Schema(format!("duplicate column {}", name)));
        }
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    /// Remove and return a column.
    pub fn remove_column(&mut self, name: &str) -> Result<Column> {
        let i = self.position(name).ok_or_else(|| missing_column(name))?;
        self.names.remove(i);
        Ok(self.columns.remove(i))
    }

    /// Rename a column in place. Returns `false` if `from` is absent.
    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<bool> {
        let Some(i) = self.position(from) else {
            return Ok(false);
        };
        if from != to && self.has_column(to) {
            return Err(PrepError::Schema(format!(
                "cannot rename {} to {}: column exists",
                from, to
            )));
        }
        self.names[i] = to.to_string();
        Ok(true)
    }

    /// Apply `f` to every column name (and the index name).
    pub fn rename_all(&mut self, f: impl Fn(&str) -> String) -> Result<()> {
        let renamed: Vec<String> = self.names.iter().map(|n| f(n.as_str())).collect();
        let mut seen = HashSet::with_capacity(renamed.len());
        for name in &renamed {
            if !seen.insert(name.as_str()) {
                return Err(PrepError::Schema(format!(
                    "renaming produces duplicate column {}",
                    name
                )));
            }
        }
        self.names = renamed;
        self.index_name = f(self.index_name.as_str());
        Ok(())
    }

    /// New table holding the given row positions, in the given order.
    pub fn take_rows(&self, rows: &[usize]) -> Table {
        Table {
            index_name: self.index_name.clone(),
            index: rows.iter().map(|&r| self.index[r]).collect(),
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
        }
    }
}

fn missing_column(name: &str) -> PrepError {
    PrepError::Schema(format!("missing column {}", name))
}
