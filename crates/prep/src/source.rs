//! Raw table loading
//!
//! Reads a delimited text table, skipping any banner lines above the header,
//! and infers each column's domain: a column is numeric when every cell
//! parses as a number, otherwise it is kept as strings.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::errors::{PrepError, Result};
use crate::table::{Column, Table};

/// Where and how to read the raw table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Local path, or `http(s)://` URL with the `remote_loading` feature.
    pub location: String,
    /// Number of lines above the header row.
    pub header_row: usize,
    /// Column holding the unique row identifier.
    pub index_column: String,
    pub delimiter: char,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            location: "data/default_of_credit_card_clients.csv".to_string(),
            header_row: 1,
            index_column: "ID".to_string(),
            delimiter: ',',
        }
    }
}

/// Anything that can produce the raw table.
pub trait TableSource {
    /// Identifier used for logging and cache keys.
    fn describe(&self) -> String;

    fn load(&self) -> Result<Table>;
}

/// Table already held in memory.
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    table: Table,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, table: Table) -> Self {
        Self {
            name: name.into(),
            table,
        }
    }
}

impl TableSource for MemorySource {
    fn describe(&self) -> String {
        format!("memory:{}", self.name)
    }

    fn load(&self) -> Result<Table> {
        Ok(self.table.clone())
    }
}

/// Delimited text file or URL.
#[derive(Debug, Clone)]
pub struct CsvSource {
    config: SourceConfig,
}

impl CsvSource {
    pub fn new(config: SourceConfig) -> Self {
        Self { config }
    }

    fn read_text(&self) -> Result<String> {
        let location = self.config.location.as_str();
        if is_remote(location) {
            return fetch_remote(location);
        }
        std::fs::read_to_string(Path::new(location))
            .map_err(|e| PrepError::Source(format!("failed to read {}: {}", location, e)))
    }

    /// Parse delimited text into a table.
    pub fn parse(text: &str, config: &SourceConfig) -> Result<Table> {
        if !config.delimiter.is_ascii() {
            return Err(PrepError::InvalidParameter(format!(
                "delimiter {:?} is not ASCII",
                config.delimiter
            )));
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(config.delimiter as u8)
            .from_reader(text.as_bytes());

        let mut records = reader.records().skip(config.header_row);
        let header: Vec<String> = match records.next() {
            Some(record) => record?.iter().map(|h| h.trim().to_string()).collect(),
            None => {
                return Err(PrepError::Source(format!(
                    "no header found after {} leading lines",
                    config.header_row
                )))
            }
        };

        let index_pos = header
            .iter()
            .position(|h| *h == config.index_column)
            .ok_or_else(|| {
                PrepError::Source(format!("index column {} not found", config.index_column))
            })?;

        let mut cells: Vec<Vec<String>> = vec![Vec::new(); header.len()];
        for (line, record) in records.enumerate() {
            let record = record?;
            if record.len() == 1 && record.get(0).is_some_and(|c| c.trim().is_empty()) {
                continue;
            }
            if record.len() != header.len() {
                return Err(PrepError::Source(format!(
                    "data row {}: expected {} fields, got {}",
                    line + 1,
                    header.len(),
                    record.len()
                )));
            }
            for (col, value) in record.iter().enumerate() {
                cells[col].push(value.trim().to_string());
            }
        }

        let index = cells[index_pos]
            .iter()
            .enumerate()
            .map(|(row, raw)| {
                raw.parse::<i64>().map_err(|_| {
                    PrepError::Source(format!(
                        "data row {}: invalid identifier {:?}",
                        row + 1,
                        raw
                    ))
                })
            })
            .collect::<Result<Vec<i64>>>()?;

        let mut table = Table::new(config.index_column.clone(), index)?;
        for (pos, (name, raw)) in header.into_iter().zip(cells).enumerate() {
            if pos == index_pos {
                continue;
            }
            let column = infer_column(raw);
            debug!(column = %name, kind = column.kind(), "inferred column domain");
            table.push_column(name, column)?;
        }

        Ok(table)
    }
}

impl TableSource for CsvSource {
    fn describe(&self) -> String {
        self.config.location.clone()
    }

    fn load(&self) -> Result<Table> {
        info!("Loading raw table from: {}", self.config.location);
        let text = self.read_text()?;
        let table = Self::parse(&text, &self.config)?;
        info!(
            "Loaded {} rows with {} columns",
            table.len(),
            table.width()
        );
        Ok(table)
    }
}

fn infer_column(raw: Vec<String>) -> Column {
    let parsed: Option<Vec<f64>> = raw.iter().map(|v| v.parse::<f64>().ok()).collect();
    match parsed {
        Some(values) => Column::Float(values),
        None => Column::Text(raw),
    }
}

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

#[cfg(feature = "remote_loading")]
fn fetch_remote(url: &str) -> Result<String> {
    info!("Fetching remote table: {}", url);
    reqwest::blocking::get(url)
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.text())
        .map_err(|e| PrepError::Source(format!("failed to fetch {}: {}", url, e)))
}

#[cfg(not(feature = "remote_loading"))]
fn fetch_remote(url: &str) -> Result<String> {
    Err(PrepError::Source(format!(
        "{} is remote; rebuild with the remote_loading feature",
        url
    )))
}
