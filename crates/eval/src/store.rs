//! Persisted prediction/ground-truth pair
//!
//! The last pair scored from a pipe is kept on disk so an interactive run can
//! replay the metrics without new input.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::errors::{EvalError, Result};

/// Predictions with their ground truth, equal length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionPair {
    pub predictions: Vec<f64>,
    pub ground_truth: Vec<f64>,
}

/// Accepted JSON layouts for piped input.
#[derive(Deserialize)]
#[serde(untagged)]
enum PairInput {
    Tuple(Vec<f64>, Vec<f64>),
    Object {
        predictions: Vec<f64>,
        ground_truth: Vec<f64>,
    },
}

impl PredictionPair {
    pub fn new(predictions: Vec<f64>, ground_truth: Vec<f64>) -> Result<Self> {
        if predictions.len() != ground_truth.len() {
            return Err(EvalError::Shape(format!(
                "{} predictions, {} ground-truth labels",
                predictions.len(),
                ground_truth.len()
            )));
        }
        Ok(Self {
            predictions,
            ground_truth,
        })
    }

    /// Parse `[predictions, ground_truth]` or
    /// `{"predictions": [...], "ground_truth": [...]}`.
    pub fn from_json(text: &str) -> Result<Self> {
        match serde_json::from_str::<PairInput>(text)? {
            PairInput::Tuple(predictions, ground_truth)
            | PairInput::Object {
                predictions,
                ground_truth,
            } => Self::new(predictions, ground_truth),
        }
    }
}

/// Default location of the stored pair.
pub fn default_store_path() -> PathBuf {
    std::env::temp_dir().join("creditprep").join("eval.bin")
}

/// Bincode file holding the last [`PredictionPair`].
#[derive(Debug, Clone)]
pub struct PredictionStore {
    path: PathBuf,
}

impl PredictionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn load(&self) -> Result<PredictionPair> {
        debug!("Loading prediction pair from {}", self.path.display());
        let bytes = fs::read(&self.path)?;
        let pair: PredictionPair = bincode::deserialize(&bytes)?;
        PredictionPair::new(pair.predictions, pair.ground_truth)
    }

    /// Replace the stored pair atomically.
    pub fn save(&self, pair: &PredictionPair) -> Result<()> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let bytes = bincode::serialize(pair)?;
        let mut temp = NamedTempFile::new_in(&parent)?;
        temp.write_all(&bytes)?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| e.error)?;

        info!(
            "Stored {} predictions at {}",
            pair.predictions.len(),
            self.path.display()
        );
        Ok(())
    }
}

impl Default for PredictionStore {
    fn default() -> Self {
        Self::new(default_store_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tuple_and_object() {
        let tuple = PredictionPair::from_json("[[0.9, 0.2], [1, 0]]").unwrap();
        let object =
            PredictionPair::from_json(r#"{"predictions": [0.9, 0.2], "ground_truth": [1, 0]}"#)
                .unwrap();
        assert_eq!(tuple, object);
        assert_eq!(tuple.ground_truth, vec![1.0, 0.0]);
    }

    #[test]
    fn test_parse_rejects_mismatch_and_garbage() {
        assert!(matches!(
            PredictionPair::from_json("[[0.9, 0.2], [1]]"),
            Err(EvalError::Shape(_))
        ));
        assert!(matches!(
            PredictionPair::from_json("not json"),
            Err(EvalError::Serialization(_))
        ));
    }

    #[test]
    fn test_save_then_load() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = PredictionStore::new(dir.path().join("scores").join("eval.bin"));
        assert!(!store.exists());

        let pair = PredictionPair::new(vec![0.9, 0.2, 0.6], vec![1.0, 0.0, 1.0])?;
        store.save(&pair)?;
        assert!(store.exists());
        assert_eq!(store.load()?, pair);

        let replaced = PredictionPair::new(vec![0.1], vec![0.0])?;
        store.save(&replaced)?;
        assert_eq!(store.load()?, replaced);
        Ok(())
    }

    #[test]
    fn test_missing_store_is_io_error() {
        let store = PredictionStore::new("/no/such/dir/eval.bin");
        assert!(matches!(store.load(), Err(EvalError::Io(_))));
    }

    #[test]
    fn test_corrupt_store_is_serialization_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("eval.bin");
        fs::write(&path, [1u8, 2, 3])?;
        assert!(matches!(
            PredictionStore::new(path).load(),
            Err(EvalError::Serialization(_))
        ));
        Ok(())
    }
}
