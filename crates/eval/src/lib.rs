//! creditprep-eval - Scoring of credit-default predictions
//!
//! Computes accuracy at a 0.5 threshold and ROC-AUC for a pair of
//! prediction/ground-truth vectors, and keeps the last pair on disk so the
//! metrics can be recomputed without re-supplying predictions.

pub mod errors;
pub mod metrics;
pub mod store;

pub use errors::{EvalError, Result};
pub use metrics::{evaluate, roc_auc, Scores, THRESHOLD};
pub use store::{default_store_path, PredictionPair, PredictionStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
