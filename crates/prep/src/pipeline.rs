//! Load, transform, split, pack, with the cache consulted first.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cache::{fingerprint, run_with_cache};
use crate::config::PrepConfig;
use crate::errors::Result;
use crate::export::export_csv;
use crate::normalize::{NormalizeMode, ZScore};
use crate::pack::{pack_dataset, pack_examples};
use crate::source::{CsvSource, SourceConfig, TableSource};
use crate::split::{tag_with_plan, SplitParams, SplitPlan};
use crate::table::Table;
use crate::transform::{FeatureTransformer, TransformConfig};

/// Output shape of a pipeline run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum PipelineVariant {
    /// One example record per row, tagged with `is_train`.
    #[default]
    Examples,
    /// Dense train/test matrices with target vectors.
    Matrix,
}

impl PipelineVariant {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineVariant::Examples => "examples",
            PipelineVariant::Matrix => "matrix",
        }
    }

    pub fn default_train_fraction(&self) -> f64 {
        match self {
            PipelineVariant::Examples => 2.0 / 3.0,
            PipelineVariant::Matrix => 0.8,
        }
    }

    pub fn default_normalize(&self) -> NormalizeMode {
        match self {
            PipelineVariant::Examples => NormalizeMode::Off,
            PipelineVariant::Matrix => NormalizeMode::TrainReference,
        }
    }
}

impl fmt::Display for PipelineVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything that determines the output bytes.
#[derive(Serialize)]
struct CacheKey<'a> {
    schema_version: u32,
    variant: PipelineVariant,
    source: String,
    loader: &'a SourceConfig,
    transform: &'a TransformConfig,
    normalize: NormalizeMode,
    split: SplitParams,
}

/// Transformed (and normalized) table with its split plan.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub table: Table,
    pub plan: SplitPlan,
    /// Target column name in `table`.
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutput {
    pub bytes: Vec<u8>,
    pub cache_hit: bool,
    pub cache_path: Option<PathBuf>,
}

pub struct PrepPipeline {
    config: PrepConfig,
    source: Box<dyn TableSource>,
}

impl PrepPipeline {
    /// Pipeline reading from the configured CSV source.
    pub fn new(config: PrepConfig) -> Result<Self> {
        let source = CsvSource::new(config.source.clone());
        Self::with_source(config, source)
    }

    pub fn with_source(config: PrepConfig, source: impl TableSource + 'static) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            source: Box::new(source),
        })
    }

    pub fn config(&self) -> &PrepConfig {
        &self.config
    }

    /// Cache file for the current configuration, `None` when caching is off.
    pub fn cache_path(&self) -> Result<Option<PathBuf>> {
        let key = CacheKey {
            schema_version: creditprep_schema::SCHEMA_VERSION,
            variant: self.config.variant,
            source: self.source.describe(),
            loader: &self.config.source,
            transform: &self.config.transform,
            normalize: self.config.normalize_mode(),
            split: self.config.split_params()?,
        };
        let hash = fingerprint(&key)?;
        Ok(self.config.cache.path_for(self.config.variant.name(), &hash))
    }

    /// Return cached bytes if present, otherwise compute and cache them.
    pub fn run(&self) -> Result<PipelineOutput> {
        let cache_path = self.cache_path()?;
        info!(
            "Running {} pipeline (cache: {})",
            self.config.variant,
            cache_path
                .as_ref()
                .map_or_else(|| "off".to_string(), |p| p.display().to_string())
        );
        let cached = run_with_cache(cache_path.as_deref(), || self.compute())?;
        Ok(PipelineOutput {
            bytes: cached.bytes,
            cache_hit: cached.hit,
            cache_path,
        })
    }

    /// Run every stage without touching the cache.
    pub fn compute(&self) -> Result<Vec<u8>> {
        let prepared = self.prepare()?;
        let bytes = match self.config.variant {
            PipelineVariant::Examples => {
                pack_examples(&tag_with_plan(&prepared.table, &prepared.plan)?)?
            }
            PipelineVariant::Matrix => {
                pack_dataset(&prepared.plan.materialize(&prepared.table, &prepared.target)?)?
            }
        };
        if let Some(path) = &self.config.output.prepped_csv {
            export_csv(&prepared.table, path)?;
        }
        info!("Packed {} bytes", bytes.len());
        Ok(bytes)
    }

    /// Load, transform, plan the split and apply train-referenced scaling.
    pub fn prepare(&self) -> Result<Prepared> {
        let raw = self.source.load()?;
        let mode = self.config.normalize_mode();
        let transformer = FeatureTransformer::new(self.config.transform.clone(), mode);
        let mut table = transformer.transform(&raw)?;

        let plan = SplitPlan::new(table.len(), &self.config.split_params()?)?;
        info!(
            "Split {} rows: {} train / {} test",
            table.len(),
            plan.train_rows().len(),
            plan.test_rows().len()
        );

        if mode == NormalizeMode::TrainReference && plan.train_rows().is_empty() {
            warn!("Train partition is empty, leaving numeric columns unscaled");
        } else if mode == NormalizeMode::TrainReference {
            let scaler =
                ZScore::fit_rows(&table, &transformer.numeric_columns(), plan.train_rows())?;
            scaler.apply(&mut table)?;
            info!(
                "Normalized {} columns on {} train rows",
                scaler.stats().len(),
                plan.train_rows().len()
            );
        }

        Ok(Prepared {
            table,
            plan,
            target: transformer.target_column(),
        })
    }
}
