//! Layered pipeline configuration
//!
//! Built-in defaults, then an optional TOML file, then `CREDITPREP_*`
//! environment variables (`__` separates nested keys, e.g.
//! `CREDITPREP_SPLIT__SEED=7`). Command-line overrides are applied by the
//! binary on top of the loaded value.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::CacheConfig;
use crate::errors::{PrepError, Result};
use crate::normalize::NormalizeMode;
use crate::pipeline::PipelineVariant;
use crate::source::SourceConfig;
use crate::split::{SplitConfig, SplitParams};
use crate::transform::TransformConfig;

pub const ENV_PREFIX: &str = "CREDITPREP";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Also write the transformed table here on a cache miss.
    pub prepped_csv: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepConfig {
    pub variant: PipelineVariant,
    pub source: SourceConfig,
    pub transform: TransformConfig,
    pub split: SplitConfig,
    pub cache: CacheConfig,
    pub output: OutputConfig,
}

impl PrepConfig {
    /// Load defaults, the optional file at `path` and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_layers(path, None)
    }

    /// `env` replaces the process environment when given.
    fn load_layers(path: Option<&Path>, env: Option<config::Map<String, String>>) -> Result<Self> {
        let defaults = Config::try_from(&PrepConfig::default()).map_err(invalid)?;
        let mut builder = Config::builder().add_source(defaults);

        if let Some(path) = path {
            if !path.exists() {
                return Err(PrepError::InvalidParameter(format!(
                    "configuration file {} not found",
                    path.display()
                )));
            }
            debug!("Reading configuration from {}", path.display());
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let config: PrepConfig = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(invalid)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(fraction) = self.split.train_fraction {
            if !(0.0..=1.0).contains(&fraction) {
                return Err(PrepError::InvalidParameter(format!(
                    "split.train_fraction {} outside [0, 1]",
                    fraction
                )));
            }
        }
        if self.source.index_column.is_empty() {
            return Err(PrepError::InvalidParameter(
                "source.index_column is empty".to_string(),
            ));
        }
        if self.transform.target.is_empty() || self.transform.target_name.is_empty() {
            return Err(PrepError::InvalidParameter(
                "transform.target and transform.target_name must be set".to_string(),
            ));
        }
        Ok(())
    }

    /// Train fraction, falling back to the variant default.
    pub fn train_fraction(&self) -> f64 {
        self.split
            .train_fraction
            .unwrap_or_else(|| self.variant.default_train_fraction())
    }

    /// Normalization mode, falling back to the variant default.
    pub fn normalize_mode(&self) -> NormalizeMode {
        self.transform
            .normalize
            .unwrap_or_else(|| self.variant.default_normalize())
    }

    pub fn split_params(&self) -> Result<SplitParams> {
        SplitParams::new(
            self.split.seed,
            self.train_fraction(),
            self.split.max_samples,
        )
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| PrepError::Serialization(format!("configuration: {}", e)))
    }
}

fn invalid(err: config::ConfigError) -> PrepError {
    PrepError::InvalidParameter(format!("configuration: {}", err))
}
