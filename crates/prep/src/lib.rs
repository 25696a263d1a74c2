//! creditprep - Deterministic dataset preparation for credit-default models
//!
//! Turns the raw client table into a serialized record batch:
//! load, transform, split under a fixed seed, pack, and cache the bytes so
//! repeated runs are cheap. The same seed and parameters always produce the
//! same bytes.

pub mod cache;
pub mod config;
pub mod errors;
pub mod export;
pub mod normalize;
pub mod pack;
pub mod pipeline;
pub mod source;
pub mod split;
pub mod table;
pub mod transform;

pub use cache::{run_with_cache, CacheConfig, CacheMode, Cached};
pub use config::{OutputConfig, PrepConfig};
pub use errors::{PrepError, Result};
pub use normalize::{NormalizeMode, ZScore};
pub use pack::{pack_dataset, pack_examples, unpack_dataset, unpack_examples};
pub use pipeline::{PipelineOutput, PipelineVariant, PrepPipeline, Prepared};
pub use source::{CsvSource, MemorySource, SourceConfig, TableSource};
pub use split::{split, tag_rows, SplitConfig, SplitData, SplitParams, SplitPlan};
pub use table::{Column, Table, Value};
pub use transform::{CategoryVocabulary, FeatureTransformer, TransformConfig, UnknownCategory};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
