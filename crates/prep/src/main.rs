//! creditprep CLI
//!
//! Runs the preparation pipeline and writes the serialized record batch to
//! stdout when stdout is piped. Logs go to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use creditprep::{CacheMode, NormalizeMode, PipelineVariant, PrepConfig, PrepPipeline};
use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "creditprep")]
#[command(author = "creditprep Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Deterministic dataset preparation for credit-default models", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Raw table path (or http(s) URL with the remote_loading feature)
    #[arg(long)]
    source: Option<String>,

    /// Lines above the header row
    #[arg(long)]
    header_row: Option<usize>,

    /// Output shape
    #[arg(long, value_enum)]
    variant: Option<PipelineVariant>,

    /// Random seed for the train/test permutation [default: 42]
    #[arg(long)]
    seed: Option<u64>,

    /// Train fraction [default: 2/3 for examples, 0.8 for matrix]
    #[arg(long)]
    train_frac: Option<f64>,

    /// Keep at most this many rows per partition
    #[arg(long)]
    max_samples: Option<usize>,

    /// Normalization of numeric columns [default: off for examples, train for matrix]
    #[arg(long, value_enum)]
    normalize: Option<NormalizeMode>,

    /// Cache directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Cache keying
    #[arg(long, value_enum)]
    cache_mode: Option<CacheMode>,

    /// Also write the transformed table as CSV
    #[arg(long)]
    prepped_csv: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn apply(&self, config: &mut PrepConfig) {
        if let Some(source) = &self.source {
            config.source.location = source.clone();
        }
        if let Some(header_row) = self.header_row {
            config.source.header_row = header_row;
        }
        if let Some(variant) = self.variant {
            config.variant = variant;
        }
        if let Some(seed) = self.seed {
            config.split.seed = seed;
        }
        if let Some(fraction) = self.train_frac {
            config.split.train_fraction = Some(fraction);
        }
        if let Some(max) = self.max_samples {
            config.split.max_samples = Some(max);
        }
        if let Some(mode) = self.normalize {
            config.transform.normalize = Some(mode);
        }
        if let Some(dir) = &self.cache_dir {
            config.cache.dir = dir.clone();
        }
        if let Some(mode) = self.cache_mode {
            config.cache.mode = mode;
        }
        if let Some(path) = &self.prepped_csv {
            config.output.prepped_csv = Some(path.clone());
        }
    }
}

fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    let mut config = PrepConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    if args.print_config {
        print!("{}", config.to_toml().context("Failed to render configuration")?);
        return Ok(());
    }

    info!("creditprep v{}", creditprep::VERSION);
    info!("  Variant: {}", config.variant);
    info!("  Source: {}", config.source.location);
    info!("  Seed: {}", config.split.seed);
    info!("  Train fraction: {:.4}", config.train_fraction());
    info!("  Normalize: {:?}", config.normalize_mode());

    let pipeline = PrepPipeline::new(config).context("Failed to build pipeline")?;
    let output = pipeline.run().context("Pipeline run failed")?;

    info!(
        "{} {} bytes",
        if output.cache_hit { "Replayed" } else { "Produced" },
        output.bytes.len()
    );

    let mut stdout = std::io::stdout().lock();
    if stdout.is_terminal() {
        info!("stdout is a terminal; not writing record bytes");
        return Ok(());
    }
    stdout
        .write_all(&output.bytes)
        .context("Failed to write records to stdout")?;
    stdout.flush().context("Failed to flush stdout")?;

    Ok(())
}
