//! creditprep-eval CLI
//!
//! Piped: read `[predictions, ground_truth]` JSON from stdin, store it and
//! print the metrics. Interactive: replay the stored pair.

use anyhow::{bail, Context, Result};
use clap::Parser;
use creditprep_eval::{evaluate, PredictionPair, PredictionStore};
use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "creditprep-eval")]
#[command(author = "creditprep Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Accuracy and ROC-AUC for credit-default predictions", long_about = None)]
struct Args {
    /// Stored prediction pair [default: <tmp>/creditprep/eval.bin]
    #[arg(long)]
    store: Option<PathBuf>,

    /// Print the scores as JSON
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if args.verbose { "debug" } else { "warn" }));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let store = args
        .store
        .map(PredictionStore::new)
        .unwrap_or_default();

    let stdin = std::io::stdin();
    let piped = !stdin.is_terminal();
    let pair = if !piped {
        if !store.exists() {
            bail!(
                "no stored predictions at {}; pipe [predictions, ground_truth] JSON first",
                store.path().display()
            );
        }
        info!("Replaying stored predictions from {}", store.path().display());
        store.load().context("Failed to load stored predictions")?
    } else {
        let mut text = String::new();
        stdin
            .lock()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        PredictionPair::from_json(&text).context("Failed to parse predictions")?
    };

    let scores = evaluate(&pair.predictions, &pair.ground_truth)
        .context("Failed to score predictions")?;
    if piped {
        store.save(&pair).context("Failed to store predictions")?;
    }

    if args.json {
        println!("{}", serde_json::to_string(&scores)?);
    } else {
        println!("accuracy: {:.6}", scores.accuracy);
        match scores.auc {
            Some(auc) => println!("auc: {:.6}", auc),
            None => println!("auc: undefined (single class)"),
        }
    }

    Ok(())
}
