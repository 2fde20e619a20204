#![doc = include_str!("../README.md")]

mod config;
mod telemetry;

use clap::Parser;
use config::{CliArgs, RunConfig, Runtime, Workload};
use core::fmt;
use taskpipe::{Discard, Doubler, Pipeline, PipelineStats, PrimeFilter, Sum};
use telemetry::init_tracing;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// The value printed once a run completes.
enum Total {
    /// Sum of every forwarded result.
    Sum(i64),
    /// Number of results drained by the aggregator.
    Drained(u64),
}

impl fmt::Display for Total {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sum(sum) => write!(f, "{sum}"),
            Self::Drained(count) => write!(f, "{count}"),
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = RunConfig::try_from(args)?;

    init_tracing();
    log_startup_info(&config);

    let pipeline = Pipeline::new(config.pipeline)?;
    let total = match config.runtime {
        Runtime::Threads => run_threads(&pipeline, &config)?,
        Runtime::Tokio => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(run_tokio(&pipeline, &config))?
        }
    };

    println!("{total}");
    Ok(())
}

fn run_threads(pipeline: &Pipeline, config: &RunConfig) -> anyhow::Result<Total> {
    let total = match config.workload {
        Workload::Primes => {
            let report = pipeline.run(
                0..config.max,
                PrimeFilter::with_bound(config.bound),
                Sum::<i64>::default(),
            )?;
            log_stats(&report.stats);
            Total::Sum(report.output)
        }
        Workload::Double => {
            let report = pipeline.run(1..=config.max, Doubler::new(config.delay), Discard::default())?;
            log_stats(&report.stats);
            Total::Drained(report.output)
        }
    };
    Ok(total)
}

async fn run_tokio(pipeline: &Pipeline, config: &RunConfig) -> anyhow::Result<Total> {
    let total = match config.workload {
        Workload::Primes => {
            let report = pipeline
                .run_async(
                    0..config.max,
                    PrimeFilter::with_bound(config.bound),
                    Sum::<i64>::default(),
                )
                .await?;
            log_stats(&report.stats);
            Total::Sum(report.output)
        }
        Workload::Double => {
            let report = pipeline
                .run_async(1..=config.max, Doubler::new(config.delay), Discard::default())
                .await?;
            log_stats(&report.stats);
            Total::Drained(report.output)
        }
    };
    Ok(total)
}

fn log_startup_info(config: &RunConfig) {
    if cfg!(debug_assertions) {
        tracing::info!("Starting taskpipe with full config: {:#?}", config);
    } else {
        tracing::info!(
            "Starting {:?} workload up to {} with {} workers on {:?}",
            config.workload,
            config.max,
            config.pipeline.workers,
            config.runtime
        );
    }
}

fn log_stats(stats: &PipelineStats) {
    tracing::info!(
        submitted = stats.submitted,
        processed = stats.processed,
        forwarded = stats.forwarded,
        dropped = stats.dropped,
        failed = stats.failed,
        "Run complete"
    );
}
