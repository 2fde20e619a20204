use anyhow::bail;
use clap::{Parser, ValueEnum};
use core::time::Duration;
use taskpipe::{DivisorBound, PipelineConfig};

/// Workload applied by every worker.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workload {
    /// Forward the jobs in `0..max` that pass trial division, and sum them.
    Primes,
    /// Double every job in `1..=max` after a fixed delay, and drain the
    /// results.
    Double,
}

/// Engine the pipeline runs on.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Runtime {
    /// One OS thread per worker.
    Threads,
    /// Tokio tasks on a multi-threaded runtime.
    Tokio,
}

/// Runtime configuration for the `taskpipe` binary.
///
/// All values are parsed from CLI arguments or environment variables (a
/// `.env` file in the working directory is loaded first).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "taskpipe",
    version,
    about = "Run a bounded worker pipeline over a range of integer jobs"
)]
pub struct CliArgs {
    /// Workload run by every worker.
    ///
    /// Environment variable: `TASKPIPE_WORKLOAD`
    #[arg(long, env = "TASKPIPE_WORKLOAD", value_enum, default_value_t = Workload::Primes)]
    pub workload: Workload,

    /// Upper end of the job range.
    ///
    /// `primes` runs over `0..max`; `double` runs over `1..=max`.
    ///
    /// Environment variable: `TASKPIPE_MAX`
    #[arg(long, env = "TASKPIPE_MAX", default_value_t = 10_000)]
    pub max: i64,

    /// Number of workers. Defaults to the number of logical CPUs.
    ///
    /// Environment variable: `TASKPIPE_WORKERS`
    #[arg(long, env = "TASKPIPE_WORKERS")]
    pub workers: Option<usize>,

    /// Capacity of the job queue, and of the result queue unless
    /// `--result-capacity` is given.
    ///
    /// Environment variable: `TASKPIPE_QUEUE_CAPACITY`
    #[arg(long, env = "TASKPIPE_QUEUE_CAPACITY", default_value_t = 100)]
    pub queue_capacity: usize,

    /// Capacity of the result queue.
    ///
    /// Environment variable: `TASKPIPE_RESULT_CAPACITY`
    #[arg(long, env = "TASKPIPE_RESULT_CAPACITY")]
    pub result_capacity: Option<usize>,

    /// Delay applied to each job by the `double` workload, in milliseconds.
    ///
    /// Environment variable: `TASKPIPE_DELAY_MS`
    #[arg(long, env = "TASKPIPE_DELAY_MS", default_value_t = 10)]
    pub delay_ms: u64,

    /// Use standard primality (`i * i <= n`) instead of the default
    /// exclusive bound, which lets squares of primes through.
    ///
    /// Environment variable: `TASKPIPE_INCLUSIVE_BOUND`
    #[arg(long, env = "TASKPIPE_INCLUSIVE_BOUND", default_value_t = false)]
    pub inclusive_bound: bool,

    /// Engine to run the pipeline on.
    ///
    /// Environment variable: `TASKPIPE_RUNTIME`
    #[arg(long, env = "TASKPIPE_RUNTIME", value_enum, default_value_t = Runtime::Threads)]
    pub runtime: Runtime,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub workload: Workload,
    pub max: i64,
    pub pipeline: PipelineConfig,
    pub delay: Duration,
    pub bound: DivisorBound,
    pub runtime: Runtime,
}

impl TryFrom<CliArgs> for RunConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.max < 0 {
            bail!("TASKPIPE_MAX must not be negative (got {})", args.max);
        }

        let workers = args.workers.unwrap_or_else(num_cpus::get);
        let pipeline = PipelineConfig::new(workers, args.queue_capacity)
            .with_result_capacity(args.result_capacity.unwrap_or(args.queue_capacity));
        pipeline.validate()?;

        let bound = if args.inclusive_bound {
            DivisorBound::Inclusive
        } else {
            DivisorBound::Exclusive
        };

        Ok(Self {
            workload: args.workload,
            max: args.max,
            pipeline,
            delay: Duration::from_millis(args.delay_ms),
            bound,
            runtime: args.runtime,
        })
    }
}
