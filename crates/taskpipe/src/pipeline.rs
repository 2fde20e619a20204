//! Thread-based pipeline engine.
//!
//! A run wires up the following stages, each on its own thread except the
//! aggregator, which runs on the caller's thread:
//!
//! ```text
//! source ──▶ job queue ──▶ worker × W ──▶ result queue ──▶ aggregator
//!                              │                ▲
//!                              └── tracker ──▶ watcher (closes once)
//! ```
//!
//! - The source owns the only job queue sender and closes the queue by
//!   dropping it once the task iterator is exhausted.
//! - Workers share the job queue receiver. Each task is delivered to exactly
//!   one worker.
//! - The watcher owns the original result queue sender. It drops it only after
//!   the [`CompletionTracker`] reports that every worker has exited, so the
//!   aggregator observes a closed result queue exactly once, after the last
//!   result.

use crate::{
    Aggregator, CompletionTracker, Error, PipelineConfig, PipelineReport, Result, TaskProcessor,
    source::feed_jobs, stats::Counters, worker::worker_loop,
};
use crossbeam_channel::bounded;
use std::thread;

/// A validated pipeline configuration that can be run any number of times.
///
/// Runs are independent: each creates its own queues, tracker and counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Validates `config` and returns a runnable pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the worker count or a queue
    /// capacity is zero. Nothing is spawned in that case.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs `tasks` through `processor` on the worker pool and reduces every
    /// forwarded result with `aggregator`.
    ///
    /// Blocks until the aggregator has drained the result queue and every
    /// pipeline thread has been joined.
    ///
    /// # Errors
    ///
    /// - [`Error::Spawn`] if a pipeline thread could not be started. Threads
    ///   already started are wound down before returning.
    /// - [`Error::WorkerPanicked`] if any worker panicked. The remaining
    ///   workers still drain the job queue.
    /// - [`Error::SourcePanicked`] if the task iterator panicked.
    ///
    /// # Panics
    ///
    /// A panic raised by the aggregator is propagated once every pipeline
    /// thread has exited.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(workers = self.config.workers)))]
    pub fn run<I, P, A>(
        &self,
        tasks: I,
        processor: P,
        aggregator: A,
    ) -> Result<PipelineReport<A::Output>>
    where
        I: IntoIterator,
        I::IntoIter: Send,
        I::Item: Send,
        P: TaskProcessor<I::Item> + Sync,
        P::Output: Send,
        A: Aggregator<P::Output>,
    {
        let config = self.config;
        let tracker = CompletionTracker::new();
        let counters = Counters::default();
        let tasks = tasks.into_iter();

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Starting pipeline with {} workers (job capacity {}, result capacity {})",
            config.workers,
            config.job_capacity,
            config.result_capacity
        );

        // Every queue endpoint lives inside the scope closure, so an early
        // return drops them and lets already spawned threads run to completion.
        let outcome = thread::scope(|scope| -> Result<_> {
            let (job_tx, job_rx) = bounded(config.job_capacity);
            let (result_tx, result_rx) = bounded(config.result_capacity);

            let mut workers = Vec::with_capacity(config.workers);
            for worker_id in 0..config.workers {
                // Registered before spawning so the watcher can never observe
                // an empty pool while workers are still starting.
                let guard = tracker.register();
                let jobs = job_rx.clone();
                let results = result_tx.clone();
                let processor = &processor;
                let counters = &counters;

                let handle = thread::Builder::new()
                    .name(format!("taskpipe-worker-{worker_id}"))
                    .spawn_scoped(scope, move || {
                        worker_loop(worker_id, jobs, results, processor, counters, guard);
                    })
                    .map_err(|e| Error::spawn("worker", &e))?;
                workers.push(handle);
            }
            drop(job_rx);

            let watcher = {
                let tracker = tracker.clone();
                thread::Builder::new()
                    .name("taskpipe-watcher".to_string())
                    .spawn_scoped(scope, move || {
                        tracker.wait();
                        #[cfg(feature = "tracing")]
                        tracing::debug!("All workers finished; closing result queue");
                        drop(result_tx);
                    })
                    .map_err(|e| Error::spawn("watcher", &e))?
            };

            let source = {
                let counters = &counters;
                thread::Builder::new()
                    .name("taskpipe-source".to_string())
                    .spawn_scoped(scope, move || feed_jobs(tasks, job_tx, counters))
                    .map_err(|e| Error::spawn("source", &e))?
            };

            let mut aggregator = aggregator;
            for result in &result_rx {
                counters.record_received();
                aggregator.accept(result);
            }
            let output = aggregator.finish();

            let panicked = workers
                .into_iter()
                .map(|handle| handle.join())
                .filter(|joined| joined.is_err())
                .count();
            // The watcher only waits and drops a sender; it cannot panic.
            let _ = watcher.join();
            let source_panicked = source.join().is_err();

            Ok((output, panicked, source_panicked))
        });

        let (output, panicked, source_panicked) = outcome?;
        let stats = counters.snapshot();

        if panicked > 0 {
            #[cfg(feature = "tracing")]
            tracing::error!("{panicked} worker(s) panicked; stats: {stats:?}");
            return Err(Error::WorkerPanicked { count: panicked });
        }
        if source_panicked {
            #[cfg(feature = "tracing")]
            tracing::error!("Job source panicked after {} tasks", stats.submitted);
            return Err(Error::SourcePanicked {
                submitted: stats.submitted,
            });
        }

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Pipeline finished: {} processed, {} forwarded, {} dropped, {} failed",
            stats.processed,
            stats.forwarded,
            stats.dropped,
            stats.failed
        );

        Ok(PipelineReport { output, stats })
    }
}

/// Runs a pipeline with one capacity for both queues.
///
/// Shorthand for [`Pipeline::new`] followed by [`Pipeline::run`].
///
/// ```
/// use taskpipe::{PrimeFilter, Sum, run_pipeline};
///
/// let report = run_pipeline(2_i64..=30, 4, 16, PrimeFilter::new(), Sum::<i64>::default())?;
/// assert_eq!(report.output, 167);
/// assert_eq!(report.stats.processed, 29);
/// # Ok::<(), taskpipe::Error>(())
/// ```
///
/// # Errors
///
/// See [`Pipeline::new`] and [`Pipeline::run`].
pub fn run_pipeline<I, P, A>(
    tasks: I,
    workers: usize,
    capacity: usize,
    processor: P,
    aggregator: A,
) -> Result<PipelineReport<A::Output>>
where
    I: IntoIterator,
    I::IntoIter: Send,
    I::Item: Send,
    P: TaskProcessor<I::Item> + Sync,
    P::Output: Send,
    A: Aggregator<P::Output>,
{
    Pipeline::new(PipelineConfig::new(workers, capacity))?.run(tasks, processor, aggregator)
}
