//! Task-based pipeline engine on the [`tokio`](https://docs.rs/tokio) runtime.
//!
//! Mirrors [`Pipeline::run`] with tokio primitives:
//!
//! - the job and result queues are bounded [`mpsc`] channels; workers share
//!   the job receiver behind an async [`Mutex`], so each task still reaches
//!   exactly one worker;
//! - the per-task computation runs on the blocking pool via
//!   [`spawn_blocking`](tokio::task::spawn_blocking), so CPU-bound work and
//!   synchronous delays never stall the scheduler;
//! - the watcher awaits [`CompletionTracker::wait_async`] before dropping the
//!   original result sender.

use crate::{
    Aggregator, CompletionGuard, CompletionTracker, Error, Pipeline, PipelineConfig,
    PipelineReport, Result, TaskProcessor, stats::Counters, worker::process_task,
};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

impl Pipeline {
    /// Async counterpart of [`Pipeline::run`].
    ///
    /// Resolves once the aggregator has drained the result queue and every
    /// spawned task has finished.
    ///
    /// # Errors
    ///
    /// - [`Error::WorkerPanicked`] if a worker (or its processor) panicked.
    /// - [`Error::SourcePanicked`] if the task iterator panicked.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(workers = self.config().workers)))]
    pub async fn run_async<I, P, A>(
        &self,
        tasks: I,
        processor: P,
        aggregator: A,
    ) -> Result<PipelineReport<A::Output>>
    where
        I: IntoIterator,
        I::IntoIter: Send + 'static,
        I::Item: Send + 'static,
        P: TaskProcessor<I::Item> + Send + Sync + 'static,
        P::Output: Send + 'static,
        A: Aggregator<P::Output>,
    {
        let config = *self.config();
        let tracker = CompletionTracker::new();
        let counters = Arc::new(Counters::default());
        let processor = Arc::new(processor);

        let (job_tx, job_rx) = mpsc::channel(config.job_capacity);
        let (result_tx, mut result_rx) = mpsc::channel(config.result_capacity);
        let job_rx = Arc::new(Mutex::new(job_rx));

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Starting async pipeline with {} workers (job capacity {}, result capacity {})",
            config.workers,
            config.job_capacity,
            config.result_capacity
        );

        let mut workers = Vec::with_capacity(config.workers);
        for worker_id in 0..config.workers {
            let guard = tracker.register();
            workers.push(tokio::spawn(worker_loop_async(
                worker_id,
                Arc::clone(&job_rx),
                result_tx.clone(),
                Arc::clone(&processor),
                Arc::clone(&counters),
                guard,
            )));
        }
        drop(job_rx);

        let watcher = {
            let tracker = tracker.clone();
            tokio::spawn(async move {
                tracker.wait_async().await;
                #[cfg(feature = "tracing")]
                tracing::debug!("All workers finished; closing result queue");
                drop(result_tx);
            })
        };

        let source = tokio::spawn(feed_jobs_async(
            tasks.into_iter(),
            job_tx,
            Arc::clone(&counters),
        ));

        let mut aggregator = aggregator;
        while let Some(result) = result_rx.recv().await {
            counters.record_received();
            aggregator.accept(result);
        }
        let output = aggregator.finish();

        let panicked = futures::future::join_all(workers)
            .await
            .into_iter()
            .filter(|joined| joined.is_err())
            .count();
        let _ = watcher.await;
        let source_panicked = source.await.is_err();

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
            "Async pipeline finished: {} processed, {} forwarded, {} dropped, {} failed",
            stats.processed,
            stats.forwarded,
            stats.dropped,
            stats.failed
        );

        Ok(PipelineReport { output, stats })
    }
}

/// Async counterpart of [`crate::run_pipeline`].
///
/// ```
/// # #[tokio::main(flavor = "multi_thread")]
/// # async fn main() -> taskpipe::Result<()> {
/// use taskpipe::{Collect, Doubler, run_pipeline_async};
///
/// let report = run_pipeline_async(1_i64..=20, 5, 1000, Doubler::instant(), Collect::new()).await?;
/// let mut doubled = report.output;
/// doubled.sort_unstable();
/// assert_eq!(doubled, (1..=20).map(|n| n * 2).collect::<Vec<i64>>());
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// See [`Pipeline::new`] and [`Pipeline::run_async`].
pub async fn run_pipeline_async<I, P, A>(
    tasks: I,
    workers: usize,
    capacity: usize,
    processor: P,
    aggregator: A,
) -> Result<PipelineReport<A::Output>>
where
    I: IntoIterator,
    I::IntoIter: Send + 'static,
    I::Item: Send + 'static,
    P: TaskProcessor<I::Item> + Send + Sync + 'static,
    P::Output: Send + 'static,
    A: Aggregator<P::Output>,
{
    Pipeline::new(PipelineConfig::new(workers, capacity))?
        .run_async(tasks, processor, aggregator)
        .await
}

/// Feeds the job queue, then closes it by dropping the only sender.
async fn feed_jobs_async<I>(tasks: I, jobs: mpsc::Sender<I::Item>, counters: Arc<Counters>) -> u64
where
    I: Iterator,
{
    let mut submitted = 0_u64;

    for task in tasks {
        if jobs.send(task).await.is_err() {
            #[cfg(feature = "tracing")]
            tracing::debug!("Job queue has no receivers; stopping after {submitted} tasks");
            break;
        }
        submitted += 1;
        counters.record_submitted();
    }

    #[cfg(feature = "tracing")]
    tracing::debug!("Job source exhausted after {submitted} tasks; closing job queue");

    submitted
}

/// Worker task body. Same contract as the thread-based worker: exits once the
/// job queue is closed and drained, and releases `guard` after dropping its
/// result sender.
///
/// A panic in the processor is re-raised in this task so it is reported the
/// same way as a panicking worker thread.
#[allow(clippy::used_underscore_binding)]
async fn worker_loop_async<T, P>(
    worker_id: usize,
    jobs: Arc<Mutex<mpsc::Receiver<T>>>,
    results: mpsc::Sender<P::Output>,
    processor: Arc<P>,
    counters: Arc<Counters>,
    guard: CompletionGuard,
) where
    T: Send + 'static,
    P: TaskProcessor<T> + Send + Sync + 'static,
    P::Output: Send + 'static,
{
    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {worker_id} started");

    loop {
        // The lock is held only while waiting for the next task.
        let Some(task) = jobs.lock().await.recv().await else {
            break;
        };

        let processed = {
            let processor = Arc::clone(&processor);
            let counters = Arc::clone(&counters);
            tokio::task::spawn_blocking(move || {
                process_task(worker_id, &*processor, task, &counters)
            })
            .await
        };

        let result = match processed {
            Ok(Some(result)) => result,
            Ok(None) => continue,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Worker {worker_id} exiting: blocking task cancelled: {_e}");
                break;
            }
        };

        if results.send(result).await.is_err() {
            #[cfg(feature = "tracing")]
            tracing::debug!("Worker {worker_id} exiting: result queue has no receiver");
            break;
        }
        counters.record_forwarded();
    }

    drop(results);
    drop(guard);

    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {worker_id} stopped");
}
