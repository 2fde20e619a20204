use crate::{TaskProcessor, stats::Counters, tracker::CompletionGuard};
use crossbeam_channel::{Receiver, Sender};

/// Runs one task through the processor and records the outcome.
///
/// Returns the result to forward, if any. Failures are logged and counted;
/// they never stop the calling worker.
#[allow(clippy::used_underscore_binding)]
pub(crate) fn process_task<T, P>(
    _worker_id: usize,
    processor: &P,
    task: T,
    counters: &Counters,
) -> Option<P::Output>
where
    P: TaskProcessor<T> + ?Sized,
{
    counters.record_processed();

    match processor.process(task) {
        Ok(Some(result)) => Some(result),
        Ok(None) => {
            counters.record_dropped();
            None
        }
        Err(_e) => {
            counters.record_failed();
            #[cfg(feature = "tracing")]
            tracing::warn!("Worker {_worker_id} failed to process task: {_e}");
            None
        }
    }
}

/// Worker thread body.
///
/// Pulls tasks until the job queue is closed and drained, forwarding every
/// produced result. Exits early if the result queue has no receiver left,
/// since nothing could observe further results.
///
/// `results` is dropped before `guard`, so by the time the tracker sees this
/// worker as finished it no longer holds a result queue sender.
#[allow(clippy::needless_pass_by_value)]
#[allow(clippy::used_underscore_binding)]
pub(crate) fn worker_loop<T, P>(
    worker_id: usize,
    jobs: Receiver<T>,
    results: Sender<P::Output>,
    processor: &P,
    counters: &Counters,
    guard: CompletionGuard,
) where
    P: TaskProcessor<T> + ?Sized,
{
    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {worker_id} started");

    // `recv` fails only once the queue is closed and empty.
    while let Ok(task) = jobs.recv() {
        let Some(result) = process_task(worker_id, processor, task, counters) else {
            continue;
        };

        if results.send(result).is_err() {
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
