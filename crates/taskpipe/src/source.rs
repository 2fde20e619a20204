use crate::stats::Counters;
use crossbeam_channel::Sender;

/// Feeds every task into the job queue in iteration order, then closes it.
///
/// The job queue closes when `jobs` is dropped at the end of this function.
/// Since this is the only sender, nothing can be enqueued after that point.
///
/// Stops early if every receiver is gone. Returns the number of tasks
/// submitted.
pub(crate) fn feed_jobs<I>(tasks: I, jobs: Sender<I::Item>, counters: &Counters) -> u64
where
    I: Iterator,
{
    let mut submitted = 0_u64;

    for task in tasks {
        if jobs.send(task).is_err() {
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
