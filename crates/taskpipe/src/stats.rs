use crossbeam_utils::CachePadded;
use portable_atomic::{AtomicU64, Ordering};

/// Counters describing one finished pipeline run.
///
/// After a run that completed without panics:
///
/// - `processed == submitted`
/// - `processed == forwarded + dropped + failed`
/// - `received == forwarded`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Tasks the job source pushed into the job queue.
    pub submitted: u64,
    /// Tasks taken off the job queue and handed to the processor.
    pub processed: u64,
    /// Results sent to the result queue.
    pub forwarded: u64,
    /// Tasks for which the processor returned no result.
    pub dropped: u64,
    /// Tasks for which the processor returned an error.
    pub failed: u64,
    /// Results the aggregator pulled off the result queue.
    pub received: u64,
}

/// The output of the aggregator together with the run's counters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineReport<O> {
    pub output: O,
    pub stats: PipelineStats,
}

impl<O> PipelineReport<O> {
    pub fn into_output(self) -> O {
        self.output
    }
}

/// Live counters shared by every stage of a run.
///
/// Each counter sits on its own cache line; workers on different cores bump
/// `processed` and `forwarded` constantly.
#[derive(Default)]
pub(crate) struct Counters {
    submitted: CachePadded<AtomicU64>,
    processed: CachePadded<AtomicU64>,
    forwarded: CachePadded<AtomicU64>,
    dropped: CachePadded<AtomicU64>,
    failed: CachePadded<AtomicU64>,
    received: CachePadded<AtomicU64>,
}

impl Counters {
    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_forwarded(&self) {
        self.forwarded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    /// Reads every counter. Only meaningful once all stages have been joined.
    pub(crate) fn snapshot(&self) -> PipelineStats {
        PipelineStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            forwarded: self.forwarded.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            received: self.received.load(Ordering::Relaxed),
        }
    }
}
