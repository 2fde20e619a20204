use crate::{Error, Result};

/// Shape of a pipeline run: how many workers, and how deep each queue is.
///
/// Both capacities bound their queue; a send on a full queue waits for a
/// receiver to make room. Capacity only affects throughput, never the outcome
/// of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Number of workers pulling from the job queue.
    pub workers: usize,
    /// Capacity of the queue between the job source and the workers.
    pub job_capacity: usize,
    /// Capacity of the queue between the workers and the aggregator.
    pub result_capacity: usize,
}

impl PipelineConfig {
    /// Creates a config using the same capacity for both queues.
    pub const fn new(workers: usize, capacity: usize) -> Self {
        Self {
            workers,
            job_capacity: capacity,
            result_capacity: capacity,
        }
    }

    /// Overrides the job queue capacity.
    #[must_use]
    pub const fn with_job_capacity(mut self, capacity: usize) -> Self {
        self.job_capacity = capacity;
        self
    }

    /// Overrides the result queue capacity.
    #[must_use]
    pub const fn with_result_capacity(mut self, capacity: usize) -> Self {
        self.result_capacity = capacity;
        self
    }

    /// Checks that the pool and both queues are non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if any field is zero.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::invalid_config("worker count must be greater than 0"));
        }
        if self.job_capacity == 0 {
            return Err(Error::invalid_config(
                "job queue capacity must be greater than 0",
            ));
        }
        if self.result_capacity == 0 {
            return Err(Error::invalid_config(
                "result queue capacity must be greater than 0",
            ));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    /// Eight workers over queues of 100.
    fn default() -> Self {
        Self::new(8, 100)
    }
}
