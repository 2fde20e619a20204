//! Error types for the pipeline engine.
//!
//! ## Error Cases
//! - `InvalidConfig`: the pipeline was configured with zero workers or a zero
//!   queue capacity. Reported before any thread or task is started.
//! - `Spawn`: the operating system refused to start a pipeline thread.
//! - `WorkerPanicked`: one or more workers panicked. The run still drains to
//!   completion before this is reported.
//! - `SourcePanicked`: the task iterator panicked mid-run.
//!
//! Failures of the per-task computation are not errors of the pipeline: they
//! are logged, counted in [`crate::PipelineStats`], and the worker moves on.

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for pipeline runs.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// The configuration was rejected by [`crate::PipelineConfig::validate`].
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// A pipeline thread could not be spawned.
    #[error("Failed to spawn {role} thread: {context}")]
    Spawn { role: &'static str, context: String },

    /// Workers panicked while processing. Results from the surviving workers
    /// were still drained, but the run is incomplete.
    #[error("{count} worker(s) panicked")]
    WorkerPanicked { count: usize },

    /// The task iterator panicked. Tasks submitted before the panic were
    /// still processed and drained.
    #[error("Job source panicked after submitting {submitted} tasks")]
    SourcePanicked { submitted: u64 },
}

impl Error {
    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    pub(crate) fn spawn(role: &'static str, err: &std::io::Error) -> Self {
        Self::Spawn {
            role,
            context: err.to_string(),
        }
    }
}
