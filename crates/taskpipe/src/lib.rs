#![doc = include_str!("../README.md")]

mod aggregate;
mod config;
mod error;
mod pipeline;
mod processor;
mod runtime;
mod source;
mod stats;
mod tracker;
mod worker;

#[cfg(test)]
mod tests;

pub use crate::aggregate::*;
pub use crate::config::*;
pub use crate::error::*;
pub use crate::pipeline::*;
pub use crate::processor::*;
#[cfg(feature = "async-tokio")]
pub use crate::runtime::*;
pub use crate::stats::{PipelineReport, PipelineStats};
pub use crate::tracker::*;
