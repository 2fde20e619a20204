//! Pluggable per-task computation.
//!
//! A [`TaskProcessor`] turns one task into at most one result. Returning
//! `Ok(None)` drops the task without forwarding anything to the result queue,
//! which is how filters such as [`PrimeFilter`] are expressed. Returning an
//! error marks the task as failed; the worker records it and moves on to the
//! next task.
//!
//! Closures are adapted with [`filter_map`] (infallible) and
//! [`try_filter_map`] (fallible).

mod double;
mod prime;

pub use double::*;
pub use prime::*;

use core::{convert::Infallible, fmt};
use std::sync::Arc;

/// A pure computation applied by every worker to each task it receives.
///
/// Implementations must be shareable across workers (`Sync`); each call
/// receives a task by value and should not depend on call order.
pub trait TaskProcessor<T> {
    /// The value forwarded to the result queue.
    type Output;
    /// The failure reported for a single task.
    type Error: fmt::Display;

    /// Processes one task.
    ///
    /// - `Ok(Some(result))` forwards `result` to the aggregator.
    /// - `Ok(None)` drops the task.
    /// - `Err(e)` records a failure for this task only.
    fn process(&self, task: T) -> Result<Option<Self::Output>, Self::Error>;
}

impl<T, P> TaskProcessor<T> for &P
where
    P: TaskProcessor<T> + ?Sized,
{
    type Output = P::Output;
    type Error = P::Error;

    fn process(&self, task: T) -> Result<Option<Self::Output>, Self::Error> {
        (**self).process(task)
    }
}

impl<T, P> TaskProcessor<T> for Arc<P>
where
    P: TaskProcessor<T> + ?Sized,
{
    type Output = P::Output;
    type Error = P::Error;

    fn process(&self, task: T) -> Result<Option<Self::Output>, Self::Error> {
        (**self).process(task)
    }
}

/// Processor backed by an infallible closure. See [`filter_map`].
#[derive(Clone, Copy, Debug)]
pub struct FilterMap<F> {
    f: F,
}

/// Adapts `f: Fn(T) -> Option<R>` into a [`TaskProcessor`].
///
/// ```
/// use taskpipe::{TaskProcessor, filter_map};
///
/// let evens = filter_map(|n: i64| (n % 2 == 0).then_some(n));
/// assert_eq!(evens.process(4), Ok(Some(4)));
/// assert_eq!(evens.process(5), Ok(None));
/// ```
pub const fn filter_map<F>(f: F) -> FilterMap<F> {
    FilterMap { f }
}

impl<T, R, F> TaskProcessor<T> for FilterMap<F>
where
    F: Fn(T) -> Option<R>,
{
    type Output = R;
    type Error = Infallible;

    fn process(&self, task: T) -> Result<Option<R>, Infallible> {
        Ok((self.f)(task))
    }
}

/// Processor backed by a fallible closure. See [`try_filter_map`].
#[derive(Clone, Copy, Debug)]
pub struct TryFilterMap<F> {
    f: F,
}

/// Adapts `f: Fn(T) -> Result<Option<R>, E>` into a [`TaskProcessor`].
pub const fn try_filter_map<F>(f: F) -> TryFilterMap<F> {
    TryFilterMap { f }
}

impl<T, R, E, F> TaskProcessor<T> for TryFilterMap<F>
where
    F: Fn(T) -> Result<Option<R>, E>,
    E: fmt::Display,
{
    type Output = R;
    type Error = E;

    fn process(&self, task: T) -> Result<Option<R>, E> {
        (self.f)(task)
    }
}
