//! Fan-in stage: reducing the result queue into a single value.

use core::ops::AddAssign;

/// Consumes every result of a run, in arrival order, and produces the run's
/// output once the result queue is closed and empty.
///
/// Arrival order is not submission order, so reductions should be
/// order-agnostic (sums, counts, sets) or sort afterwards.
pub trait Aggregator<R> {
    type Output;

    fn accept(&mut self, result: R);

    fn finish(self) -> Self::Output;
}

/// Adds every result into an accumulator that starts at `A::default()`.
///
/// ```
/// use taskpipe::{Aggregator, Sum};
///
/// let mut sum = Sum::<i64>::default();
/// sum.accept(2);
/// sum.accept(3);
/// assert_eq!(sum.finish(), 5);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Sum<A> {
    total: A,
}

impl<A> Sum<A> {
    /// Starts the sum at `initial` instead of `A::default()`.
    pub const fn starting_at(initial: A) -> Self {
        Self { total: initial }
    }
}

impl<A> Aggregator<A> for Sum<A>
where
    A: AddAssign,
{
    type Output = A;

    fn accept(&mut self, result: A) {
        self.total += result;
    }

    fn finish(self) -> A {
        self.total
    }
}

/// Gathers every result into a `Vec`, in arrival order.
#[derive(Clone, Debug)]
pub struct Collect<R> {
    items: Vec<R>,
}

impl<R> Collect<R> {
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }
}

impl<R> Default for Collect<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Aggregator<R> for Collect<R> {
    type Output = Vec<R>;

    fn accept(&mut self, result: R) {
        self.items.push(result);
    }

    fn finish(self) -> Vec<R> {
        self.items
    }
}

/// Drops every result, keeping only a count.
///
/// Useful when the processor's side effects are the point and the result
/// queue only has to be drained so workers never block on it.
#[derive(Clone, Copy, Debug, Default)]
pub struct Discard {
    seen: u64,
}

impl<R> Aggregator<R> for Discard {
    type Output = u64;

    fn accept(&mut self, _result: R) {
        self.seen += 1;
    }

    fn finish(self) -> u64 {
        self.seen
    }
}

/// Folds results with a closure over a mutable accumulator.
///
/// ```
/// use taskpipe::{Aggregator, Fold};
///
/// let mut max = Fold::new(i64::MIN, |acc: &mut i64, n: i64| *acc = (*acc).max(n));
/// for n in [3, 9, 4] {
///     max.accept(n);
/// }
/// assert_eq!(Aggregator::<i64>::finish(max), 9);
/// ```
pub struct Fold<A, F> {
    acc: A,
    f: F,
}

impl<A, F> Fold<A, F> {
    pub const fn new(init: A, f: F) -> Self {
        Self { acc: init, f }
    }
}

impl<R, A, F> Aggregator<R> for Fold<A, F>
where
    F: FnMut(&mut A, R),
{
    type Output = A;

    fn accept(&mut self, result: R) {
        (self.f)(&mut self.acc, result);
    }

    fn finish(self) -> A {
        self.acc
    }
}
