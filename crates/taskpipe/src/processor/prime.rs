use super::TaskProcessor;
use core::convert::Infallible;

/// Upper bound used by the trial division loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DivisorBound {
    /// Divide while `i * i < n`.
    ///
    /// A divisor equal to `sqrt(n)` is never tried, so squares of primes
    /// (4, 9, 25, 49, ...) pass the test. Sums over `2..=30` come out to 167
    /// under this bound.
    #[default]
    Exclusive,
    /// Divide while `i * i <= n`, i.e. standard primality.
    Inclusive,
}

/// Forwards a task if it passes trial-division primality, drops it otherwise.
///
/// ```
/// use taskpipe::{PrimeFilter, TaskProcessor};
///
/// let filter = PrimeFilter::new();
/// assert_eq!(filter.process(7), Ok(Some(7)));
/// assert_eq!(filter.process(8), Ok(None));
/// // Squares of primes slip through the exclusive bound.
/// assert_eq!(filter.process(9), Ok(Some(9)));
/// assert_eq!(PrimeFilter::exact().process(9), Ok(None));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PrimeFilter {
    bound: DivisorBound,
}

impl PrimeFilter {
    /// Filter using the [`DivisorBound::Exclusive`] bound.
    pub const fn new() -> Self {
        Self {
            bound: DivisorBound::Exclusive,
        }
    }

    /// Filter using standard primality ([`DivisorBound::Inclusive`]).
    pub const fn exact() -> Self {
        Self {
            bound: DivisorBound::Inclusive,
        }
    }

    pub const fn with_bound(bound: DivisorBound) -> Self {
        Self { bound }
    }

    pub const fn bound(&self) -> DivisorBound {
        self.bound
    }
}

impl TaskProcessor<i64> for PrimeFilter {
    type Output = i64;
    type Error = Infallible;

    fn process(&self, task: i64) -> Result<Option<i64>, Infallible> {
        Ok(is_prime(task, self.bound).then_some(task))
    }
}

/// Trial-division primality test.
///
/// Returns `false` for `n < 2`. Otherwise tries every divisor from 2 upward
/// while `i * i` is below (or, for [`DivisorBound::Inclusive`], at most) `n`.
/// The loop ends early once `i * i` would overflow, since no such `i` can be
/// within the bound.
pub fn is_prime(n: i64, bound: DivisorBound) -> bool {
    if n < 2 {
        return false;
    }

    let mut i: i64 = 2;
    while let Some(square) = i.checked_mul(i) {
        let within = match bound {
            DivisorBound::Exclusive => square < n,
            DivisorBound::Inclusive => square <= n,
        };
        if !within {
            break;
        }
        if n % i == 0 {
            return false;
        }
        i += 1;
    }
    true
}
