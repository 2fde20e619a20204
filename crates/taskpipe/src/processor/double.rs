use super::TaskProcessor;
use core::time::Duration;

/// Doubles every job after a fixed delay.
///
/// The delay stands in for a slow external call. It is a synchronous sleep,
/// so the worker is occupied for its whole duration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Doubler {
    delay: Duration,
}

impl Doubler {
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// A doubler without delay.
    pub const fn instant() -> Self {
        Self {
            delay: Duration::ZERO,
        }
    }

    pub const fn delay(&self) -> Duration {
        self.delay
    }
}

/// A job whose double does not fit in an `i64`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("doubling job {job} overflows")]
pub struct DoubleOverflow {
    pub job: i64,
}

impl TaskProcessor<i64> for Doubler {
    type Output = i64;
    type Error = DoubleOverflow;

    fn process(&self, job: i64) -> Result<Option<i64>, DoubleOverflow> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        job.checked_mul(2)
            .map(Some)
            .ok_or(DoubleOverflow { job })
    }
}
