use std::future::Future;
use std::time::Duration;

/// Bounded retry schedule for reads against the eventually consistent
/// catalog.
///
/// An operation reports an indeterminate result by returning `Ok(None)`:
/// the record may simply not be visible yet, so the policy re-invokes the
/// operation after the next delay in the schedule. `Ok(Some(..))` and
/// `Err(..)` are terminal and returned immediately. Exhausting the attempt
/// budget yields the final `None` rather than an error; the caller decides
/// whether "still not there" means "does not exist".
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: usize,
    delays: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fibonacci(10)
    }
}

impl RetryPolicy {
    /// Fibonacci delay schedule: 1, 1, 2, 3, 5, ... seconds between
    /// attempts.
    pub fn fibonacci(max_attempts: usize) -> Self {
        let mut delays = Vec::with_capacity(max_attempts.saturating_sub(1));
        let (mut a, mut b) = (1u64, 1u64);
        for _ in 1..max_attempts {
            delays.push(Duration::from_secs(a));
            (a, b) = (b, a + b);
        }
        Self {
            max_attempts,
            delays,
        }
    }

    /// Same attempt budget, no sleeping. For tests.
    pub fn without_delays(max_attempts: usize) -> Self {
        Self {
            max_attempts,
            delays: Vec::new(),
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Delay to wait after the given zero-based attempt, if any.
    pub fn delay_after(&self, attempt: usize) -> Option<Duration> {
        self.delays.get(attempt).copied()
    }

    /// Drives `op` until it produces a terminal result or the attempt
    /// budget runs out.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<Option<T>, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        for attempt in 0..self.max_attempts {
            if let Some(value) = op().await? {
                return Ok(Some(value));
            }
            if attempt + 1 == self.max_attempts {
                break;
            }
            if let Some(delay) = self.delay_after(attempt) {
                tracing::debug!(
                    attempt = attempt + 1,
                    ?delay,
                    "result indeterminate, backing off"
                );
                tokio::time::sleep(delay).await;
            }
        }
        Ok(None)
    }
}
