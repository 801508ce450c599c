//! Fixed-interval polling for operations that report "not yet".

use std::future::Future;
use std::time::Duration;

/// Result of a single polling attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt<T> {
    /// The operation finished with a value.
    Ready(T),
    /// The operation is not finished; try again after the interval.
    Pending,
}

/// Retry policy for polling.
///
/// `Pending` is the only outcome that is retried. Errors end the loop at
/// once. With `max_attempts: None` the loop has no upper bound and no
/// overall timeout; the caller must be prepared to wait indefinitely.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    /// Sleep between attempts.
    pub interval: Duration,
    /// Upper bound on attempts, `None` for unbounded.
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::unbounded(Duration::from_secs(1))
    }
}

impl PollPolicy {
    pub fn unbounded(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
        }
    }

    /// Run `operation` until it is ready or fails.
    ///
    /// Returns `Ok(None)` only when a bounded policy runs out of attempts.
    pub async fn execute<F, Fut, T, E>(&self, mut operation: F) -> Result<Option<T>, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Attempt<T>, E>>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            match operation().await? {
                Attempt::Ready(value) => return Ok(Some(value)),
                Attempt::Pending => {
                    if self.max_attempts.is_some_and(|max| attempt >= max) {
                        return Ok(None);
                    }
                    tracing::debug!(
                        attempt,
                        interval_ms = self.interval.as_millis() as u64,
                        "still pending, polling again"
                    );
                    tokio::time::sleep(self.interval).await;
                }
            }
        }
    }
}
