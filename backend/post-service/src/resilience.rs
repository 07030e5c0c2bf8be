/// Deadline and retry helpers
///
/// Every public operation runs under a deadline; an elapsed deadline is a
/// retryable store unavailability, never "not found". Retries are only used
/// for compensating and cleanup steps inside a request.
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

use crate::error::{AppError, Result};

/// Run `future` under `deadline`, mapping expiry to `AppError::Unavailable`.
pub async fn with_deadline<F, T>(operation: &'static str, deadline: Duration, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout(deadline, future).await {
        Ok(result) => result,
        Err(_) => {
            warn!(operation, ?deadline, "operation deadline exceeded");
            Err(AppError::Unavailable(format!(
                "{} timed out after {:?}",
                operation, deadline
            )))
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
    /// ±30% random jitter on each delay
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_secs(2),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_backoff: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff,
            ..Default::default()
        }
    }

    /// Run `f` until it succeeds, the error is not retryable, or retries run out.
    /// The last error is returned unchanged.
    pub async fn run<F, Fut, T>(&self, operation: &'static str, mut f: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        let mut backoff = self.initial_backoff;

        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_retryable() || attempt >= self.max_retries => return Err(err),
                Err(err) => {
                    attempt += 1;
                    let delay = jittered(backoff, self.jitter);
                    warn!(
                        operation,
                        attempt,
                        max_retries = self.max_retries,
                        ?delay,
                        error = %err,
                        "retrying after transient failure"
                    );
                    tokio::time::sleep(delay).await;

                    backoff = Duration::from_millis(
                        ((backoff.as_millis() as f64 * self.backoff_multiplier)
                            .min(self.max_backoff.as_millis() as f64)) as u64,
                    );
                }
            }
        }
    }
}

fn jittered(base: Duration, jitter: bool) -> Duration {
    if jitter {
        let factor = 1.0 + rand::thread_rng().gen_range(-0.3..0.3);
        Duration::from_millis((base.as_millis() as f64 * factor) as u64)
    } else {
        base
    }
}
