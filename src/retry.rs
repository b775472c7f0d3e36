//! Bounded-retry execution harness for transient bridge calls.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{info, trace};

/// Failure modes of [`execute_with_retry`].
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum RetryError {
    /// The caller asked for fewer than one attempt; the work never ran.
    #[error("max_attempts must be at least 1, got {0}")]
    InvalidBudget(u32),
    /// Every attempt failed; carries the last failure's message.
    #[error("giving up after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
}

/// Runs `work` up to `max_attempts` times, sleeping `delay` between failed
/// attempts. No backoff growth, no jitter.
///
/// The inter-attempt sleep is an await point, so dropping the returned
/// future cancels the whole loop mid-wait instead of swallowing the abort.
pub async fn execute_with_retry<T, E, F, Fut>(
    mut work: F,
    max_attempts: u32,
    delay: Duration,
) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    if max_attempts < 1 {
        return Err(RetryError::InvalidBudget(max_attempts));
    }

    let mut attempt = 0;
    loop {
        attempt += 1;
        match work().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                trace!("attempt {} failed: {}", attempt, e);
                if attempt >= max_attempts {
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last_error: e.to_string(),
                    });
                }
                info!("attempt {} failed, retrying in {:?}", attempt, delay);
                tokio::time::sleep(delay).await;
            }
        }
    }
}
