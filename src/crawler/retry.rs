//! Fixed-delay retry wrapper for fallible async operations

use std::future::Future;
use std::time::Duration;

/// Runs `operation` up to `max_attempts` times with a fixed pause between attempts
///
/// Every error is retried. See [`retry_when`] to give up early on errors that
/// cannot succeed on a second try.
///
/// # Arguments
///
/// * `operation` - Called with the 1-based attempt number
/// * `max_attempts` - Total attempts, the first one included; 0 behaves as 1
/// * `delay` - Pause after each failed attempt except the last
///
/// # Returns
///
/// The first success, or the error of the final attempt
pub async fn retry<T, E, F, Fut>(operation: F, max_attempts: u32, delay: Duration) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    retry_when(operation, max_attempts, delay, |_| true).await
}

/// Like [`retry`], stopping as soon as `should_retry` rejects an error
pub async fn retry_when<T, E, F, Fut, P>(
    mut operation: F,
    max_attempts: u32,
    delay: Duration,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts && should_retry(&e) => {
                tracing::warn!(
                    "Attempt {}/{} failed: {}; retrying in {:?}",
                    attempt,
                    max_attempts,
                    e,
                    delay
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
