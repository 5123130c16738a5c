//! Bounded polling.  Fixed intervals only, no backoff: every wait in this
//! crate has a known worst-case duration.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// Poll until `check` returns true, or `timeout` elapses.  The check always
/// runs at least once, and once more after the deadline has passed.
pub async fn wait_for<F, Fut>(timeout: Duration, interval: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = Instant::now();
    loop {
        if check().await {
            return true;
        }
        if start.elapsed() > timeout {
            return false;
        }
        tokio::time::sleep(interval).await;
    }
}

/// Call `attempt` up to `retries` times, `interval` apart, until it yields
/// `Some`.  Returns `None` when the budget is exhausted.
pub async fn retry_fixed<F, Fut, T>(retries: u32, interval: Duration, mut attempt: F) -> Option<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for n in 1..=retries {
        if let Some(value) = attempt(n).await {
            return Some(value);
        }
        if n < retries {
            tokio::time::sleep(interval).await;
        }
    }
    None
}
