//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap transport calls with a deadline
//! - Compute the per-attempt budget from the request timeout and total deadline
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; the call future is dropped on expiry
//! - Timeout errors are distinct from other errors

use std::future::Future;
use std::time::Duration;

use crate::error::{RequestError, RequestResult};

/// Run `fut`, failing with `RequestError::Timeout` if it outlives `timeout`.
pub async fn with_timeout<F, T>(timeout: Duration, fut: F) -> RequestResult<T>
where
    F: Future<Output = RequestResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(RequestError::Timeout(timeout)),
    }
}

/// Budget for the next attempt, or `None` when the total deadline is spent.
pub fn attempt_budget(
    timeout: Duration,
    deadline: Option<Duration>,
    elapsed: Duration,
) -> Option<Duration> {
    match deadline {
        None => Some(timeout),
        Some(deadline) => {
            let remaining = deadline.checked_sub(elapsed)?;
            if remaining.is_zero() {
                None
            } else {
                Some(remaining.min(timeout))
            }
        }
    }
}
