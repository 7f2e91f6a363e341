//! Retry wrapper with exponential backoff.
//!
//! Only transient errors are retried. An empty-but-valid result is a success
//! and never reaches this layer as a failure: "no data" and "fetch failed"
//! stay distinct outcomes.

use std::time::Duration;

use tracing::debug;

use crate::domain::cancel::CancelToken;
use crate::domain::error::SieveError;

/// Run `op` up to `max_attempts` times, sleeping `base_delay * 2^(attempt-1)`
/// between attempts. Non-transient errors are returned immediately;
/// exhaustion returns `RetryExhausted` wrapping the last error.
pub fn with_retry<T, F>(
    max_attempts: u32,
    base_delay: Duration,
    cancel: &CancelToken,
    mut op: F,
) -> Result<T, SieveError>
where
    F: FnMut() -> Result<T, SieveError>,
{
    debug_assert!(max_attempts >= 1);
    let mut last_error: Option<SieveError> = None;

    for attempt in 1..=max_attempts {
        if cancel.is_canceled() {
            return Err(SieveError::Canceled);
        }

        match op() {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_transient() => return Err(err),
            Err(err) => {
                debug!(attempt, max_attempts, error = %err, "transient failure");
                last_error = Some(err);
            }
        }

        if attempt < max_attempts {
            let backoff = base_delay * 2u32.saturating_pow(attempt - 1);
            sleep_with_cancel(backoff, cancel)?;
        }
    }

    Err(SieveError::RetryExhausted {
        attempts: max_attempts,
        last_error: last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempts made".to_string()),
    })
}

fn sleep_with_cancel(total: Duration, cancel: &CancelToken) -> Result<(), SieveError> {
    let step = Duration::from_millis(10);
    let mut remaining = total;
    while remaining > Duration::ZERO {
        if cancel.is_canceled() {
            return Err(SieveError::Canceled);
        }
        let chunk = step.min(remaining);
        std::thread::sleep(chunk);
        remaining -= chunk;
    }
    Ok(())
}
