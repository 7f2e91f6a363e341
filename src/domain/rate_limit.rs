//! Process-wide data source throttle.
//!
//! One reservation clock shared by every worker: `acquire` blocks until at
//! least `min_interval` has elapsed since the previous successful acquisition
//! anywhere in the process. The pipeline must never issue data source calls
//! faster than this, regardless of worker pool size.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::domain::cancel::CancelToken;
use crate::domain::error::SieveError;

/// Granularity of the cancellation poll while a caller is waiting its turn.
const CANCEL_POLL: Duration = Duration::from_millis(10);

#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    /// Time of the next free slot. Callers reserve a slot under the lock and
    /// then sleep until it arrives, so spacing holds without holding the
    /// mutex across sleeps.
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        RateLimiter {
            min_interval,
            next_slot: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Block until this caller's reserved slot arrives. Returns
    /// `SieveError::Canceled` if the token fires while waiting; the reserved
    /// slot is then left unused, which only widens spacing.
    pub fn acquire(&self, cancel: &CancelToken) -> Result<(), SieveError> {
        if cancel.is_canceled() {
            return Err(SieveError::Canceled);
        }

        let slot = {
            let mut next = self.next_slot.lock().expect("rate limiter lock poisoned");
            let now = Instant::now();
            let slot = match *next {
                Some(at) if at > now => at,
                _ => now,
            };
            *next = Some(slot + self.min_interval);
            slot
        };

        loop {
            let now = Instant::now();
            if now >= slot {
                return Ok(());
            }
            if cancel.is_canceled() {
                return Err(SieveError::Canceled);
            }
            std::thread::sleep(CANCEL_POLL.min(slot - now));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn first_acquire_is_immediate() {
        let limiter = RateLimiter::new(Duration::from_millis(50));
        let start = Instant::now();
        limiter.acquire(&CancelToken::new()).unwrap();
        assert!(start.elapsed() < Duration::from_millis(20));
    }

    #[test]
    fn sequential_acquires_are_spaced() {
        let limiter = RateLimiter::new(Duration::from_millis(30));
        let cancel = CancelToken::new();
        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire(&cancel).unwrap();
        }
        // Three acquisitions need at least two full intervals.
        assert!(start.elapsed() >= Duration::from_millis(60));
    }

    #[test]
    fn concurrent_acquires_share_one_budget() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(20)));
        let cancel = CancelToken::new();
        let n = 5;

        let start = Instant::now();
        std::thread::scope(|scope| {
            for _ in 0..n {
                let limiter = Arc::clone(&limiter);
                let cancel = cancel.clone();
                scope.spawn(move || limiter.acquire(&cancel).unwrap());
            }
        });
        assert!(start.elapsed() >= Duration::from_millis(20) * (n - 1));
    }

    #[test]
    fn canceled_token_fails_fast() {
        let limiter = RateLimiter::new(Duration::from_millis(10));
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(matches!(
            limiter.acquire(&cancel),
            Err(SieveError::Canceled)
        ));
    }

    #[test]
    fn cancellation_interrupts_a_waiter() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_secs(5)));
        let cancel = CancelToken::new();
        limiter.acquire(&cancel).unwrap();

        let waiter = {
            let limiter = Arc::clone(&limiter);
            let cancel = cancel.clone();
            std::thread::spawn(move || limiter.acquire(&cancel))
        };
        std::thread::sleep(Duration::from_millis(30));
        cancel.cancel();

        let result = waiter.join().unwrap();
        assert!(matches!(result, Err(SieveError::Canceled)));
    }
}
