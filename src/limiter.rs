//! Rolling-window rate limiter
//!
//! This module bounds request issuance in two ways at once:
//! - at most `limit` acquisitions may be outstanding (in flight) at any instant
//! - at most `limit` acquisitions may complete within any trailing one-second
//!   window
//!
//! Admission is handed out as a [`RatePermit`]; dropping the permit releases
//! the in-flight slot, so the slot is returned along every path, including
//! error paths.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

const WINDOW: Duration = Duration::from_secs(1);

/// Bounds concurrent in-flight requests and completions per rolling second
pub struct RateLimiter {
    limit: usize,
    state: Mutex<WindowState>,
}

struct WindowState {
    in_flight: usize,
    /// Timestamps of the most recent `limit` admissions, oldest first
    history: VecDeque<Instant>,
}

/// An admission handed out by [`RateLimiter::acquire`]
///
/// The in-flight slot is released when the permit is dropped.
pub struct RatePermit<'a> {
    limiter: &'a RateLimiter,
}

impl Drop for RatePermit<'_> {
    fn drop(&mut self) {
        let mut state = self.limiter.state.lock().unwrap();
        state.in_flight -= 1;
    }
}

impl RateLimiter {
    /// Creates a limiter admitting at most `limit` requests per rolling second
    ///
    /// # Panics
    ///
    /// Panics if `limit` is zero. Config validation rejects that value before
    /// a limiter is ever constructed.
    pub fn new(limit: u32) -> Self {
        assert!(limit >= 1, "rate limit must be >= 1");
        Self {
            limit: limit as usize,
            state: Mutex::new(WindowState {
                in_flight: 0,
                history: VecDeque::with_capacity(limit as usize),
            }),
        }
    }

    /// Suspends until both the in-flight bound and the rolling-window bound
    /// admit the caller, then returns a permit
    ///
    /// The lock is never held across an await; each admission check is atomic
    /// with respect to interleaved callers.
    pub async fn acquire(&self) -> RatePermit<'_> {
        let poll = Duration::from_secs_f64(1.0 / self.limit as f64);

        // Claim an in-flight slot. The guard exists from this point on, so a
        // caller cancelled during the window wait still releases the slot.
        let permit = loop {
            {
                let mut state = self.state.lock().unwrap();
                if state.in_flight < self.limit {
                    state.in_flight += 1;
                    break RatePermit { limiter: self };
                }
            }
            tokio::time::sleep(poll).await;
        };

        // Wait out the rolling window.
        loop {
            let wait = {
                let mut state = self.state.lock().unwrap();
                if state.history.len() < self.limit {
                    // Ramp-up phase: the window is not yet full.
                    state.history.push_back(Instant::now());
                    return permit;
                }
                let oldest = state.history[0];
                let now = Instant::now();
                if now.duration_since(oldest) >= WINDOW {
                    state.history.pop_front();
                    state.history.push_back(now);
                    return permit;
                }
                oldest + WINDOW - now
            };
            tokio::time::sleep(wait).await;
        }
    }

    /// The configured per-second limit
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of acquisitions currently outstanding
    pub fn in_flight(&self) -> usize {
        self.state.lock().unwrap().in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    #[should_panic(expected = "rate limit must be >= 1")]
    fn zero_limit_panics() {
        RateLimiter::new(0);
    }

    #[tokio::test(start_paused = true)]
    async fn ramp_up_admits_limit_immediately() {
        let limiter = RateLimiter::new(4);
        let start = Instant::now();
        for _ in 0..4 {
            drop(limiter.acquire().await);
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn rolling_window_bounds_completions() {
        let limiter = RateLimiter::new(3);
        let mut completions = Vec::new();
        for _ in 0..9 {
            drop(limiter.acquire().await);
            completions.push(Instant::now());
        }

        // No four consecutive completions may fall inside one second.
        for window in completions.windows(4) {
            let span = window[3].duration_since(window[0]);
            assert!(span >= WINDOW, "4 completions within {:?}", span);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_never_exceeds_limit() {
        let limiter = Arc::new(RateLimiter::new(2));

        let p1 = limiter.acquire().await;
        let p2 = limiter.acquire().await;
        assert_eq!(limiter.in_flight(), 2);

        // A third acquire must block until a permit is returned.
        let contender = {
            let limiter = Arc::clone(&limiter);
            tokio::spawn(async move {
                drop(limiter.acquire().await);
            })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!contender.is_finished());
        assert_eq!(limiter.in_flight(), 2);

        drop(p1);
        contender.await.unwrap();
        drop(p2);
        assert_eq!(limiter.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_acquire_releases_the_slot() {
        let limiter = RateLimiter::new(1);

        // Fill the window so the next acquire has to wait it out.
        drop(limiter.acquire().await);

        // Cancel mid-wait; the claimed slot must come back.
        let result = tokio::time::timeout(Duration::from_millis(500), limiter.acquire()).await;
        assert!(result.is_err());
        assert_eq!(limiter.in_flight(), 0);

        // The limiter still admits once the window slides.
        drop(limiter.acquire().await);
        assert_eq!(limiter.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn permit_released_on_drop_along_error_path() {
        let limiter = RateLimiter::new(1);
        let result: Result<(), &str> = async {
            let _permit = limiter.acquire().await;
            Err("request failed")
        }
        .await;
        assert!(result.is_err());
        assert_eq!(limiter.in_flight(), 0);
    }
}
