//! Minimum spacing between outbound calls.
//!
//! One [`RateLimiter`] is shared by every call site that draws on the same
//! budget. A call reserves its dispatch slot when [`RateLimiter::schedule`] is
//! invoked, so dispatch order follows invocation order even when the returned
//! futures are polled in a different order.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::{Instant, sleep_until};
use tracing::trace;

pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    /// Slot of the most recently reserved dispatch.
    last_dispatch: Mutex<Option<Instant>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_dispatch: Mutex::new(None),
        }
    }

    /// Run `work` once at least `min_interval` has passed since the previous
    /// dispatch. The slot counts as used whether `work` succeeds or fails.
    pub fn schedule<F, Fut, T>(&self, work: F) -> impl Future<Output = T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let mut reservation = self.reserve();
        async move {
            let wait = reservation.slot.saturating_duration_since(Instant::now());
            if !wait.is_zero() {
                trace!("rate limited, waiting {:?}", wait);
            }
            sleep_until(reservation.slot).await;
            reservation.dispatched = true;
            work().await
        }
    }

    /// Earliest instant a call scheduled now would be dispatched.
    pub fn next_slot(&self) -> Instant {
        self.slot_after(*self.clock(), Instant::now())
    }

    fn reserve(&self) -> Reservation<'_> {
        let mut last = self.clock();
        let previous = *last;
        let slot = self.slot_after(previous, Instant::now());
        *last = Some(slot);
        Reservation {
            limiter: self,
            slot,
            previous,
            dispatched: false,
        }
    }

    fn slot_after(&self, last: Option<Instant>, now: Instant) -> Instant {
        match last {
            Some(last) => now.max(last + self.min_interval),
            None => now,
        }
    }

    fn clock(&self) -> MutexGuard<'_, Option<Instant>> {
        self.last_dispatch
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// A reserved dispatch slot.
///
/// Dropped before dispatch (the caller was cancelled), the slot is handed
/// back if nothing was reserved after it; otherwise later callers keep their
/// spacing and the slot simply goes unused.
struct Reservation<'a> {
    limiter: &'a RateLimiter,
    slot: Instant,
    previous: Option<Instant>,
    dispatched: bool,
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if self.dispatched {
            return;
        }
        let mut last = self.limiter.clock();
        if *last == Some(self.slot) {
            *last = self.previous;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    type Log = Arc<Mutex<Vec<(u32, Instant)>>>;

    async fn record(log: Log, id: u32) -> u32 {
        log.lock().unwrap().push((id, Instant::now()));
        id
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_call_is_not_delayed() {
        let limiter = RateLimiter::default();
        let start = Instant::now();
        let log = Log::default();

        limiter.schedule(|| record(log.clone(), 1)).await;
        assert_eq!(log.lock().unwrap()[0].1, start);
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_to_back_calls_are_spaced_in_invocation_order() {
        let limiter = RateLimiter::default();
        let log = Log::default();

        let first = limiter.schedule(|| record(log.clone(), 1));
        let second = limiter.schedule(|| record(log.clone(), 2));
        // Poll the second call first; it must still go out second.
        let (b, a) = tokio::join!(second, first);
        assert_eq!((a, b), (1, 2));

        let log = log.lock().unwrap();
        assert_eq!(log.iter().map(|(id, _)| *id).collect::<Vec<_>>(), vec![1, 2]);
        assert!(log[1].1 - log[0].1 >= DEFAULT_MIN_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_call_still_counts() {
        let limiter = RateLimiter::new(Duration::from_millis(1000));
        let log = Log::default();

        let failed: Result<(), &str> = limiter.schedule(|| async { Err("boom") }).await;
        assert!(failed.is_err());
        let failed_at = Instant::now();

        limiter.schedule(|| record(log.clone(), 2)).await;
        assert!(log.lock().unwrap()[0].1 - failed_at >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_quiet_period_resets_wait() {
        let limiter = RateLimiter::default();
        let log = Log::default();

        limiter.schedule(|| record(log.clone(), 1)).await;
        tokio::time::sleep(Duration::from_secs(5)).await;
        let resumed = Instant::now();
        limiter.schedule(|| record(log.clone(), 2)).await;

        assert_eq!(log.lock().unwrap()[1].1, resumed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_reservation_returns_its_slot() {
        let limiter = RateLimiter::default();
        let start = Instant::now();

        limiter.schedule(|| async {}).await;
        let abandoned = limiter.schedule(|| async {});
        assert_eq!(limiter.next_slot(), start + 2 * DEFAULT_MIN_INTERVAL);

        drop(abandoned);
        assert_eq!(limiter.next_slot(), start + DEFAULT_MIN_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_reservation_keeps_later_spacing() {
        let limiter = RateLimiter::default();
        let start = Instant::now();

        limiter.schedule(|| async {}).await;
        let abandoned = limiter.schedule(|| async {});
        let kept = limiter.schedule(|| async {});
        drop(abandoned);

        kept.await;
        assert_eq!(Instant::now(), start + 2 * DEFAULT_MIN_INTERVAL);
    }
}
