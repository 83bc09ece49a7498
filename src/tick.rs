//! # Tick Source
//!
//! The scheduler's time base: a wrapping `u32` tick counter and a
//! "tick pending" flag, both written by the SysTick handler and read by
//! the dispatch loop.
//!
//! The counter wraps after 2³² ticks (~49.7 days at 1 kHz). Every due-time
//! check uses [`elapsed`], which is wraparound-safe, so the wrap is never
//! observable by tasks.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Ticks elapsed from `since` to `now`, tolerant of counter wraparound.
#[inline]
pub const fn elapsed(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}

/// Monotonic tick counter plus pending flag.
pub struct TickSource {
    ticks: AtomicU32,
    pending: AtomicBool,
}

impl TickSource {
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    /// Counter preset to `tick`, no tick pending.
    pub const fn starting_at(tick: u32) -> Self {
        Self {
            ticks: AtomicU32::new(tick),
            pending: AtomicBool::new(false),
        }
    }

    /// Advance the counter by one tick and raise the pending flag.
    /// Returns the new tick value. Called from interrupt context only.
    #[inline]
    pub fn advance(&self) -> u32 {
        // Single writer (the non-reentrant tick ISR): load/store is enough
        // and avoids requiring atomic read-modify-write on the core.
        let next = self.ticks.load(Ordering::Relaxed).wrapping_add(1);
        self.ticks.store(next, Ordering::Release);
        self.pending.store(true, Ordering::Release);
        next
    }

    /// Current tick value.
    #[inline]
    pub fn now(&self) -> u32 {
        self.ticks.load(Ordering::Acquire)
    }

    /// Whether a tick has fired since the last [`clear_pending`](Self::clear_pending).
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    #[inline]
    pub fn clear_pending(&self) {
        self.pending.store(false, Ordering::Release);
    }

    /// Cold start: counter back to zero, no tick pending.
    pub fn reset(&self) {
        self.ticks.store(0, Ordering::Release);
        self.pending.store(false, Ordering::Release);
    }
}

impl Default for TickSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_sets_pending() {
        let tick = TickSource::new();
        assert_eq!(tick.now(), 0);
        assert!(!tick.is_pending());

        assert_eq!(tick.advance(), 1);
        assert!(tick.is_pending());

        tick.clear_pending();
        assert!(!tick.is_pending());
        assert_eq!(tick.now(), 1);
    }

    #[test]
    fn test_counter_wraps() {
        let tick = TickSource::starting_at(u32::MAX);
        assert!(!tick.is_pending());
        assert_eq!(tick.advance(), 0);
    }

    #[test]
    fn test_elapsed_across_wrap() {
        assert_eq!(elapsed(10, 4), 6);
        assert_eq!(elapsed(2, u32::MAX - 2), 5);
        assert_eq!(elapsed(7, 7), 0);
    }
}
