//! # Scheduler State
//!
//! The only state shared between the SysTick handler and the dispatch
//! loop. It is an explicit object (one `static` instance in `kernel`,
//! local instances in tests) injected by reference into both sides:
//!
//! | Value          | Written by              | Read by         |
//! |----------------|-------------------------|-----------------|
//! | tick counter   | tick handler            | dispatcher, tasks |
//! | tick pending   | tick handler (set), dispatcher (clear) | dispatcher |
//! | task running   | dispatcher              | tick handler    |
//! | stall budget   | dispatcher (arm), tick handler (count) | tick handler |
//!
//! Each value is an atomic; multi-value reads go through [`snapshot`].
//!
//! [`snapshot`]: SchedulerState::snapshot

use crate::guard::{GuardState, StallGuard};
use crate::sync;
use crate::tick::TickSource;

/// Result of one tick interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    /// Normal tick.
    Continue,
    /// The running task exhausted its execution budget.
    Stalled,
}

/// Consistent view of the clock taken by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSnapshot {
    pub now: u32,
    pub pending: bool,
}

/// The unrecoverable exit taken when a task stalls.
///
/// Implementations must not return: the stalled task's state is assumed
/// corrupt and the whole system restarts from initialization.
pub trait ResetLine {
    fn reset(&mut self) -> !;
}

pub struct SchedulerState {
    tick: TickSource,
    guard: StallGuard,
}

impl SchedulerState {
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    /// State with the clock preset to `tick`.
    pub const fn starting_at(tick: u32) -> Self {
        Self {
            tick: TickSource::starting_at(tick),
            guard: StallGuard::new(),
        }
    }

    /// Tick interrupt body: advance the clock, then count down the stall
    /// budget if a task is executing.
    pub fn on_tick(&self) -> TickOutcome {
        self.tick.advance();
        match self.guard.on_tick() {
            GuardState::Reset => TickOutcome::Stalled,
            GuardState::Idle | GuardState::Running => TickOutcome::Continue,
        }
    }

    /// Current tick value, for collaborators timing their own sub-periods.
    #[inline]
    pub fn now(&self) -> u32 {
        self.tick.now()
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.tick.is_pending()
    }

    #[inline]
    pub fn clear_pending(&self) {
        self.tick.clear_pending();
    }

    /// Read the counter and the pending flag with the tick interrupt masked.
    pub fn snapshot(&self) -> TickSnapshot {
        sync::critical_section(|_cs| TickSnapshot {
            now: self.tick.now(),
            pending: self.tick.is_pending(),
        })
    }

    /// Mark a task as running with `budget` ticks of allowance.
    #[inline]
    pub fn begin_task(&self, budget: u32) {
        self.guard.arm(budget);
    }

    /// Mark the running task as returned.
    #[inline]
    pub fn end_task(&self) {
        self.guard.disarm();
    }

    pub fn guard_state(&self) -> GuardState {
        self.guard.state()
    }

    /// Cold start: everything back to power-on values.
    pub fn reset(&self) {
        sync::critical_section(|_cs| {
            self.tick.reset();
            self.guard.reset();
        });
    }
}

impl Default for SchedulerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Tick interrupt entry point: runs [`SchedulerState::on_tick`] and takes
/// the reset line on a stall. Never returns to the interrupted task in
/// that case.
pub fn handle_tick<R: ResetLine>(state: &SchedulerState, reset: &mut R) {
    if state.on_tick() == TickOutcome::Stalled {
        crate::log_error!("task exceeded execution budget at tick {}, resetting", state.now());
        reset.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PanicReset;

    impl ResetLine for PanicReset {
        fn reset(&mut self) -> ! {
            panic!("reset line taken");
        }
    }

    #[test]
    fn test_tick_advances_clock() {
        let state = SchedulerState::new();
        assert_eq!(state.on_tick(), TickOutcome::Continue);
        assert_eq!(state.on_tick(), TickOutcome::Continue);

        let snap = state.snapshot();
        assert_eq!(snap.now, 2);
        assert!(snap.pending);

        state.clear_pending();
        assert!(!state.snapshot().pending);
    }

    #[test]
    fn test_stall_after_budget() {
        let state = SchedulerState::new();
        state.begin_task(100);
        for _ in 0..99 {
            assert_eq!(state.on_tick(), TickOutcome::Continue);
        }
        assert_eq!(state.on_tick(), TickOutcome::Stalled);
        assert_eq!(state.guard_state(), GuardState::Reset);
    }

    #[test]
    fn test_finished_task_never_stalls() {
        let state = SchedulerState::new();
        state.begin_task(5);
        state.on_tick();
        state.end_task();
        for _ in 0..100 {
            assert_eq!(state.on_tick(), TickOutcome::Continue);
        }
    }

    #[test]
    fn test_handle_tick_without_stall_returns() {
        let state = SchedulerState::new();
        handle_tick(&state, &mut PanicReset);
        assert_eq!(state.now(), 1);
    }

    #[test]
    #[should_panic(expected = "reset line taken")]
    fn test_handle_tick_takes_reset_line() {
        let state = SchedulerState::new();
        state.begin_task(2);
        handle_tick(&state, &mut PanicReset);
        handle_tick(&state, &mut PanicReset);
    }

    #[test]
    fn test_reset_is_cold_start() {
        let state = SchedulerState::new();
        state.begin_task(1);
        state.on_tick();
        assert_eq!(state.guard_state(), GuardState::Reset);

        state.reset();
        assert_eq!(state.now(), 0);
        assert!(!state.is_pending());
        assert_eq!(state.guard_state(), GuardState::Idle);
    }
}
