//! # Stall Guard
//!
//! Bounds how long a single task may occupy the processor. The dispatch
//! loop arms the guard right before invoking a task and disarms it when
//! the task returns; the tick handler counts the budget down in between.
//!
//! ```text
//!   ┌──────┐   arm(budget)   ┌─────────┐  budget hits 0  ┌───────┐
//!   │ Idle │ ──────────────► │ Running │ ──────────────► │ Reset │
//!   └──────┘ ◄────────────── └─────────┘                 └───────┘
//!               disarm()                       (terminal)
//! ```
//!
//! The guard is deliberately coarse: it knows that *a* task overran, not
//! which one.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Observable state of the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GuardState {
    /// No task executing; ticks do not touch the budget.
    Idle,
    /// A task is executing and the budget is counting down.
    Running,
    /// The budget ran out. Only a hardware reset leaves this state.
    Reset,
}

pub struct StallGuard {
    running: AtomicBool,
    remaining: AtomicU32,
    tripped: AtomicBool,
}

impl StallGuard {
    pub const fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            remaining: AtomicU32::new(0),
            tripped: AtomicBool::new(false),
        }
    }

    /// `Idle -> Running`. The budget is published before the running flag
    /// so the tick handler never counts down a stale value.
    pub fn arm(&self, budget: u32) {
        self.remaining.store(budget, Ordering::Release);
        self.running.store(true, Ordering::Release);
    }

    /// `Running -> Idle`.
    pub fn disarm(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Tick-handler side. Returns `GuardState::Reset` when the running
    /// task has used up its budget on this tick.
    pub fn on_tick(&self) -> GuardState {
        if self.tripped.load(Ordering::Acquire) {
            return GuardState::Reset;
        }
        if !self.running.load(Ordering::Acquire) {
            return GuardState::Idle;
        }

        let remaining = self.remaining.load(Ordering::Acquire).saturating_sub(1);
        self.remaining.store(remaining, Ordering::Release);
        if remaining == 0 {
            self.tripped.store(true, Ordering::Release);
            GuardState::Reset
        } else {
            GuardState::Running
        }
    }

    pub fn state(&self) -> GuardState {
        if self.tripped.load(Ordering::Acquire) {
            GuardState::Reset
        } else if self.running.load(Ordering::Acquire) {
            GuardState::Running
        } else {
            GuardState::Idle
        }
    }

    /// Ticks left before the running task is declared stalled.
    pub fn remaining(&self) -> u32 {
        self.remaining.load(Ordering::Acquire)
    }

    /// Cold start.
    pub fn reset(&self) {
        self.running.store(false, Ordering::Release);
        self.remaining.store(0, Ordering::Release);
        self.tripped.store(false, Ordering::Release);
    }
}

impl Default for StallGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_ignores_ticks() {
        let guard = StallGuard::new();
        for _ in 0..1000 {
            assert_eq!(guard.on_tick(), GuardState::Idle);
        }
        assert_eq!(guard.state(), GuardState::Idle);
    }

    #[test]
    fn test_trips_on_budget_exhaustion() {
        let guard = StallGuard::new();
        guard.arm(3);
        assert_eq!(guard.state(), GuardState::Running);

        assert_eq!(guard.on_tick(), GuardState::Running);
        assert_eq!(guard.on_tick(), GuardState::Running);
        assert_eq!(guard.remaining(), 1);
        assert_eq!(guard.on_tick(), GuardState::Reset);
        assert_eq!(guard.state(), GuardState::Reset);
    }

    #[test]
    fn test_disarm_returns_to_idle() {
        let guard = StallGuard::new();
        guard.arm(2);
        guard.on_tick();
        guard.disarm();
        assert_eq!(guard.state(), GuardState::Idle);
        assert_eq!(guard.on_tick(), GuardState::Idle);

        // Re-arming restores the full budget
        guard.arm(2);
        assert_eq!(guard.on_tick(), GuardState::Running);
    }

    #[test]
    fn test_reset_is_terminal() {
        let guard = StallGuard::new();
        guard.arm(1);
        assert_eq!(guard.on_tick(), GuardState::Reset);

        guard.disarm();
        assert_eq!(guard.state(), GuardState::Reset);
        assert_eq!(guard.on_tick(), GuardState::Reset);

        guard.reset();
        assert_eq!(guard.state(), GuardState::Idle);
    }

    #[test]
    fn test_zero_budget_trips_on_first_tick() {
        let guard = StallGuard::new();
        guard.arm(0);
        assert_eq!(guard.on_tick(), GuardState::Reset);
    }
}
