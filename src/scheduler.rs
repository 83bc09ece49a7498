//! # Scheduler
//!
//! The dispatch loop. Cooperative and single-threaded: tasks run one at
//! a time, to completion, from thread mode. The only thing that can
//! interrupt a task is the tick handler, which never switches tasks; it
//! only advances time and polices the stall budget.
//!
//! ## Dispatch Algorithm
//!
//! Forever:
//! 1. **Wait**: park via [`Idle`] until the tick-pending flag is set
//! 2. **Snapshot**: read the tick counter (interrupts masked)
//! 3. **Scan**: for each occupied slot, in slot order, if the task is
//!    enabled and `now - last_run > period`:
//!    a. arm the stall guard with the execution budget
//!    b. run the task to completion
//!    c. disarm the guard, set `last_run = now`
//! 4. **Acknowledge**: clear the tick-pending flag
//!
//! `last_run` records the tick the pass was dispatched on, not the tick
//! the task finished on, so a slow task is not credited for the time it
//! spent running. Ticks that fire during a pass are coalesced into the
//! next one.

use crate::config::MAX_EXECUTION_TICKS;
use crate::registry::Registry;
use crate::state::SchedulerState;

// ---------------------------------------------------------------------------
// Waiting for a tick
// ---------------------------------------------------------------------------

/// How the dispatch loop waits for the next tick.
pub trait Idle {
    /// Block or spin briefly unless a tick is already pending on `state`.
    ///
    /// The pending check and the wait must be atomic with respect to the
    /// tick interrupt: a tick that fires after the check must still end
    /// the wait. Called repeatedly until a tick is pending, so spurious
    /// returns are fine.
    fn park(&mut self, state: &SchedulerState);
}

/// Busy-wait. Portable; never lowers power.
#[derive(Debug, Default, Clone, Copy)]
pub struct Spin;

impl Idle for Spin {
    #[inline]
    fn park(&mut self, state: &SchedulerState) {
        if !state.is_pending() {
            core::hint::spin_loop();
        }
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// The dispatch loop and everything it owns.
///
/// Holds the registry by value: once a `Scheduler` exists, nothing else
/// can add, remove or toggle tasks except through it.
pub struct Scheduler<'a, I: Idle, const N: usize> {
    registry: Registry<'a, N>,
    state: &'a SchedulerState,
    idle: I,
    execution_budget: u32,
}

impl<'a, I: Idle, const N: usize> Scheduler<'a, I, N> {
    /// Create a scheduler over `registry`, using `state` as the clock
    /// shared with the tick handler.
    pub fn new(registry: Registry<'a, N>, state: &'a SchedulerState, idle: I) -> Self {
        Self {
            registry,
            state,
            idle,
            execution_budget: MAX_EXECUTION_TICKS,
        }
    }

    /// Override the per-invocation execution allowance (in ticks).
    pub fn with_execution_budget(mut self, ticks: u32) -> Self {
        self.execution_budget = ticks;
        self
    }

    /// Run forever. **Does not return.**
    pub fn run(mut self) -> ! {
        crate::log_info!(
            "scheduler running with {} of {} slots in use",
            self.registry.len(),
            N
        );
        loop {
            self.wait_for_tick();
            self.dispatch_pending();
        }
    }

    /// Park until the tick handler has raised the pending flag.
    pub fn wait_for_tick(&mut self) {
        while !self.state.is_pending() {
            self.idle.park(self.state);
        }
    }

    /// Run one dispatch pass if a tick is pending.
    ///
    /// # Returns
    /// Number of task invocations in the pass (0 if no tick was pending).
    pub fn dispatch_pending(&mut self) -> usize {
        let snapshot = self.state.snapshot();
        if !snapshot.pending {
            return 0;
        }

        let now = snapshot.now;
        let state = self.state;
        let budget = self.execution_budget;
        let mut dispatched = 0;

        self.registry.for_each_occupied(|_handle, descriptor| {
            if !descriptor.is_due(now) {
                return;
            }
            if let Some(name) = descriptor.name() {
                crate::log_debug!("tick {}: running {}", now, name);
            }

            state.begin_task(budget);
            descriptor.invoke(now);
            state.end_task();
            dispatched += 1;
        });

        self.state.clear_pending();
        dispatched
    }

    pub fn registry(&self) -> &Registry<'a, N> {
        &self.registry
    }

    /// Mutable registry access between passes. Never called from inside
    /// a task: tasks have no path to the scheduler.
    pub fn registry_mut(&mut self) -> &mut Registry<'a, N> {
        &mut self.registry
    }

    pub fn state(&self) -> &'a SchedulerState {
        self.state
    }

    pub fn execution_budget(&self) -> u32 {
        self.execution_budget
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
