//! # Task Model
//!
//! Defines what the scheduler runs. A task is any value implementing
//! [`Task`]: a single `run` method, invoked to completion once per due
//! period. Closures implement it automatically, and stateful tasks keep
//! their state in their own fields instead of function-local statics.
//!
//! ## Collaborator Contract
//!
//! A task must:
//! - return within `config::MAX_EXECUTION_TICKS` ticks (or the stall
//!   guard resets the MCU),
//! - never block indefinitely on external hardware,
//! - never keep interrupts disabled for more than a short, bounded window,
//! - never try to change the registry while it runs.

use crate::tick;

// ---------------------------------------------------------------------------
// Task trait
// ---------------------------------------------------------------------------

/// A periodic unit of work.
pub trait Task {
    /// Perform one invocation. Must run to completion without waiting
    /// for a later tick.
    fn run(&mut self);
}

impl<F> Task for F
where
    F: FnMut(),
{
    #[inline]
    fn run(&mut self) {
        self()
    }
}

// ---------------------------------------------------------------------------
// Task handle
// ---------------------------------------------------------------------------

/// Identity of a registered task.
///
/// Handles are chosen by the application (typically one `const` per task)
/// and are what the registry uses to recognise a task: registering the
/// same handle twice updates the existing slot instead of occupying a
/// second one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskHandle(u16);

impl TaskHandle {
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    pub const fn id(&self) -> u16 {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Task descriptor
// ---------------------------------------------------------------------------

/// Scheduling information for one task.
///
/// The descriptor borrows its task: the task's storage belongs to whoever
/// created it (for firmware, a `static`), never to the registry.
pub struct TaskDescriptor<'a> {
    /// The callable.
    pub(crate) task: &'a mut dyn Task,

    /// Optional label for diagnostics. Not required to be unique.
    pub(crate) name: Option<&'static str>,

    /// Minimum ticks between two runs, exclusive: the task is due once
    /// more than `period` ticks have elapsed since `last_run`.
    pub(crate) period: u32,

    /// Disabled tasks keep their slot but are never dispatched.
    pub(crate) enabled: bool,

    /// Tick of the last dispatch (or of registration). Owned by the
    /// dispatcher.
    pub(crate) last_run: u32,

    /// Completed invocations.
    pub(crate) runs: u32,
}

impl<'a> TaskDescriptor<'a> {
    /// A new enabled, unnamed task with the given period.
    pub fn new(task: &'a mut dyn Task, period: u32) -> Self {
        Self {
            task,
            name: None,
            period,
            enabled: true,
            last_run: 0,
            runs: 0,
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn name(&self) -> Option<&'static str> {
        self.name
    }

    pub fn period(&self) -> u32 {
        self.period
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn last_run(&self) -> u32 {
        self.last_run
    }

    /// Whether the task should run at tick `now`.
    ///
    /// The comparison is strict, so a task with period `P` runs at most
    /// every `P + 1` ticks. A task that has been disabled for a long time
    /// is due immediately once re-enabled, with no catch-up runs.
    #[inline]
    pub fn is_due(&self, now: u32) -> bool {
        self.enabled && tick::elapsed(now, self.last_run) > self.period
    }

    /// Invoke the task and record the run as dispatched at tick `now`.
    pub(crate) fn invoke(&mut self, now: u32) {
        self.task.run();
        self.last_run = now;
        self.runs = self.runs.wrapping_add(1);
    }

    pub(crate) fn info(&self) -> TaskInfo {
        TaskInfo {
            name: self.name,
            period: self.period,
            enabled: self.enabled,
            last_run: self.last_run,
            runs: self.runs,
        }
    }
}

/// Copyable snapshot of a descriptor, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskInfo {
    pub name: Option<&'static str>,
    pub period: u32,
    pub enabled: bool,
    pub last_run: u32,
    pub runs: u32,
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        hits: u32,
    }

    impl Task for Counter {
        fn run(&mut self) {
            self.hits += 1;
        }
    }

    #[test]
    fn test_descriptor_defaults() {
        let mut noop = || {};
        let desc = TaskDescriptor::new(&mut noop, 5);
        assert_eq!(desc.period(), 5);
        assert!(desc.is_enabled());
        assert_eq!(desc.name(), None);
        assert_eq!(desc.last_run(), 0);

        let desc = desc.with_name("display").with_enabled(false);
        assert_eq!(desc.name(), Some("display"));
        assert!(!desc.is_enabled());
    }

    #[test]
    fn test_due_uses_strict_comparison() {
        let mut noop = || {};
        let desc = TaskDescriptor::new(&mut noop, 5);
        assert!(!desc.is_due(5));
        assert!(desc.is_due(6));
    }

    #[test]
    fn test_period_zero_runs_every_tick() {
        let mut noop = || {};
        let mut desc = TaskDescriptor::new(&mut noop, 0);
        assert!(!desc.is_due(0));
        assert!(desc.is_due(1));
        desc.invoke(1);
        assert!(desc.is_due(2));
    }

    #[test]
    fn test_disabled_never_due() {
        let mut noop = || {};
        let desc = TaskDescriptor::new(&mut noop, 1).with_enabled(false);
        assert!(!desc.is_due(1_000_000));
    }

    #[test]
    fn test_due_across_wraparound() {
        let mut noop = || {};
        let mut desc = TaskDescriptor::new(&mut noop, 10);
        desc.last_run = u32::MAX - 3;
        assert!(!desc.is_due(6));
        assert!(desc.is_due(7));
    }

    #[test]
    fn test_invoke_runs_stateful_task() {
        let mut counter = Counter { hits: 0 };
        {
            let mut desc = TaskDescriptor::new(&mut counter, 3);
            desc.invoke(4);
            desc.invoke(8);
            assert_eq!(desc.last_run(), 8);
            assert_eq!(desc.info().runs, 2);
        }
        assert_eq!(counter.hits, 2);
    }

    #[test]
    fn test_handle_identity() {
        const A: TaskHandle = TaskHandle::new(1);
        assert_eq!(A, TaskHandle::new(1));
        assert_ne!(A, TaskHandle::new(2));
        assert_eq!(A.id(), 1);
    }
}
