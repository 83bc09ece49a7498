//! # Kernel
//!
//! Top-level kernel initialization and public API.
//!
//! The kernel owns the global scheduler state (shared with the SysTick
//! handler) and parks the task registry until the scheduler starts. All
//! registry access goes through critical sections.
//!
//! ## Startup Sequence
//!
//! ```text
//! reset_handler (cortex-m-rt)
//!   └─► main()
//!         ├─► kernel::init()        ← Cold-start state, empty registry
//!         ├─► kernel::add_task()    ← Register tasks (×N)
//!         └─► kernel::start()       ← Launch scheduler (no return)
//!               ├─► Configure SysTick
//!               ├─► Hand the registry to the Scheduler
//!               └─► Scheduler::run()
//! ```
//!
//! After `start()` the registry belongs to the dispatch loop and every
//! registration call fails with `KernelError::AlreadyStarted`.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use crate::config::MAX_TASKS;
use crate::error::KernelError;
use crate::registry::Registry;
use crate::scheduler::{Idle, Scheduler};
use crate::state::{self, ResetLine, SchedulerState};
use crate::sync::{self, Mutex};
use crate::task::{Task, TaskDescriptor, TaskHandle};

// ---------------------------------------------------------------------------
// Global kernel instance
// ---------------------------------------------------------------------------

/// Clock and stall guard shared with the SysTick handler.
static STATE: SchedulerState = SchedulerState::new();

/// The registry between `init()` and `start()`. `None` before `init()`
/// and after the scheduler has taken it.
struct Parked(Option<Registry<'static, MAX_TASKS>>);

// Safety: single-core target. The registry holds `&'static mut dyn Task`
// references that are only ever touched from thread mode, inside a
// critical section; the tick handler never reaches them.
unsafe impl Send for Parked {}

static REGISTRY: Mutex<RefCell<Parked>> = Mutex::new(RefCell::new(Parked(None)));

static STARTED: AtomicBool = AtomicBool::new(false);

// ---------------------------------------------------------------------------
// Kernel API
// ---------------------------------------------------------------------------

/// Initialize the kernel.
///
/// Resets the clock and the stall guard and installs an empty registry.
/// Calling it again before `start()` discards every registration.
///
/// # Returns
/// - `Err(KernelError::AlreadyStarted)` once the scheduler is running.
pub fn init() -> Result<(), KernelError> {
    sync::critical_section(|cs| {
        if STARTED.load(Ordering::Acquire) {
            return Err(KernelError::AlreadyStarted);
        }
        STATE.reset();
        REGISTRY.borrow_ref_mut(cs).0 = Some(Registry::new());
        Ok(())
    })?;

    crate::log_info!("kernel initialized, {} task slots", MAX_TASKS);
    Ok(())
}

/// Register a periodic task.
///
/// # Parameters
/// - `task`: the callable; must live for the rest of the program.
/// - `name`: optional diagnostic label.
/// - `period`: ticks; the task runs once more than `period` ticks have
///   elapsed since its last run (registration counts as a run).
/// - `enabled`: disabled tasks keep their slot but never run.
/// - `handle`: task identity. Registering a known handle again updates
///   that task in place.
///
/// # Example
/// ```ignore
/// const BLINK: TaskHandle = TaskHandle::new(0);
/// let blink = cortex_m::singleton!(: Blink = Blink::new()).unwrap();
/// kernel::add_task(blink, Some("blink"), 500, true, BLINK)?;
/// ```
pub fn add_task(
    task: &'static mut dyn Task,
    name: Option<&'static str>,
    period: u32,
    enabled: bool,
    handle: TaskHandle,
) -> Result<(), KernelError> {
    let now = STATE.now();
    let mut descriptor = TaskDescriptor::new(task, period).with_enabled(enabled);
    if let Some(name) = name {
        descriptor = descriptor.with_name(name);
    }

    let slot = with_registry(|registry| registry.register(handle, descriptor, now))?;
    crate::log_info!(
        "task {} registered in slot {} (period {}, enabled {})",
        handle.id(),
        slot,
        period,
        enabled
    );
    Ok(())
}

/// Unregister a task.
///
/// # Returns
/// - `Err(KernelError::NotFound)` if `handle` is not registered.
pub fn remove_task(handle: TaskHandle) -> Result<(), KernelError> {
    with_registry(|registry| registry.remove(handle))?;
    crate::log_info!("task {} removed", handle.id());
    Ok(())
}

/// Enable or disable a registered task before the scheduler starts.
pub fn set_task_enabled(handle: TaskHandle, enabled: bool) -> Result<(), KernelError> {
    with_registry(|registry| registry.set_enabled(handle, enabled))?;
    crate::log_debug!("task {} enabled: {}", handle.id(), enabled);
    Ok(())
}

/// Current tick count. Tasks use it to time sub-periods of their own.
#[inline]
pub fn now() -> u32 {
    STATE.now()
}

/// The global scheduler state, for the tick handler glue.
pub fn state() -> &'static SchedulerState {
    &STATE
}

/// Tick interrupt body for the global kernel. On a stall, `reset` is
/// taken and this never returns.
#[inline]
pub fn on_tick<R: ResetLine>(reset: &mut R) {
    state::handle_tick(&STATE, reset);
}

/// Move the registry into a new [`Scheduler`].
///
/// Marks the kernel as started: from here on the registry API reports
/// `KernelError::AlreadyStarted`.
pub fn take_scheduler<I: Idle>(idle: I) -> Result<Scheduler<'static, I, MAX_TASKS>, KernelError> {
    let registry = sync::critical_section(|cs| {
        if STARTED.load(Ordering::Acquire) {
            return Err(KernelError::AlreadyStarted);
        }
        let registry = REGISTRY
            .borrow_ref_mut(cs)
            .0
            .take()
            .ok_or(KernelError::NotInitialized)?;
        STARTED.store(true, Ordering::Release);
        Ok(registry)
    })?;

    Ok(Scheduler::new(registry, &STATE, idle))
}

/// Start the scheduler. **Does not return.**
///
/// Configures SysTick for `TICK_HZ`, hands the registry to the dispatch
/// loop and runs it, sleeping with `wfi` between ticks.
///
/// # Safety
/// - `init()` must have been called; otherwise the core halts here.
/// - Must be called from thread mode (not from an ISR).
#[cfg(all(target_arch = "arm", target_os = "none"))]
pub fn start(mut core_peripherals: cortex_m::Peripherals) -> ! {
    use crate::arch::cortex_m4;

    let scheduler = match take_scheduler(cortex_m4::Wfi) {
        Ok(scheduler) => scheduler,
        Err(err) => {
            crate::log_error!("cannot start scheduler: {}", err);
            loop {
                cortex_m::asm::wfi();
            }
        }
    };

    cortex_m4::set_systick_priority(&mut core_peripherals.SCB);
    cortex_m4::configure_systick(&mut core_peripherals.SYST);

    scheduler.run()
}

fn with_registry<R, F>(f: F) -> Result<R, KernelError>
where
    F: FnOnce(&mut Registry<'static, MAX_TASKS>) -> Result<R, KernelError>,
{
    sync::critical_section(|cs| {
        if STARTED.load(Ordering::Acquire) {
            return Err(KernelError::AlreadyStarted);
        }
        let mut parked = REGISTRY.borrow_ref_mut(cs);
        let registry = parked.0.as_mut().ok_or(KernelError::NotInitialized)?;
        f(registry)
    })
}

/// Back to power-on: uninitialized, not started (for testing only).
#[cfg(test)]
fn reset_kernel() {
    sync::critical_section(|cs| {
        STATE.reset();
        REGISTRY.borrow_ref_mut(cs).0 = None;
        STARTED.store(false, Ordering::Release);
    });
}
