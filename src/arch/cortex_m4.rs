//! # Cortex-M4 Port Layer
//!
//! Hardware-specific code for the ARM Cortex-M4 (STM32F4 reference board):
//! SysTick as the scheduler tick, the SysTick exception handler, the
//! independent-watchdog reset used by the stall guard, and `wfi` as the
//! idle wait of the dispatch loop.
//!
//! ## Interrupt Priorities
//!
//! The dispatch loop runs in thread mode, so SysTick preempts it at any
//! instruction boundary. SysTick is raised to the highest configurable
//! priority so a task stuck in a lower-priority ISR is still caught by
//! the stall guard.

use cortex_m::peripheral::scb::SystemHandler;
use cortex_m::peripheral::syst::SystClkSource;

use crate::config::{SYSTEM_CLOCK_HZ, TICK_HZ, WATCHDOG_PRESCALER, WATCHDOG_RELOAD};
use crate::kernel;
use crate::scheduler::Idle;
use crate::state::{ResetLine, SchedulerState};

// ---------------------------------------------------------------------------
// SysTick configuration
// ---------------------------------------------------------------------------

/// Configure the SysTick timer for the scheduler tick.
///
/// Sets up SysTick to fire at `TICK_HZ` frequency using the processor
/// clock. Each tick enters `SysTick` below.
pub fn configure_systick(syst: &mut cortex_m::peripheral::SYST) {
    let reload = SYSTEM_CLOCK_HZ / TICK_HZ - 1;
    syst.set_reload(reload);
    syst.clear_current();
    syst.set_clock_source(SystClkSource::Core);
    syst.enable_counter();
    syst.enable_interrupt();
}

/// Give SysTick the highest configurable exception priority.
pub fn set_systick_priority(scb: &mut cortex_m::peripheral::SCB) {
    unsafe {
        scb.set_priority(SystemHandler::SysTick, 0x00);
    }
}

// ---------------------------------------------------------------------------
// Stall reset
// ---------------------------------------------------------------------------

/// STM32F4 independent watchdog (IWDG) register block.
const IWDG_KR: *mut u32 = 0x4000_3000 as *mut u32;
const IWDG_PR: *mut u32 = 0x4000_3004 as *mut u32;
const IWDG_RLR: *mut u32 = 0x4000_3008 as *mut u32;
const IWDG_SR: *const u32 = 0x4000_300C as *const u32;

const KEY_START: u32 = 0xCCCC;
const KEY_UNLOCK: u32 = 0x5555;
const KEY_RELOAD: u32 = 0xAAAA;

/// Reset path for a stalled task: start the independent watchdog with
/// the shortest timeout and spin until it fires.
///
/// The IWDG runs from its own LSI clock and cannot be stopped once
/// started, so the reset happens even if the core is wedged.
pub struct IwdgReset;

impl ResetLine for IwdgReset {
    fn reset(&mut self) -> ! {
        cortex_m::interrupt::disable();
        unsafe {
            core::ptr::write_volatile(IWDG_KR, KEY_START);
            core::ptr::write_volatile(IWDG_KR, KEY_UNLOCK);
            core::ptr::write_volatile(IWDG_PR, WATCHDOG_PRESCALER);
            core::ptr::write_volatile(IWDG_RLR, WATCHDOG_RELOAD);
            // PVU/RVU clear once the new values reach the LSI domain
            while core::ptr::read_volatile(IWDG_SR) & 0b11 != 0 {}
            core::ptr::write_volatile(IWDG_KR, KEY_RELOAD);
        }
        loop {
            cortex_m::asm::nop();
        }
    }
}

// ---------------------------------------------------------------------------
// Idle
// ---------------------------------------------------------------------------

/// Sleep until the next interrupt. SysTick wakes the core every tick.
///
/// The pending check and `wfi` run with interrupts masked. A SysTick that
/// becomes pending in between still wakes the core, and its handler runs
/// as soon as the mask is lifted.
#[derive(Debug, Default, Clone, Copy)]
pub struct Wfi;

impl Idle for Wfi {
    #[inline]
    fn park(&mut self, state: &SchedulerState) {
        cortex_m::interrupt::free(|_| {
            if !state.is_pending() {
                cortex_m::asm::wfi();
            }
        });
    }
}

// ---------------------------------------------------------------------------
// SysTick handler
// ---------------------------------------------------------------------------

/// SysTick exception handler: scheduler tick entry point.
///
/// Called at `TICK_HZ` frequency. Advances the kernel clock and, if a
/// task has overrun its execution budget, resets the MCU without
/// returning to it.
#[no_mangle]
pub unsafe extern "C" fn SysTick() {
    kernel::on_tick(&mut IwdgReset);
}
