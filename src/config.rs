//! # Kernel Configuration
//!
//! Compile-time constants governing the scheduler and system behavior.
//! All limits are fixed at compile time: no dynamic allocation, no
//! persisted settings.

/// Number of task slots in the kernel registry.
/// Registration beyond this fails with `KernelError::RegistryFull`;
/// there is no runtime growth.
pub const MAX_TASKS: usize = 3;

/// SysTick frequency in Hz. One tick is the scheduler's unit of time,
/// so at 1 kHz every period and budget below is in milliseconds.
pub const TICK_HZ: u32 = 1000;

/// Execution allowance for a single task invocation, in ticks (100 ms).
/// A task still running when this many ticks have fired is considered
/// hung and the MCU is reset.
pub const MAX_EXECUTION_TICKS: u32 = 100;

/// System clock frequency in Hz (default for STM32F4 at 16 MHz HSI).
pub const SYSTEM_CLOCK_HZ: u32 = 16_000_000;

/// Independent watchdog prescaler divider code. `0` selects /4, giving
/// an 8 kHz counter from the 32 kHz LSI.
pub const WATCHDOG_PRESCALER: u32 = 0;

/// Independent watchdog reload value. 120 counts at 8 kHz ≈ 15 ms,
/// the shortest practical timeout for the stall reset path.
pub const WATCHDOG_RELOAD: u32 = 120;
