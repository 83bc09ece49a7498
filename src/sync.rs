//! # Synchronization Primitives
//!
//! Interrupt-safe critical section abstractions. Shared state that spans
//! more than one atomic value (the tick snapshot, the global registry)
//! must be accessed within a critical section so the SysTick handler
//! cannot interleave with the main loop.
//!
//! On the target the implementation comes from `cortex-m`'s
//! `critical-section-single-core` feature (PRIMASK); on the host it is
//! the `critical-section` std implementation.

pub use critical_section::{CriticalSection, Mutex};

/// Execute a closure within a critical section (interrupts disabled).
///
/// Interrupts are disabled on entry and restored on exit, ensuring
/// atomicity of the enclosed operation.
///
/// # Usage
/// ```ignore
/// sync::critical_section(|cs| {
///     // Access shared state safely
/// });
/// ```
///
/// Keep critical sections short: a tick that arrives while one is held
/// is serviced late, not lost.
#[inline]
pub fn critical_section<F, R>(f: F) -> R
where
    F: FnOnce(CriticalSection<'_>) -> R,
{
    critical_section::with(f)
}
