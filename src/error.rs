//! Kernel error types
//!
//! Every registry and kernel operation reports its outcome as a
//! `Result<_, KernelError>`. A stalled task is not an error value: it is
//! reported by the tick handler as `TickOutcome::Stalled` and ends in a
//! hardware reset.

use core::fmt;

/// Errors returned by the registry and the kernel API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KernelError {
    /// No empty slot is left in the task registry.
    RegistryFull,
    /// The handle is not registered.
    NotFound,
    /// `kernel::init()` has not been called yet.
    NotInitialized,
    /// The scheduler owns the registry; it can no longer be changed.
    AlreadyStarted,
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::RegistryFull => f.write_str("task registry is full"),
            KernelError::NotFound => f.write_str("task handle not registered"),
            KernelError::NotInitialized => f.write_str("kernel not initialized"),
            KernelError::AlreadyStarted => f.write_str("scheduler already started"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            std::format!("{}", KernelError::RegistryFull),
            "task registry is full"
        );
        assert_eq!(
            std::format!("{}", KernelError::NotFound),
            "task handle not registered"
        );
    }
}
