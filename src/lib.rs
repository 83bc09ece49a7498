//! # kzero: Kernel Zero
//!
//! A cooperative, non-preemptive task scheduler for single-core ARM
//! Cortex-M microcontrollers.
//!
//! ## Overview
//!
//! A fixed pool of periodic tasks is driven from a 1 ms hardware tick.
//! Once per tick the dispatch loop runs every due task, in registration
//! order, each to completion. A stall guard counts ticks while a task is
//! running; a task that overruns its execution allowance resets the MCU
//! through the watchdog.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │            Application Tasks (impl Task / FnMut)       │
//! ├────────────────────────────────────────────────────────┤
//! │                 Kernel API (kernel.rs)                 │
//! │      init() · add_task() · remove_task() · start()     │
//! ├──────────────┬─────────────────┬───────────────────────┤
//! │  Scheduler   │  Task Registry  │  Scheduler State      │
//! │  scheduler.rs│  registry.rs    │  state.rs             │
//! │  ─ dispatch  │  ─ register()   │  ─ tick.rs (clock)    │
//! │  ─ run()     │  ─ remove()     │  ─ guard.rs (stall)   │
//! ├──────────────┴─────────────────┴───────────────────────┤
//! │            Arch Port (arch/cortex_m4.rs)               │
//! │       SysTick · IWDG reset · wfi                       │
//! ├────────────────────────────────────────────────────────┤
//! │         ARM Cortex-M4 Hardware (Thumb-2)               │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Timing Model
//!
//! - A task with period `P` is due when strictly more than `P` ticks have
//!   passed since its last run, so it runs every `P + 1` ticks.
//! - At most one run per task per tick; missed periods are not replayed.
//! - Within a tick, earlier slots run first, each to completion.
//!
//! ## Memory Model
//!
//! - **No heap**: all kernel state is statically allocated
//! - **Fixed-size registry**: `config::MAX_TASKS` slots
//! - **Shared state**: atomics plus `critical-section` for the tick
//!   handler ↔ dispatch loop boundary

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod error;
pub mod guard;
pub mod kernel;
pub mod logging;
pub mod registry;
pub mod scheduler;
pub mod segments;
pub mod state;
pub mod sync;
pub mod task;
pub mod tick;

#[cfg(all(target_arch = "arm", target_os = "none"))]
pub mod arch;

pub use error::KernelError;
pub use registry::Registry;
pub use scheduler::{Idle, Scheduler, Spin};
pub use state::{ResetLine, SchedulerState, TickOutcome};
pub use task::{Task, TaskDescriptor, TaskHandle, TaskInfo};
