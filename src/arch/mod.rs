//! # Architecture Abstraction Layer
//!
//! Hardware boundary of the kernel: the tick timer, the tick exception
//! handler, the watchdog reset path and the low-power wait. Only built
//! for bare-metal ARM; everything above it runs on the host as well.

pub mod cortex_m4;
