//! Cross-architecture CPU capability probe.
//!
//! [`core::hardware::detect`] builds a [`CapabilityRecord`] once at startup;
//! the `rvv_selftest` binary decides whether the RISC-V vector path is usable.

pub mod core;
pub mod simd;

pub use crate::core::hardware::{detect, detect_with};
pub use crate::core::record::{Brand, CapabilityRecord, Flags};
