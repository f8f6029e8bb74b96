//! Correctly rounded software fused multiply-add for `f64`.
//!
//! `x * y + z` is computed as if with unbounded precision and rounded once,
//! to nearest with ties to even, for every input including subnormals,
//! signed zeros, infinities and NaNs. Three independent emulations are
//! provided ([`fma_integer`], [`fma_extended`], [`fma_direct`]); they agree
//! bit for bit apart from NaN payloads. [`hardware_fma_supported`] tells
//! callers whether the CPU could do the same in one instruction.

#![no_std]

#[cfg(any(feature = "std", test))]
extern crate std;

mod math;

pub use math::{Strategy, fma_direct, fma_extended, fma_integer, hardware_fma_supported, mul_wide};
