//! Software fused multiply-add and shared bit helpers.
//!
//! Three independent emulations of IEEE-754 `fma` live here: an integer
//! mantissa path, a double-double path and a raw bit-field path. They share
//! nothing but the helpers in this file and the exact 64x64 multiply, and
//! every one of them rounds exactly once.

mod arch;
mod direct;
mod extended;
mod integer;
mod scaling;
mod utils;
mod wide;

pub use arch::hardware_fma_supported;
pub use direct::fma_direct;
pub use extended::fma_extended;
pub use integer::fma_integer;
pub use wide::mul_wide;

pub(crate) use scaling::{copysign, frexp, ilogb, ldexp};
pub(crate) use utils::{two_prod, two_sum};

// ========= bit helpers =========

pub(crate) const SIGN_MASK: u64 = 0x8000_0000_0000_0000u64;
pub(crate) const EXP_MASK: u64 = 0x7ff0_0000_0000_0000u64;
pub(crate) const MANT_MASK: u64 = 0x000f_ffff_ffff_ffffu64;
/// Canonical quiet NaN produced by the integer strategies.
pub(crate) const QNAN_BITS: u64 = 0x7ff8_0000_0000_0000u64;

#[inline(always)]
fn f64_from_bits(u: u64) -> f64 {
    f64::from_bits(u)
}
#[inline(always)]
fn f64_to_bits(x: f64) -> u64 {
    x.to_bits()
}

#[inline(always)]
fn get_exp_bits(u: u64) -> i32 {
    ((u >> 52) & 0x7ff) as i32
}

#[inline(always)]
fn is_nan_bits(u: u64) -> bool {
    (u & EXP_MASK) == EXP_MASK && (u & MANT_MASK) != 0
}
#[inline(always)]
fn is_inf_bits(u: u64) -> bool {
    (u & !SIGN_MASK) == EXP_MASK
}
#[inline(always)]
fn is_zero_bits(u: u64) -> bool {
    (u & !SIGN_MASK) == 0
}

/// `a` shifted right by `d`, with every discarded bit folded into bit 0.
#[inline(always)]
fn shr_sticky(a: u64, d: u32) -> u64 {
    if d == 0 {
        a
    } else if d >= 64 {
        (a != 0) as u64
    } else {
        (a >> d) | ((a & ((1u64 << d) - 1)) != 0) as u64
    }
}

/// Emulation strategy selector, mostly for tests and benchmarks that want to
/// sweep all three implementations with one loop.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub enum Strategy {
    /// [`fma_integer`]
    Integer,
    /// [`fma_extended`]
    Extended,
    /// [`fma_direct`]
    Direct,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Integer, Strategy::Extended, Strategy::Direct];

    pub const fn name(self) -> &'static str {
        match self {
            Strategy::Integer => "integer",
            Strategy::Extended => "extended",
            Strategy::Direct => "direct",
        }
    }

    #[inline]
    pub fn fma(self, x: f64, y: f64, z: f64) -> f64 {
        match self {
            Strategy::Integer => fma_integer(x, y, z),
            Strategy::Extended => fma_extended(x, y, z),
            Strategy::Direct => fma_direct(x, y, z),
        }
    }
}
