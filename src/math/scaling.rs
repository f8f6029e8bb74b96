//! Exponent manipulation: frexp, ldexp, ilogb and copysign on raw bits.
//!
//! `ldexp` rounds correctly when the scaled value lands in the subnormal
//! range, which the double-double strategy relies on for its final step.

use super::{MANT_MASK, SIGN_MASK, f64_from_bits, f64_to_bits, get_exp_bits};

const TWO54: f64 = f64::from_bits(0x4350_0000_0000_0000);
const TWOM54: f64 = f64::from_bits(0x3c90_0000_0000_0000);
const HUGE: f64 = 1.0e300;
const TINY: f64 = 1.0e-300;

pub(crate) const FP_ILOGB0: i32 = i32::MIN;
pub(crate) const FP_ILOGBNAN: i32 = i32::MAX;

#[inline(always)]
pub(crate) fn copysign(x: f64, y: f64) -> f64 {
    f64_from_bits((f64_to_bits(x) & !SIGN_MASK) | (f64_to_bits(y) & SIGN_MASK))
}

/// Splits `x` into a significand in `[0.5, 1)` and a power of two.
#[inline(always)]
pub(crate) fn frexp(x: f64) -> (f64, i32) {
    let ux = f64_to_bits(x);
    let e = get_exp_bits(ux);
    if e == 0 {
        if x == 0.0 {
            return (x, 0);
        }
        let y = x * TWO54;
        let uy = f64_to_bits(y);
        let exp = get_exp_bits(uy) - 1022 - 54;
        let mant = (uy & (SIGN_MASK | MANT_MASK)) | (0x3feu64 << 52);
        return (f64_from_bits(mant), exp);
    }
    if e == 0x7ff {
        return (x, 0);
    }
    let mant = (ux & (SIGN_MASK | MANT_MASK)) | (0x3feu64 << 52);
    (f64_from_bits(mant), e - 1022)
}

/// `x * 2^n` with a single rounding.
#[inline(always)]
pub(crate) fn ldexp(mut x: f64, n: i32) -> f64 {
    if n == 0 {
        return x;
    }

    let mut ix = f64_to_bits(x);
    let mut k = get_exp_bits(ix);
    if k == 0 {
        if (ix & MANT_MASK) == 0 {
            return x;
        }
        x *= TWO54;
        ix = f64_to_bits(x);
        k = get_exp_bits(ix) - 54;
    }
    if k == 0x7ff {
        return x + x;
    }
    if n < -50000 {
        return TINY * copysign(TINY, x);
    }
    if n > 50000 || (k as i64 + n as i64) > 0x7fe {
        return HUGE * copysign(HUGE, x);
    }

    k += n;
    if k > 0 {
        return f64_from_bits((ix & !(0x7ffu64 << 52)) | ((k as u64) << 52));
    }
    if k <= -54 {
        return TINY * copysign(TINY, x);
    }
    k += 54;
    f64_from_bits((ix & !(0x7ffu64 << 52)) | ((k as u64) << 52)) * TWOM54
}

/// Unbiased exponent of `x`, treating subnormals as if normalized.
#[inline(always)]
pub(crate) fn ilogb(x: f64) -> i32 {
    let ux = f64_to_bits(x) & !SIGN_MASK;
    if ux == 0 {
        return FP_ILOGB0;
    }
    let exp = get_exp_bits(ux);
    if exp == 0x7ff {
        return FP_ILOGBNAN;
    }
    if exp == 0 {
        let k = 63 - (ux & MANT_MASK).leading_zeros();
        return k as i32 - 1074;
    }
    exp - 1023
}
