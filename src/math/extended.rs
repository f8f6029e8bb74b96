//! fma(x, y, z) in double-double arithmetic.
//!
//! Basic approach for round-to-nearest:
//!
//! ```text
//!     (xy.hi, xy.lo) = x * y          (exact)
//!     (r.hi, r.lo)   = xy.hi + z      (exact)
//!     adj = xy.lo + r.lo              (inexact; low bit is sticky)
//!     result = r.hi + adj             (correctly rounded)
//! ```
//!
//! The operands are first reduced to significands in `[0.5, 1)` so the
//! error-free transformations cannot overflow or underflow; the exponents
//! are put back with one exact (or, for subnormal results, one correctly
//! rounded) scaling at the end.

use super::{copysign, f64_from_bits, f64_to_bits, frexp, get_exp_bits, ilogb, ldexp, two_prod, two_sum};

const DBL_MANT_DIG: i32 = 53;

/// Unevaluated sum `hi + lo`.
#[derive(Debug, Copy, Clone, PartialEq)]
struct DoubleDouble {
    hi: f64,
    lo: f64,
}

impl DoubleDouble {
    #[inline(always)]
    fn add(a: f64, b: f64) -> DoubleDouble {
        let (hi, lo) = two_sum(a, b);
        DoubleDouble { hi, lo }
    }

    #[inline(always)]
    fn mul(a: f64, b: f64) -> DoubleDouble {
        let (hi, lo) = two_prod(a, b);
        DoubleDouble { hi, lo }
    }
}

/// Moves the last bit of `hi` one step towards `lo` so that it records
/// whether `lo` was nonzero.
#[inline(always)]
fn nudge(hi: f64, lo: f64) -> f64 {
    let uhi = f64_to_bits(hi);
    let ulo = f64_to_bits(lo);
    if ((uhi ^ ulo) >> 63) == 0 {
        f64_from_bits(uhi + 1)
    } else {
        f64_from_bits(uhi - 1)
    }
}

/// `a + b` rounded so that a later addition of the result to a larger value
/// rounds as if the full sum were used: an even last bit of the rounded sum
/// is made odd when the sum was inexact.
#[inline(always)]
fn add_adjusted(a: f64, b: f64) -> f64 {
    let sum = DoubleDouble::add(a, b);
    if sum.lo != 0.0 && (f64_to_bits(sum.hi) & 1) == 0 {
        return nudge(sum.hi, sum.lo);
    }
    sum.hi
}

/// `ldexp(a + b, scale)` for a result in the subnormal range.
///
/// Losing at least two bits to denormalization turns the first lost bit into
/// a round bit, so the last bit of `sum.hi` is adjusted into a sticky bit and
/// the scaling breaks ties correctly. Losing exactly one bit means the tie
/// has to be broken here instead.
#[inline]
fn add_and_denormalize(a: f64, b: f64, scale: i32) -> f64 {
    let mut sum = DoubleDouble::add(a, b);
    if sum.lo != 0.0 {
        let uhi = f64_to_bits(sum.hi);
        let bits_lost = -get_exp_bits(uhi) - scale + 1;
        if (bits_lost != 1) ^ ((uhi & 1) != 0) {
            sum.hi = nudge(sum.hi, sum.lo);
        }
    }
    ldexp(sum.hi, scale)
}

/// Fused multiply-add `x * y + z` with a single rounding, computed with
/// double-double error-free transformations.
pub fn fma_extended(x: f64, y: f64, z: f64) -> f64 {
    if x == 0.0 || y == 0.0 {
        return x * y + z;
    }
    if z == 0.0 {
        return x * y;
    }
    if !x.is_finite() || !y.is_finite() {
        return x * y + z;
    }
    if !z.is_finite() {
        return z;
    }

    let (xs, ex) = frexp(x);
    let (ys, ey) = frexp(y);
    let (mut zs, ez) = frexp(z);
    let mut spread = ex + ey - ez;

    // |x * y| < 2^(ez - 55): below half the spacing of doubles on either
    // side of z, even when z is a power of two
    if spread < -DBL_MANT_DIG - 1 {
        return z;
    }
    if spread <= DBL_MANT_DIG * 2 {
        zs = ldexp(zs, -spread);
    } else {
        // z only matters as a sticky bit below x * y
        zs = copysign(f64::MIN_POSITIVE, zs);
    }

    let xy = DoubleDouble::mul(xs, ys);
    let r = DoubleDouble::add(xy.hi, zs);

    spread = ex + ey;

    if r.hi == 0.0 {
        // xy.hi and zs cancelled exactly; xy.lo carries the result and its
        // sign, even when the scaling underflows to zero
        return ldexp(xy.lo, spread);
    }

    let adj = add_adjusted(r.lo, xy.lo);
    let sum = r.hi + adj;
    // decide on the rounded sum: r.hi may sit on a binade edge that adj
    // pulls below the normal range
    if spread + ilogb(sum) > -1023 {
        ldexp(sum, spread)
    } else {
        add_and_denormalize(r.hi, adj, spread)
    }
}
