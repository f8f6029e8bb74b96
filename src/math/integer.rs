//! fma(x, y, z) on integer mantissas.
//!
//! Each operand becomes a 64-bit mantissa with an explicit leading one and a
//! signed exponent. The product is formed exactly in 128 bits, the addend is
//! aligned against it with a sticky bit catching everything shifted out, and
//! the sum is rounded to nearest-even once when it is packed back into a
//! double. Subnormal results are pre-shifted with the same sticky rule so the
//! final rounding still happens exactly once.

use super::{
    EXP_MASK, MANT_MASK, QNAN_BITS, SIGN_MASK, f64_from_bits, f64_to_bits, get_exp_bits,
    is_inf_bits, is_nan_bits, is_zero_bits, mul_wide, shr_sticky,
};

// Exponent bias plus the 53 fraction positions below the leading one of `m`.
const EXP_BIAS_M: i32 = 0x3ff + 52 + 1;
/// Exponent [`Normalized::new`] gives infinities and NaNs; zero gets one more.
/// Every finite nonzero double lands strictly below it.
const ZEROINFNAN: i32 = 0x7ff - EXP_BIAS_M;

/// Operand as `(-1)^sign * m * 2^e`, with the leading one of `m` at bit 53
/// and bit 0 clear.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct Normalized {
    m: u64,
    e: i32,
    sign: bool,
}

impl Normalized {
    #[inline(always)]
    fn new(x: f64) -> Normalized {
        let ix = f64_to_bits(x);
        let sign = (ix & SIGN_MASK) != 0;
        let mut e = get_exp_bits(ix);
        let mut mant = ix & MANT_MASK;
        if e == 0 {
            if mant == 0 {
                e = 0x800;
            } else {
                // subnormal: move the leading one up to bit 52
                let shift = mant.leading_zeros() as i32 - 11;
                mant <<= shift;
                e = 1 - shift;
            }
        }
        let m = (mant | (1u64 << 52)) << 1;
        Normalized {
            m,
            e: e - EXP_BIAS_M,
            sign,
        }
    }
}

/// IEEE special cases, or `None` when the product is finite and nonzero and
/// the addend finite (possibly zero).
#[inline]
fn special(x: f64, y: f64, z: f64) -> Option<f64> {
    let (ux, uy, uz) = (f64_to_bits(x), f64_to_bits(y), f64_to_bits(z));
    if is_nan_bits(ux) || is_nan_bits(uy) || is_nan_bits(uz) {
        return Some(f64_from_bits(QNAN_BITS));
    }
    let product_sign = (ux ^ uy) & SIGN_MASK;
    let (x_inf, y_inf, z_inf) = (is_inf_bits(ux), is_inf_bits(uy), is_inf_bits(uz));
    let (x_zero, y_zero) = (is_zero_bits(ux), is_zero_bits(uy));
    if (x_inf && y_zero) || (y_inf && x_zero) {
        return Some(f64_from_bits(QNAN_BITS));
    }
    if x_inf || y_inf {
        if z_inf && (uz & SIGN_MASK) != product_sign {
            return Some(f64_from_bits(QNAN_BITS));
        }
        return Some(f64_from_bits(product_sign | EXP_MASK));
    }
    if z_inf {
        return Some(z);
    }
    if x_zero || y_zero {
        if is_zero_bits(uz) {
            // -0 only when both addends are -0
            return Some(f64_from_bits(product_sign & uz));
        }
        return Some(z);
    }
    None
}

/// Rounds `(-1)^sign * m * 2^e` to the nearest double, ties to even.
///
/// `m` must have its leading one at bit 62; bit 0 is sticky.
#[inline]
fn round_pack(sign: bool, m: u64, e: i32) -> f64 {
    let sign_bits = (sign as u64) << 63;
    // biased exponent of the leading one
    let biased = e + 62 + 0x3ff;
    if biased >= 0x7ff {
        return f64_from_bits(sign_bits | EXP_MASK);
    }
    let (m, field) = if biased <= 0 {
        (shr_sticky(m, (1 - biased) as u32), 0u64)
    } else {
        (m, (biased - 1) as u64)
    };
    let rem = m & 0x3ff;
    let mut q = m >> 10;
    if rem > 0x200 || (rem == 0x200 && (q & 1) != 0) {
        q += 1;
    }
    // the implicit bit in `q` carries into the exponent field, including the
    // subnormal -> normal and MAX -> infinity transitions
    let bits = (field << 52) + q;
    if bits >= EXP_MASK {
        return f64_from_bits(sign_bits | EXP_MASK);
    }
    f64_from_bits(sign_bits | bits)
}

/// Fused multiply-add `x * y + z` with a single rounding, computed on
/// integer mantissas and an exact 128-bit product.
pub fn fma_integer(x: f64, y: f64, z: f64) -> f64 {
    if let Some(r) = special(x, y, z) {
        return r;
    }

    let nx = Normalized::new(x);
    let ny = Normalized::new(y);
    let nz = Normalized::new(z);

    // product: top 20 or 21 bits of rhi and last 2 bits of rlo are 0
    let (mut rhi, mut rlo) = mul_wide(nx.m, ny.m);
    let mut e = nx.e + ny.e;
    let mut sign = nx.sign ^ ny.sign;

    let (mut zhi, mut zlo) = (0u64, 0u64);
    let mut nonzero = true;
    if nz.e <= ZEROINFNAN {
        // align: z <<= kz, r >>= kr with kz + kr == d, e tracks r's scale
        let mut d = nz.e - e;
        if d > 0 {
            if d < 64 {
                zlo = nz.m << d;
                zhi = nz.m >> (64 - d);
            } else {
                zhi = nz.m;
                e = nz.e - 64;
                d -= 64;
                if d == 0 {
                } else if d < 64 {
                    rlo = (rhi << (64 - d)) | (rlo >> d) | ((rlo << (64 - d)) != 0) as u64;
                    rhi >>= d;
                } else {
                    rlo = 1;
                    rhi = 0;
                }
            }
        } else {
            zlo = shr_sticky(nz.m, d.unsigned_abs());
        }

        if sign == nz.sign {
            let (lo, carry) = rlo.overflowing_add(zlo);
            rlo = lo;
            rhi = rhi.wrapping_add(zhi).wrapping_add(carry as u64);
        } else {
            let (lo, borrow) = rlo.overflowing_sub(zlo);
            rlo = lo;
            rhi = rhi.wrapping_sub(zhi).wrapping_sub(borrow as u64);
            if (rhi >> 63) != 0 {
                rlo = rlo.wrapping_neg();
                rhi = rhi.wrapping_neg().wrapping_sub((rlo != 0) as u64);
                sign = !sign;
            }
            nonzero = rhi != 0;
        }
    }

    // top 63 bits of the result into `m`, last bit sticky
    let (m, d) = if nonzero {
        e += 64;
        let d = rhi.leading_zeros() as i32 - 1;
        (
            (rhi << d) | (rlo >> (64 - d)) | ((rlo << d) != 0) as u64,
            d,
        )
    } else if rlo != 0 {
        let d = rlo.leading_zeros() as i32 - 1;
        if d < 0 {
            ((rlo >> 1) | (rlo & 1), d)
        } else {
            (rlo << d, d)
        }
    } else {
        // exact cancellation rounds to +0
        return 0.0;
    };
    e -= d;

    round_pack(sign, m, e)
}
