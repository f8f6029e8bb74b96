//! fma(x, y, z) straight on the IEEE bit fields.
//!
//! Mantissas are kept with their leading one at bit 61 of the high word of a
//! two-word (128-bit) accumulator, 10 rounding bits below the 53 kept ones.
//! The exponent travels biased, so a value is `mant * 2^(exp - 1023 - 62)`
//! once normalized to bit 62 for packing. The smaller operand is always
//! shifted towards the larger one, which keeps the subtraction borrow-free.

use super::{QNAN_BITS, f64_from_bits, f64_to_bits, mul_wide, shr_sticky};

const EXP_SIZE: u32 = 11;
const MANT_SIZE: u32 = 52;
const EXP_MASK: i32 = (1 << EXP_SIZE) - 1;
const MANT_MASK: u64 = (1u64 << MANT_SIZE) - 1;
/// Position of the leading one when rounding.
const IMANT_SIZE: u32 = 62;
const RND_SIZE: u32 = IMANT_SIZE - MANT_SIZE;

#[inline(always)]
fn pack(sign: bool, exp: i32, mant: u64) -> f64 {
    f64_from_bits(((sign as u64) << 63) | ((exp as u64) << MANT_SIZE) | (mant & MANT_MASK))
}

#[inline(always)]
fn unpack(x: f64) -> (bool, i32, u64) {
    let ux = f64_to_bits(x);
    (
        (ux >> 63) != 0,
        ((ux >> MANT_SIZE) as i32) & EXP_MASK,
        ux & MANT_MASK,
    )
}

/// Shifts a nonzero subnormal mantissa up to the implicit-one position and
/// returns it with the exponent it would have as a normal number.
#[inline(always)]
fn normalize_subnormal(mant: u64) -> (u64, i32) {
    let shift = MANT_SIZE - (63 - mant.leading_zeros());
    (mant << shift, 1 - shift as i32)
}

/// Rounds to nearest-even and packs. `mant` has its leading one at bit 62
/// (or lower for results that are already subnormal), bit 0 sticky.
fn round_pack(sign: bool, mut exp: i32, mut mant: u64) -> f64 {
    let addend = 1u64 << (RND_SIZE - 1);
    if exp <= 0 {
        mant = shr_sticky(mant, (1 - exp) as u32);
        exp = 1;
    }
    let rnd_bits = mant & ((1u64 << RND_SIZE) - 1);
    mant = (mant + addend) >> RND_SIZE;
    if rnd_bits == addend {
        mant &= !1;
    }
    exp += (mant >> (MANT_SIZE + 1)) as i32;
    if mant <= MANT_MASK {
        // subnormal or zero
        exp = 0;
    } else if exp >= EXP_MASK {
        return pack(sign, EXP_MASK, 0);
    }
    pack(sign, exp, mant)
}

/// Single-word normalize: leading one to bit 62, then round.
#[inline]
fn normalize(sign: bool, exp: i32, mant: u64) -> f64 {
    let shift = mant.leading_zeros() as i32 - (63 - IMANT_SIZE as i32);
    round_pack(sign, exp - shift, mant << shift)
}

/// Two-word normalize: the top 63 significant bits of `mant1:mant0` go to
/// bit 62 of one word, the rest collapse into the sticky bit.
fn normalize2(sign: bool, mut exp: i32, mut mant1: u64, mut mant0: u64) -> f64 {
    let lz = if mant1 != 0 {
        mant1.leading_zeros()
    } else {
        64 + mant0.leading_zeros()
    };
    let shift = lz - (63 - IMANT_SIZE);
    exp -= shift as i32;
    if shift == 0 {
        mant1 |= (mant0 != 0) as u64;
    } else if shift < 64 {
        mant1 = (mant1 << shift) | (mant0 >> (64 - shift));
        mant0 <<= shift;
        mant1 |= (mant0 != 0) as u64;
    } else {
        mant1 = mant0 << (shift - 64);
    }
    round_pack(sign, exp, mant1)
}

/// Fused multiply-add `x * y + z` with a single rounding, computed on the
/// raw sign, exponent and mantissa fields.
pub fn fma_direct(x: f64, y: f64, z: f64) -> f64 {
    let (a_sign, mut a_exp, mut a_mant) = unpack(x);
    let (b_sign, mut b_exp, mut b_mant) = unpack(y);
    let (mut c_sign, mut c_exp, mut c_mant) = unpack(z);
    let mut r_sign = a_sign ^ b_sign;

    if a_exp == EXP_MASK || b_exp == EXP_MASK || c_exp == EXP_MASK {
        if x.is_nan() || y.is_nan() || z.is_nan() {
            return f64_from_bits(QNAN_BITS);
        }
        let a_zero = a_exp == 0 && a_mant == 0;
        let b_zero = b_exp == 0 && b_mant == 0;
        let product_inf = a_exp == EXP_MASK || b_exp == EXP_MASK;
        if (a_exp == EXP_MASK && b_zero)
            || (b_exp == EXP_MASK && a_zero)
            || (product_inf && c_exp == EXP_MASK && r_sign != c_sign)
        {
            return f64_from_bits(QNAN_BITS);
        }
        if c_exp == EXP_MASK {
            return pack(c_sign, EXP_MASK, 0);
        }
        return pack(r_sign, EXP_MASK, 0);
    }

    let c_zero = c_exp == 0 && c_mant == 0;
    if (a_exp == 0 && a_mant == 0) || (b_exp == 0 && b_mant == 0) {
        if c_zero {
            // -0 only when both addends are -0
            return pack(c_sign && r_sign, 0, 0);
        }
        return z;
    }

    if a_exp == 0 {
        (a_mant, a_exp) = normalize_subnormal(a_mant);
    } else {
        a_mant |= 1u64 << MANT_SIZE;
    }
    if b_exp == 0 {
        (b_mant, b_exp) = normalize_subnormal(b_mant);
    } else {
        b_mant |= 1u64 << MANT_SIZE;
    }

    // multiply: 125 or 126 bit product, leading one brought to bit 61 of r1
    let mut r_exp = a_exp + b_exp - (1 << (EXP_SIZE - 1)) + 3;
    let (mut r1, mut r0) = mul_wide(a_mant << RND_SIZE, b_mant << RND_SIZE);
    if r1 < (1u64 << 61) {
        r1 = (r1 << 1) | (r0 >> 63);
        r0 <<= 1;
        r_exp -= 1;
    }

    if c_zero {
        r1 |= (r0 != 0) as u64;
        return normalize(r_sign, r_exp, r1);
    }
    if c_exp == 0 {
        (c_mant, c_exp) = normalize_subnormal(c_mant);
    } else {
        c_mant |= 1u64 << MANT_SIZE;
    }
    // same scale as the product: leading one at bit 61 of c1
    c_exp += 1;
    let mut c1 = c_mant << (RND_SIZE - 1);
    let mut c0 = 0u64;

    // keep |r| >= |c|
    if !(r_exp > c_exp || (r_exp == c_exp && r1 >= c1)) {
        core::mem::swap(&mut r1, &mut c1);
        core::mem::swap(&mut r0, &mut c0);
        core::mem::swap(&mut r_exp, &mut c_exp);
        core::mem::swap(&mut r_sign, &mut c_sign);
    }

    let shift = (r_exp - c_exp) as u32;
    if shift >= 128 {
        c0 = ((c0 | c1) != 0) as u64;
        c1 = 0;
    } else if shift >= 65 {
        c0 = shr_sticky(c1, shift - 64) | (c0 != 0) as u64;
        c1 = 0;
    } else if shift == 64 {
        c0 = c1 | (c0 != 0) as u64;
        c1 = 0;
    } else if shift != 0 {
        let mask = (1u64 << shift) - 1;
        c0 = (c1 << (64 - shift)) | (c0 >> shift) | ((c0 & mask) != 0) as u64;
        c1 >>= shift;
    }

    if r_sign == c_sign {
        let (lo, carry) = r0.overflowing_add(c0);
        r0 = lo;
        r1 = r1 + c1 + carry as u64;
    } else {
        let (lo, borrow) = r0.overflowing_sub(c0);
        r0 = lo;
        r1 = r1 - c1 - borrow as u64;
        if (r0 | r1) == 0 {
            // exact cancellation rounds to +0
            return pack(false, 0, 0);
        }
    }

    normalize2(r_sign, r_exp, r1, r0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpack_pack() {
        assert_eq!(unpack(-1.5), (true, 0x3ff, 1u64 << 51));
        assert_eq!(unpack(f64::from_bits(1)), (false, 0, 1));
        assert_eq!(pack(false, 0x3ff, 0), 1.0);
        assert_eq!(pack(true, EXP_MASK, 0), f64::NEG_INFINITY);
        // the implicit bit is dropped by pack
        assert_eq!(pack(false, 0x400, 1u64 << 52), 2.0);
    }

    #[test]
    fn test_normalize_subnormal() {
        let (m, e) = normalize_subnormal(1);
        assert_eq!(m, 1u64 << 52);
        assert_eq!(e, -51);
        let (m, e) = normalize_subnormal(MANT_MASK);
        assert_eq!(m, MANT_MASK << 1);
        assert_eq!(e, 0);
    }

    #[test]
    fn test_round_pack() {
        let m = 1u64 << 62;
        assert_eq!(round_pack(false, 0x3ff, m), 1.0);
        assert_eq!(round_pack(true, 0x400, m), -2.0);
        assert_eq!(round_pack(false, 0x3ff, m | 0x200), 1.0);
        assert_eq!(round_pack(false, 0x3ff, m | 0x201), 1.0 + f64::EPSILON);
        assert_eq!(round_pack(false, 0x3ff, m | 0x600), 1.0 + 2.0 * f64::EPSILON);
        assert_eq!(round_pack(false, 0x3ff, u64::MAX >> 1), 2.0);
        assert_eq!(round_pack(false, 0x7fe, u64::MAX >> 1), f64::INFINITY);
        assert_eq!(round_pack(true, 0x900, m), f64::NEG_INFINITY);
    }

    #[test]
    fn test_round_pack_subnormal() {
        let m = 1u64 << 62;
        assert_eq!(round_pack(false, -51, m), f64::from_bits(1));
        // 2^-1075: tie between zero and the smallest subnormal
        assert_eq!(round_pack(false, -52, m).to_bits(), 0);
        assert_eq!(round_pack(false, -52, m | 1), f64::from_bits(1));
        assert_eq!(round_pack(true, -4000, m).to_bits(), (-0.0f64).to_bits());
        // largest subnormal rounding up to MIN_POSITIVE
        assert_eq!(round_pack(false, 0, u64::MAX >> 1), f64::MIN_POSITIVE);
    }

    #[test]
    fn test_normalize2() {
        // leading one one word down, nothing sticky
        assert_eq!(normalize2(false, 0x3ff + 64, 0, 1u64 << 62), 1.0);
        // carry into bit 62 keeps the exponent
        assert_eq!(normalize2(false, 0x3ff, 1u64 << 62, 0), 1.0);
        // bits below the kept word act as sticky
        assert_eq!(normalize2(false, 0x3ff, (1u64 << 62) | 0x200, 1), 1.0 + f64::EPSILON);
    }

    #[test]
    fn test_specials() {
        let inf = f64::INFINITY;
        assert_eq!(fma_direct(f64::NAN, 0.0, inf).to_bits(), QNAN_BITS);
        assert_eq!(fma_direct(inf, 0.0, 1.0).to_bits(), QNAN_BITS);
        assert_eq!(fma_direct(-0.0, -inf, 1.0).to_bits(), QNAN_BITS);
        assert_eq!(fma_direct(inf, 1.0, -inf).to_bits(), QNAN_BITS);
        assert_eq!(fma_direct(-inf, -1.0, inf), inf);
        assert_eq!(fma_direct(1.0, 1.0, -inf), -inf);
        assert_eq!(fma_direct(0.0, -1.0, 2.5), 2.5);
        assert_eq!(fma_direct(0.0, -1.0, -0.0).to_bits(), (-0.0f64).to_bits());
        assert_eq!(fma_direct(0.0, -1.0, 0.0).to_bits(), 0);
        assert_eq!(fma_direct(0.0, 1.0, -0.0).to_bits(), 0);
    }

    #[test]
    fn test_add_and_cancel() {
        assert_eq!(fma_direct(1.0, 1.0, 1.0), 2.0);
        assert_eq!(fma_direct(2.0, 3.0, -4.0), 2.0);
        assert_eq!(fma_direct(-3.0, 5.0, 15.0).to_bits(), 0);
        assert_eq!(fma_direct(3.0, 5.0, -15.0).to_bits(), 0);
        // (1 + 2^-26)^2 - 1 = 2^-25 + 2^-52
        let x = 1.0 + f64::from_bits(0x3e50_0000_0000_0000);
        let expected = f64::from_bits(0x3e60_0000_0000_0000) + f64::EPSILON;
        assert_eq!(fma_direct(x, x, -1.0), expected);
        assert_eq!(fma_direct(0.1, 10.0, -1.0), 5.551115123125783e-17);
        // the addend is larger than the product and gets swapped in
        assert_eq!(fma_direct(1e-10, 1e-10, 1.0), 1.0);
        assert_eq!(fma_direct(-1e-10, 1e-10, 1.0), 1.0);
        // 1.5 ulps below 1.0 ties to the even neighbour two ulps down
        assert_eq!(fma_direct(-f64::EPSILON, 0.75, 1.0), 1.0 - f64::EPSILON);
        let below = 1.0 - f64::EPSILON / 2.0;
        assert_eq!(fma_direct(below, 1.0, f64::EPSILON / 8.0), below);
        assert_eq!(fma_direct(below, 1.0, f64::EPSILON / 4.0), 1.0);
    }

    #[test]
    fn test_overflow_and_underflow() {
        assert_eq!(fma_direct(1e300, 1e300, -1.0), f64::INFINITY);
        assert_eq!(fma_direct(f64::MAX, 2.0, -f64::MAX), f64::MAX);
        assert_eq!(fma_direct(5e-324, 5e-324, 0.0).to_bits(), 0);
        assert_eq!(fma_direct(-5e-324, 5e-324, 0.0).to_bits(), (-0.0f64).to_bits());
        let x = f64::from_bits(0x0010_0000_0000_0001);
        assert_eq!(
            fma_direct(x, 0.5, -f64::from_bits(1)),
            f64::from_bits(0x0008_0000_0000_0000)
        );
        assert_eq!(
            fma_direct(f64::MIN_POSITIVE, 0.75, f64::from_bits(3)),
            f64::from_bits(0x000c_0000_0000_0003)
        );
    }
}
