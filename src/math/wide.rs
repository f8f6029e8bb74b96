/// Full 128-bit product of `x` and `y` as `(hi, lo)`.
///
/// Built from four 32x32->64 partial products so it never needs a wider
/// integer type than the operands.
#[inline(always)]
pub fn mul_wide(x: u64, y: u64) -> (u64, u64) {
    let xlo = x & 0xffff_ffff;
    let xhi = x >> 32;
    let ylo = y & 0xffff_ffff;
    let yhi = y >> 32;

    let t = xlo * ylo;
    let w0 = t & 0xffff_ffff;
    let k = t >> 32;

    let t = xhi * ylo + k;
    let w1 = t & 0xffff_ffff;
    let w2 = t >> 32;

    let t = xlo * yhi + w1;
    let k = t >> 32;

    let lo = (t << 32) | w0;
    let hi = xhi * yhi + w2 + k;
    (hi, lo)
}
