// CPUID/XGETBV query; the std macro also checks that the OS saves the AVX state.

#[inline]
pub(super) fn has_fma() -> bool {
    std::arch::is_x86_feature_detected!("fma")
}

#[cfg(all(test, target_arch = "x86_64"))]
#[target_feature(enable = "fma")]
pub(super) unsafe fn fma_hw(a: f64, b: f64, c: f64) -> f64 {
    use core::arch::x86_64::{_mm_cvtsd_f64, _mm_fmadd_sd, _mm_set_sd};
    #[allow(unused_unsafe)]
    unsafe {
        _mm_cvtsd_f64(_mm_fmadd_sd(_mm_set_sd(a), _mm_set_sd(b), _mm_set_sd(c)))
    }
}

#[cfg(all(test, target_arch = "x86"))]
#[target_feature(enable = "fma")]
pub(super) unsafe fn fma_hw(a: f64, b: f64, c: f64) -> f64 {
    use core::arch::x86::{_mm_cvtsd_f64, _mm_fmadd_sd, _mm_set_sd};
    #[allow(unused_unsafe)]
    unsafe {
        _mm_cvtsd_f64(_mm_fmadd_sd(_mm_set_sd(a), _mm_set_sd(b), _mm_set_sd(c)))
    }
}
