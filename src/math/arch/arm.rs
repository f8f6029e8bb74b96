// 32-bit ARM: VFPv4 is the first VFP revision with a fused multiply-add.

#[cfg(target_os = "linux")]
pub(super) fn has_fma() -> bool {
    const HWCAP_VFPV4: libc::c_ulong = 1 << 16;
    // SAFETY: getauxval only reads the auxiliary vector the kernel handed us
    let hwcap = unsafe { libc::getauxval(libc::AT_HWCAP) };
    (hwcap & HWCAP_VFPV4) != 0
}

/// No feature query exists here, so the instruction is executed in a forked
/// child and a `SIGILL` there reads as "not supported".
#[cfg(all(unix, not(target_os = "linux"), target_feature = "vfp2"))]
pub(super) fn has_fma() -> bool {
    super::guarded::run(probe)
}

#[cfg(all(unix, not(target_os = "linux"), target_feature = "vfp2"))]
fn probe() {
    let mut acc = core::hint::black_box(1.0f64);
    let a = core::hint::black_box(2.0f64);
    let b = core::hint::black_box(3.0f64);
    // SAFETY: only ever run inside the guarded child
    unsafe {
        core::arch::asm!(
            ".fpu vfpv4",
            "vfma.f64 {acc}, {a}, {b}",
            acc = inout(dreg) acc,
            a = in(dreg) a,
            b = in(dreg) b,
            options(pure, nomem, nostack)
        );
    }
    core::hint::black_box(acc);
}

#[cfg(not(any(target_os = "linux", all(unix, target_feature = "vfp2"))))]
pub(super) fn has_fma() -> bool {
    false
}
