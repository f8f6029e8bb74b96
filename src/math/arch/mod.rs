// Hardware FMA detection, one entry point selected per architecture.

#[cfg(all(feature = "std", any(target_arch = "x86_64", target_arch = "x86")))]
mod x86;
#[cfg(all(feature = "std", target_arch = "arm"))]
mod arm;
#[cfg(all(
    feature = "std",
    unix,
    any(test, all(target_arch = "arm", not(target_os = "linux")))
))]
mod guarded;

/// Answer fixed by the compilation target, if it has one.
const STATIC_FMA: Option<bool> = if cfg!(any(
    target_feature = "fma",
    target_arch = "aarch64",
    target_arch = "powerpc64",
    target_arch = "s390x",
    all(target_arch = "riscv64", target_feature = "d"),
    all(target_arch = "arm", target_feature = "vfp4"),
)) {
    Some(true)
} else {
    None
};

#[cfg(all(feature = "std", test))]
static DETECT_CALLS: core::sync::atomic::AtomicUsize = core::sync::atomic::AtomicUsize::new(0);

#[cfg(all(feature = "std", any(target_arch = "x86_64", target_arch = "x86")))]
fn detect() -> bool {
    x86::has_fma()
}

#[cfg(all(feature = "std", target_arch = "arm"))]
fn detect() -> bool {
    arm::has_fma()
}

#[cfg(all(
    feature = "std",
    not(any(target_arch = "x86_64", target_arch = "x86", target_arch = "arm"))
))]
fn detect() -> bool {
    false
}

/// Whether the CPU running this process executes a fused multiply-add in
/// hardware.
///
/// The first call runs the platform check; the result is cached for the
/// lifetime of the process and every caller, on any thread, sees the same
/// value. The check never panics: anything that goes wrong while probing
/// reads as `false`.
#[cfg(feature = "std")]
pub fn hardware_fma_supported() -> bool {
    if let Some(known) = STATIC_FMA {
        return known;
    }
    static HAS_FMA: std::sync::OnceLock<bool> = std::sync::OnceLock::new();
    *HAS_FMA.get_or_init(|| {
        #[cfg(test)]
        DETECT_CALLS.fetch_add(1, core::sync::atomic::Ordering::SeqCst);
        let found = detect();
        log::debug!("hardware fma detected: {found}");
        found
    })
}

/// Whether the compilation target guarantees a hardware fused multiply-add.
/// Without `std` there is no runtime check, so an unknown target reads as
/// `false`.
#[cfg(not(feature = "std"))]
pub fn hardware_fma_supported() -> bool {
    STATIC_FMA.unwrap_or(false)
}
