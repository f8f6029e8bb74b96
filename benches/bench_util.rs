#![allow(dead_code)]

use criterion::{BenchmarkGroup, Criterion, black_box};
use softfma::Strategy;
use std::sync::OnceLock;
use std::time::Duration;

const RNG_A: u64 = 6364136223846793005;
const RNG_C: u64 = 1442695040888963407;
const RNG_DENOM: f64 = (1u64 << 53) as f64;

pub type Fma = fn(f64, f64, f64) -> f64;

pub fn lcg_next(state: &mut u64) -> u64 {
    *state = state.wrapping_mul(RNG_A).wrapping_add(RNG_C);
    *state
}

pub fn uniform_f64(state: &mut u64) -> f64 {
    let bits = lcg_next(state) >> 11;
    (bits as f64) / RNG_DENOM
}

pub fn gen_triples(count: usize, min: f64, max: f64, seed: u64) -> Vec<(f64, f64, f64)> {
    let mut state = seed;
    let span = max - min;
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        let x = min + uniform_f64(&mut state) * span;
        let y = min + uniform_f64(&mut state) * span;
        let z = min + uniform_f64(&mut state) * span;
        values.push((x, y, z));
    }
    values
}

/// Triples with `z` close to `-(x * y)`, the cancellation-heavy path.
pub fn gen_cancelling(count: usize, seed: u64) -> Vec<(f64, f64, f64)> {
    let mut state = seed;
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        let x = 1.0 + uniform_f64(&mut state);
        let y = 1.0 + uniform_f64(&mut state);
        let z = -f64::from_bits((x * y).to_bits() ^ (lcg_next(&mut state) & 0xff));
        values.push((x, y, z));
    }
    values
}

/// Triples whose results land in the subnormal range.
pub fn gen_subnormal(count: usize, seed: u64) -> Vec<(f64, f64, f64)> {
    let mut state = seed;
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        let x = f64::from_bits((0x1ffu64 << 52) | (lcg_next(&mut state) & 0x000f_ffff_ffff_ffff));
        let y = f64::from_bits((0x200u64 << 52) | (lcg_next(&mut state) & 0x000f_ffff_ffff_ffff));
        let z = f64::from_bits(lcg_next(&mut state) & 0x800f_ffff_ffff_ffff);
        values.push((x, y, z));
    }
    values
}

fn bench_one(
    group: &mut BenchmarkGroup<'_, criterion::measurement::WallTime>,
    name: &str,
    inputs: &[(f64, f64, f64)],
    f: Fma,
) {
    group.bench_function(name, |b| {
        b.iter(|| {
            let mut acc = 0.0;
            for &(x, y, z) in inputs {
                acc += f(black_box(x), black_box(y), black_box(z));
            }
            black_box(acc)
        })
    });
}

/// Every emulation strategy, `f64::mul_add`, and the system libm `fma` when
/// one can be loaded.
pub fn bench_inputs3(
    group: &mut BenchmarkGroup<'_, criterion::measurement::WallTime>,
    inputs: &[(f64, f64, f64)],
) {
    bench_one(group, "integer", inputs, softfma::fma_integer);
    bench_one(group, "extended", inputs, softfma::fma_extended);
    bench_one(group, "direct", inputs, softfma::fma_direct);
    bench_one(group, "mul_add", inputs, f64::mul_add);
    if let Some(fma) = libm_fma() {
        group.bench_function("libm", |b| {
            b.iter(|| {
                let mut acc = 0.0;
                for &(x, y, z) in inputs {
                    acc += unsafe { fma(black_box(x), black_box(y), black_box(z)) };
                }
                black_box(acc)
            })
        });
    }
}

pub fn strategies() -> [Strategy; 3] {
    Strategy::ALL
}

pub fn configure_criterion() -> Criterion {
    Criterion::default()
        .sample_size(200)
        .measurement_time(Duration::from_secs(10))
        .warm_up_time(Duration::from_secs(5))
}

static LIBM_FMA: OnceLock<Option<unsafe extern "C" fn(f64, f64, f64) -> f64>> = OnceLock::new();

fn libm_path() -> String {
    if let Ok(value) = std::env::var("SOFTFMA_LIBM") {
        let value = value.trim().to_string();
        if !value.is_empty() {
            return value;
        }
    }
    "libm.so.6".to_string()
}

fn load_libm_fma() -> Option<unsafe extern "C" fn(f64, f64, f64) -> f64> {
    let path = libm_path();
    let lib = match unsafe { libloading::Library::new(&path) } {
        Ok(lib) => lib,
        Err(err) => {
            eprintln!("skipping libm fma: {path}: {err}");
            return None;
        }
    };
    let lib = Box::leak(Box::new(lib));
    unsafe {
        let fma: libloading::Symbol<unsafe extern "C" fn(f64, f64, f64) -> f64> =
            lib.get(b"fma").ok()?;
        Some(*fma)
    }
}

pub fn libm_fma() -> Option<unsafe extern "C" fn(f64, f64, f64) -> f64> {
    *LIBM_FMA.get_or_init(load_libm_fma)
}
