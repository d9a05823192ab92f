//! Hardware capability probe.
//!
//! Detects the widest vector ISA usable by the whitespace stripper and the
//! logical CPU count. The probe runs once per process, is side-effect free,
//! and its result is memoized in process-local storage.

use core::fmt;
use std::sync::OnceLock;

/// Widest available vector ISA for the whitespace stripper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimdLevel {
    /// No usable vector ISA (or the `simd` feature is disabled); the
    /// portable SWAR kernel is used.
    None,
    /// 128-bit vectors (SSE2).
    V128,
    /// 256-bit vectors (AVX2).
    V256,
    /// 512-bit vectors (AVX-512BW + VBMI2).
    V512,
    /// ARM 128-bit vectors (NEON).
    Neon,
}

impl fmt::Display for SimdLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::V128 => "128-bit",
            Self::V256 => "256-bit",
            Self::V512 => "512-bit",
            Self::Neon => "neon",
        };
        f.write_str(name)
    }
}

/// What the current machine offers.
#[derive(Debug, Clone, Copy)]
pub struct Capabilities {
    /// Widest usable vector ISA.
    pub simd_level: SimdLevel,
    /// Logical CPU count.
    pub logical_cpus: u32,
}

/// Probe the machine, memoizing the result.
pub fn probe() -> Capabilities {
    static CAPS: OnceLock<Capabilities> = OnceLock::new();
    *CAPS.get_or_init(|| Capabilities {
        simd_level: detect_simd(),
        logical_cpus: detect_cpus(),
    })
}

fn detect_cpus() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1)
}

#[cfg(all(target_arch = "x86_64", feature = "simd"))]
fn detect_simd() -> SimdLevel {
    if is_x86_feature_detected!("avx512bw") && is_x86_feature_detected!("avx512vbmi2") {
        SimdLevel::V512
    } else if is_x86_feature_detected!("avx2") {
        SimdLevel::V256
    } else if is_x86_feature_detected!("sse2") {
        SimdLevel::V128
    } else {
        SimdLevel::None
    }
}

// NEON is baseline on aarch64.
#[cfg(all(target_arch = "aarch64", feature = "simd"))]
fn detect_simd() -> SimdLevel {
    SimdLevel::Neon
}

#[cfg(not(any(
    all(target_arch = "x86_64", feature = "simd"),
    all(target_arch = "aarch64", feature = "simd")
)))]
fn detect_simd() -> SimdLevel {
    SimdLevel::None
}
