//! CPU capability detection.
//!
//! The detected feature set is computed once per process and cached in an
//! atomic snapshot. [`mask_cpu_flags`] recomputes it and keeps only the
//! requested bits, which is how tests force the scalar kernels to produce a
//! reference output:
//!
//! ```rust
//! use tailor::cpu::{CpuFlags, mask_cpu_flags, test_cpu_flag};
//!
//! mask_cpu_flags(CpuFlags::empty());
//! assert!(!test_cpu_flag(CpuFlags::AVX2));
//! mask_cpu_flags(CpuFlags::all());
//! ```
//!
//! With the `std` feature, setting one of the `TAILOR_DISABLE_*` environment
//! variables (`SSE2`, `SSSE3`, `SSE41`, `AVX2`, `NEON`, or `SIMD` for all of
//! them) to anything but `0` clears the matching bits after detection.

use alloc::format;
use alloc::string::String;
use core::sync::atomic::{AtomicU32, Ordering};

use bitflags::bitflags;

bitflags! {
    /// Instruction-set features the dispatcher can pick kernels for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CpuFlags: u32 {
        const X86 = 0x1;
        const SSE2 = 0x2;
        const SSSE3 = 0x4;
        const SSE41 = 0x8;
        const ARM = 0x10;
        const NEON = 0x20;
        const AVX2 = 0x80;
        /// Marks the snapshot as computed. Never a feature.
        const INITIALIZED = 0x4000_0000;
    }
}

impl CpuFlags {
    /// Every vector extension, without the architecture or marker bits.
    pub const SIMD: Self = Self::SSE2
        .union(Self::SSSE3)
        .union(Self::SSE41)
        .union(Self::AVX2)
        .union(Self::NEON);
}

static CPU_INFO: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "std")]
const ENV_OVERRIDES: &[(&str, CpuFlags)] = &[
    ("TAILOR_DISABLE_SSE2", CpuFlags::SSE2),
    ("TAILOR_DISABLE_SSSE3", CpuFlags::SSSE3),
    ("TAILOR_DISABLE_SSE41", CpuFlags::SSE41),
    ("TAILOR_DISABLE_AVX2", CpuFlags::AVX2),
    ("TAILOR_DISABLE_NEON", CpuFlags::NEON),
    ("TAILOR_DISABLE_SIMD", CpuFlags::SIMD),
];

/// The cached capability set, detecting it on first use.
pub fn cpu_flags() -> CpuFlags {
    let bits = CPU_INFO.load(Ordering::Acquire);
    if bits & CpuFlags::INITIALIZED.bits() != 0 {
        return CpuFlags::from_bits_retain(bits);
    }
    let detected = detect() | CpuFlags::INITIALIZED;
    // A concurrent first use computes the same value; an explicit mask that
    // landed in between wins.
    match CPU_INFO.compare_exchange(0, detected.bits(), Ordering::AcqRel, Ordering::Acquire) {
        Ok(_) => {
            log::debug!("tailor: detected cpu flags {detected:?}");
            detected
        }
        Err(current) => CpuFlags::from_bits_retain(current),
    }
}

/// Whether every bit of `flag` is available.
pub fn test_cpu_flag(flag: CpuFlags) -> bool {
    cpu_flags().contains(flag)
}

/// Re-detect, keep only the bits in `enable`, and make that the process-wide
/// capability set. Returns the new set.
///
/// `CpuFlags::all()` restores everything the hardware offers;
/// `CpuFlags::empty()` forces every later call onto the scalar kernels.
pub fn mask_cpu_flags(enable: CpuFlags) -> CpuFlags {
    let flags = (detect() & enable) | CpuFlags::INITIALIZED;
    CPU_INFO.store(flags.bits(), Ordering::Release);
    log::debug!("tailor: cpu flags masked with {enable:?}, now {flags:?}");
    flags
}

fn detect() -> CpuFlags {
    #[cfg(feature = "std")]
    {
        apply_env_overrides(detect_isa(), |name| {
            std::env::var_os(name).is_some_and(|v| v != "0")
        })
    }
    #[cfg(not(feature = "std"))]
    {
        detect_isa()
    }
}

#[cfg(feature = "std")]
fn apply_env_overrides(mut flags: CpuFlags, is_set: impl Fn(&str) -> bool) -> CpuFlags {
    for &(name, bits) in ENV_OVERRIDES {
        if is_set(name) && flags.intersects(bits) {
            log::warn!("tailor: {name} set, disabling {:?}", flags & bits);
            flags.remove(bits);
        }
    }
    flags
}

// ===========================================================================
// Per-architecture detection
// ===========================================================================

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
fn detect_isa() -> CpuFlags {
    let mut flags = CpuFlags::X86;
    #[cfg(feature = "std")]
    {
        if std::arch::is_x86_feature_detected!("sse2") {
            flags |= CpuFlags::SSE2;
        }
        if std::arch::is_x86_feature_detected!("ssse3") {
            flags |= CpuFlags::SSSE3;
        }
        if std::arch::is_x86_feature_detected!("sse4.1") {
            flags |= CpuFlags::SSE41;
        }
        if std::arch::is_x86_feature_detected!("avx2") {
            flags |= CpuFlags::AVX2;
        }
    }
    #[cfg(not(feature = "std"))]
    {
        flags.set(CpuFlags::SSE2, cfg!(target_feature = "sse2"));
        flags.set(CpuFlags::SSSE3, cfg!(target_feature = "ssse3"));
        flags.set(CpuFlags::SSE41, cfg!(target_feature = "sse4.1"));
        flags.set(CpuFlags::AVX2, cfg!(target_feature = "avx2"));
    }
    flags
}

#[cfg(target_arch = "aarch64")]
fn detect_isa() -> CpuFlags {
    let mut flags = CpuFlags::ARM;
    #[cfg(feature = "std")]
    flags.set(
        CpuFlags::NEON,
        std::arch::is_aarch64_feature_detected!("neon"),
    );
    #[cfg(not(feature = "std"))]
    flags.set(CpuFlags::NEON, cfg!(target_feature = "neon"));
    flags
}

#[cfg(target_arch = "arm")]
fn detect_isa() -> CpuFlags {
    let mut flags = CpuFlags::ARM;
    #[cfg(all(feature = "std", target_os = "linux"))]
    {
        if let Ok(info) = std::fs::read_to_string("/proc/cpuinfo") {
            flags.set(CpuFlags::NEON, cpuinfo_has_neon(&info));
        }
    }
    #[cfg(not(all(feature = "std", target_os = "linux")))]
    flags.set(CpuFlags::NEON, cfg!(target_feature = "neon"));
    flags
}

#[cfg(not(any(
    target_arch = "x86",
    target_arch = "x86_64",
    target_arch = "aarch64",
    target_arch = "arm"
)))]
fn detect_isa() -> CpuFlags {
    CpuFlags::empty()
}

/// Scan the `Features` line of a `/proc/cpuinfo` dump for NEON (`neon` on
/// 32-bit kernels, `asimd` on 64-bit ones).
#[cfg_attr(not(any(test, target_arch = "arm")), allow(dead_code))]
pub(crate) fn cpuinfo_has_neon(info: &str) -> bool {
    info.lines()
        .filter(|line| line.starts_with("Features"))
        .filter_map(|line| line.split_once(':'))
        .any(|(_, list)| {
            list.split_whitespace()
                .any(|f| f == "neon" || f == "asimd")
        })
}

// ===========================================================================
// Reporting
// ===========================================================================

/// Pull a manufacturer out of a `/proc/cpuinfo` dump: the x86 `vendor_id`
/// line, or the ARM `CPU implementer` code.
#[cfg_attr(not(any(test, all(feature = "std", target_os = "linux"))), allow(dead_code))]
pub(crate) fn vendor_from_cpuinfo(info: &str) -> Option<String> {
    for line in info.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        if key == "vendor_id" && !value.is_empty() {
            return Some(String::from(value));
        }
        if key == "CPU implementer" {
            let name = match value {
                "0x41" => "ARM",
                "0x42" => "Broadcom",
                "0x43" => "Cavium",
                "0x48" => "HiSilicon",
                "0x4e" => "Nvidia",
                "0x51" => "Qualcomm",
                "0x53" => "Samsung",
                "0x61" => "Apple",
                _ => return Some(format!("implementer {value}")),
            };
            return Some(String::from(name));
        }
    }
    None
}

/// The CPU manufacturer, when the platform exposes it without privileged
/// instructions.
pub fn cpu_vendor() -> Option<String> {
    #[cfg(all(feature = "std", target_os = "linux"))]
    {
        std::fs::read_to_string("/proc/cpuinfo")
            .ok()
            .and_then(|info| vendor_from_cpuinfo(&info))
    }
    #[cfg(not(all(feature = "std", target_os = "linux")))]
    {
        None
    }
}

/// Name of the widest instruction set the dispatcher will use.
pub fn instruction_set() -> &'static str {
    let flags = cpu_flags();
    if flags.contains(CpuFlags::AVX2) {
        "Avx2"
    } else if flags.contains(CpuFlags::SSE41) {
        "Sse41"
    } else if flags.contains(CpuFlags::SSSE3) {
        "Ssse3"
    } else if flags.contains(CpuFlags::SSE2) {
        "Sse2"
    } else if flags.contains(CpuFlags::NEON) {
        "Neon"
    } else {
        "Scalar"
    }
}

/// One-line summary of the running CPU and the kernels it gets.
///
/// ```rust
/// let s = tailor::cpu::describe_acceleration();
/// assert!(s.starts_with("{cpu-manufacturer:"));
/// ```
pub fn describe_acceleration() -> String {
    let vendor = cpu_vendor().unwrap_or_else(|| String::from("Unknown"));
    format!(
        "{{cpu-manufacturer:{vendor},instruction-set:{}}}",
        instruction_set()
    )
}

// ===========================================================================
// Test support
// ===========================================================================

/// Serialize tests that observe or change the process-wide flags.
#[cfg(test)]
pub(crate) fn test_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

/// Run `f` with the capability set masked to `enable`, restoring the full
/// set afterwards.
#[cfg(test)]
pub(crate) fn with_cpu_flags<R>(enable: CpuFlags, f: impl FnOnce() -> R) -> R {
    struct Restore;
    impl Drop for Restore {
        fn drop(&mut self) {
            mask_cpu_flags(CpuFlags::all());
        }
    }
    let _guard = test_lock();
    let _restore = Restore;
    mask_cpu_flags(enable);
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_are_initialized_and_stable() {
        let _guard = test_lock();
        let a = cpu_flags();
        assert!(a.contains(CpuFlags::INITIALIZED));
        assert_eq!(a, cpu_flags());
    }

    #[test]
    fn masking_to_empty_leaves_only_marker() {
        let flags = with_cpu_flags(CpuFlags::empty(), cpu_flags);
        assert_eq!(flags, CpuFlags::INITIALIZED);
        assert!(test_cpu_flag(CpuFlags::INITIALIZED));
    }

    #[test]
    fn mask_all_restores_detection() {
        let _guard = test_lock();
        let full = mask_cpu_flags(CpuFlags::all());
        let none = mask_cpu_flags(CpuFlags::empty());
        assert!(full.contains(none));
        assert_eq!(mask_cpu_flags(CpuFlags::all()), full);
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn x86_64_always_has_sse2() {
        let _guard = test_lock();
        let flags = mask_cpu_flags(CpuFlags::all());
        assert!(flags.contains(CpuFlags::X86));
        if std::env::var_os("TAILOR_DISABLE_SSE2").is_none()
            && std::env::var_os("TAILOR_DISABLE_SIMD").is_none()
        {
            assert!(flags.contains(CpuFlags::SSE2));
        }
    }

    #[cfg(feature = "std")]
    #[test]
    fn env_overrides_clear_bits() {
        let all = CpuFlags::X86 | CpuFlags::SSE2 | CpuFlags::AVX2;
        let flags = apply_env_overrides(all, |name| name == "TAILOR_DISABLE_AVX2");
        assert_eq!(flags, CpuFlags::X86 | CpuFlags::SSE2);
        let flags = apply_env_overrides(all, |name| name == "TAILOR_DISABLE_SIMD");
        assert_eq!(flags, CpuFlags::X86);
        assert_eq!(apply_env_overrides(all, |_| false), all);
    }

    #[test]
    fn cpuinfo_neon_scan() {
        let armv7 = "processor\t: 0\nFeatures\t: half thumb fastmult vfp edsp neon vfpv3 tls\n";
        let arm64 = "Features\t: fp asimd evtstrm aes pmull sha1\n";
        let plain = "Features\t: half thumb fastmult vfp edsp\nmodel name\t: neon-like\n";
        assert!(cpuinfo_has_neon(armv7));
        assert!(cpuinfo_has_neon(arm64));
        assert!(!cpuinfo_has_neon(plain));
        assert!(!cpuinfo_has_neon(""));
    }

    #[test]
    fn cpuinfo_vendor_scan() {
        let intel = "processor\t: 0\nvendor_id\t: GenuineIntel\ncpu family\t: 6\n";
        assert_eq!(vendor_from_cpuinfo(intel).as_deref(), Some("GenuineIntel"));
        let arm = "processor\t: 0\nCPU implementer\t: 0x41\n";
        assert_eq!(vendor_from_cpuinfo(arm).as_deref(), Some("ARM"));
        assert_eq!(vendor_from_cpuinfo("model name : x\n"), None);
    }

    #[test]
    fn describe_mentions_instruction_set() {
        let _guard = test_lock();
        let s = describe_acceleration();
        assert!(s.starts_with("{cpu-manufacturer:"));
        assert!(s.contains(&format!("instruction-set:{}}}", instruction_set())));
    }
}
