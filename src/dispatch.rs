// ---------------------------------------------------------------------------
// Kernel selection.
//
// Every dispatched row operation is described by a `RowOp`: a name and a
// ranked list of SIMD candidates, each with the ISA it needs and the number
// of units (bytes or pixels, per operation) one vector iteration consumes.
// Drivers bind a `RowOp` once per call against the current capability set
// and the call's geometry, then hand the resulting `Kernel` to the row
// wrappers in `row/` for every row. The scalar kernel is always the fallback.
// ---------------------------------------------------------------------------

use archmage::SimdToken;
#[allow(unused_imports)]
use archmage::prelude::*;

use crate::cpu::{CpuFlags, cpu_flags};

/// Pointer and stride alignment an aligned kernel expects.
pub(crate) const SIMD_ALIGN: usize = 32;

/// Instruction sets with dedicated kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Isa {
    /// x86-64 AVX2 (archmage `X64V3Token`).
    Avx2,
    /// AArch64 NEON (archmage `Arm64V2Token`).
    Neon,
}

impl Isa {
    /// The capability bit that has to be set before this ISA is considered.
    pub const fn flag(self) -> CpuFlags {
        match self {
            Isa::Avx2 => CpuFlags::AVX2,
            Isa::Neon => CpuFlags::NEON,
        }
    }

    fn summon(self, flags: CpuFlags) -> Option<Simd> {
        if !flags.contains(self.flag()) {
            return None;
        }
        match self {
            #[cfg(target_arch = "x86_64")]
            Isa::Avx2 => X64V3Token::summon().map(Simd::V3),
            #[cfg(target_arch = "aarch64")]
            Isa::Neon => Arm64V2Token::summon().map(Simd::Neon),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }
}

/// A summoned token, proof that the CPU runs the matching kernels.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Simd {
    #[cfg(target_arch = "x86_64")]
    V3(X64V3Token),
    #[cfg(target_arch = "aarch64")]
    Neon(Arm64V2Token),
}

/// Which flavour of a row operation got bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// The geometry qualified for whole vectors: 32-byte aligned planes and
    /// a width that is a multiple of the vector step. Runs the same body as
    /// `AnyWidth`, whose tail loop then has nothing left to do. The variant
    /// is recorded for traces and tests, and debug builds assert that such a
    /// kernel leaves no tail.
    Aligned,
    /// SIMD over the leading whole vectors, scalar over the ragged tail.
    AnyWidth,
    /// Portable code, no preconditions.
    Scalar,
}

/// One SIMD implementation of a row operation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Candidate {
    pub isa: Isa,
    /// Units consumed per vector iteration.
    pub step: usize,
}

/// A row operation and its ranked SIMD candidates, fastest first.
#[derive(Debug)]
pub(crate) struct RowOp {
    pub name: &'static str,
    pub candidates: &'static [Candidate],
}

/// What a driver knows about a call when it binds a kernel.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Geometry {
    /// Row width in the operation's units.
    pub width: usize,
    /// Every plane involved starts on, and strides by, `SIMD_ALIGN` bytes.
    pub aligned: bool,
}

impl Geometry {
    pub(crate) const fn new(width: usize, aligned: bool) -> Self {
        Self { width, aligned }
    }
}

/// The implementation bound for one call.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Kernel {
    pub simd: Option<Simd>,
    pub isa: Option<Isa>,
    pub variant: Variant,
}

impl Kernel {
    pub(crate) const SCALAR: Kernel = Kernel {
        simd: None,
        isa: None,
        variant: Variant::Scalar,
    };
}

impl RowOp {
    /// Walk the candidates fastest-first and bind the first one the CPU and
    /// the geometry allow, falling back to scalar.
    pub(crate) fn bind(&self, geometry: Geometry) -> Kernel {
        self.bind_with(cpu_flags(), geometry)
    }

    pub(crate) fn bind_with(&self, flags: CpuFlags, geometry: Geometry) -> Kernel {
        for candidate in self.candidates {
            if geometry.width < candidate.step {
                continue;
            }
            let Some(simd) = candidate.isa.summon(flags) else {
                continue;
            };
            let variant = if geometry.aligned && geometry.width.is_multiple_of(candidate.step) {
                Variant::Aligned
            } else {
                Variant::AnyWidth
            };
            log::trace!(
                "tailor: {} width={} bound {:?}/{:?}",
                self.name,
                geometry.width,
                candidate.isa,
                variant
            );
            return Kernel {
                simd: Some(simd),
                isa: Some(candidate.isa),
                variant,
            };
        }
        log::trace!("tailor: {} width={} bound scalar", self.name, geometry.width);
        Kernel::SCALAR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static WIDE: RowOp = RowOp {
        name: "wide",
        candidates: &[
            Candidate { isa: Isa::Avx2, step: 32 },
            Candidate { isa: Isa::Neon, step: 16 },
        ],
    };

    static SCALAR_ONLY: RowOp = RowOp {
        name: "scalar_only",
        candidates: &[],
    };

    #[test]
    fn no_capabilities_binds_scalar() {
        let k = WIDE.bind_with(CpuFlags::INITIALIZED, Geometry::new(4096, true));
        assert_eq!(k.variant, Variant::Scalar);
        assert!(k.simd.is_none());
        assert_eq!(k.isa, None);
    }

    #[test]
    fn operations_without_candidates_bind_scalar() {
        let k = SCALAR_ONLY.bind_with(CpuFlags::all(), Geometry::new(4096, true));
        assert_eq!(k.variant, Variant::Scalar);
    }

    #[test]
    fn narrow_rows_bind_scalar() {
        let k = WIDE.bind_with(CpuFlags::all(), Geometry::new(7, true));
        assert_eq!(k.variant, Variant::Scalar);
    }

    #[test]
    fn geometry_picks_the_variant() {
        let _guard = crate::cpu::test_lock();
        let flags = cpu_flags();
        let aligned = WIDE.bind_with(flags, Geometry::new(64, true));
        let Some(isa) = aligned.isa else {
            std::eprintln!("geometry_picks_the_variant: no SIMD on this host, skipped");
            return;
        };
        assert_eq!(aligned.variant, Variant::Aligned);
        let ragged = WIDE.bind_with(flags, Geometry::new(65, true));
        assert_ne!(ragged.variant, Variant::Aligned);
        let unaligned = WIDE.bind_with(flags, Geometry::new(64, false));
        assert_ne!(unaligned.variant, Variant::Aligned);
        let masked = WIDE.bind_with(flags & !isa.flag(), Geometry::new(64, true));
        assert_ne!(masked.isa, Some(isa));
    }
}
