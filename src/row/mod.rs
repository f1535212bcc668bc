// ---------------------------------------------------------------------------
// Row kernels.
//
// Dispatched operations have a `RowOp` descriptor listing their SIMD
// candidates and a wrapper taking the bound `Kernel`. The wrapper runs the
// SIMD body over whole vectors, then the scalar kernel over whatever is left,
// so every binding writes the same bytes. Operations without SIMD bodies are
// plain scalar rows re-exported for the drivers.
// ---------------------------------------------------------------------------

#[allow(unused_imports)]
use archmage::prelude::*;

use crate::color::{Matrix, YuvConstants};
use crate::dispatch::{Candidate, Isa, Kernel, RowOp, Variant};

mod scalar;
use scalar::*;
pub(crate) use scalar::{
    PackedYuv, UYVY, YUY2, argb_to_argb1555_row, argb_to_argb4444_row, argb_to_raw_row,
    argb_to_rgb24_row, argb_to_uv_horizontal_row, argb_to_uv_row, argb1555_to_argb_row,
    argb4444_to_argb_row, half_row, i400_to_argb_row, i411_to_argb_row, i422_to_packed_row,
    i444_to_argb_row, merge_uv_row, packed_to_uv_row, packed_to_uv422_row, packed_to_y_row,
    raw_to_argb_row, rgb24_to_argb_row, rgb565_to_argb_row, shuffle_row, split_uv_row,
};

#[cfg(target_arch = "x86_64")]
mod avx2;
#[cfg(target_arch = "x86_64")]
use avx2::*;

#[cfg(target_arch = "aarch64")]
mod neon;
#[cfg(target_arch = "aarch64")]
use neon::*;


// ===========================================================================
// Descriptors (steps in the unit each wrapper documents)
// ===========================================================================

pub(crate) static MIRROR: RowOp = RowOp {
    name: "mirror",
    candidates: &[
        Candidate { isa: Isa::Avx2, step: 32 },
        Candidate { isa: Isa::Neon, step: 16 },
    ],
};

pub(crate) static ARGB_MIRROR: RowOp = RowOp {
    name: "argb_mirror",
    candidates: &[
        Candidate { isa: Isa::Avx2, step: 8 },
        Candidate { isa: Isa::Neon, step: 4 },
    ],
};

pub(crate) static INTERPOLATE: RowOp = RowOp {
    name: "interpolate",
    candidates: &[
        Candidate { isa: Isa::Avx2, step: 32 },
        Candidate { isa: Isa::Neon, step: 16 },
    ],
};

pub(crate) static SCALE_DOWN2_BOX: RowOp = RowOp {
    name: "scale_down2_box",
    candidates: &[
        Candidate { isa: Isa::Avx2, step: 32 },
        Candidate { isa: Isa::Neon, step: 16 },
    ],
};

pub(crate) static I422_TO_ARGB: RowOp = RowOp {
    name: "i422_to_argb",
    candidates: &[Candidate { isa: Isa::Avx2, step: 8 }],
};

pub(crate) static ARGB_TO_Y: RowOp = RowOp {
    name: "argb_to_y",
    candidates: &[Candidate { isa: Isa::Avx2, step: 8 }],
};

pub(crate) static ARGB_TO_RGB565: RowOp = RowOp {
    name: "argb_to_rgb565",
    candidates: &[
        Candidate { isa: Isa::Avx2, step: 16 },
        Candidate { isa: Isa::Neon, step: 8 },
    ],
};

pub(crate) static TRANSPOSE_8: RowOp = RowOp {
    name: "transpose_8",
    candidates: &[Candidate { isa: Isa::Avx2, step: 8 }],
};

pub(crate) static SUM_SQUARE_ERROR: RowOp = RowOp {
    name: "sum_square_error",
    candidates: &[Candidate { isa: Isa::Avx2, step: 32 }],
};

#[inline(always)]
fn finished(k: Kernel, done: usize, total: usize) -> usize {
    debug_assert!(
        k.variant != Variant::Aligned || done == total,
        "aligned kernel left a tail"
    );
    done
}

// ===========================================================================
// Dispatching wrappers
// ===========================================================================

/// Reverse the bytes of `src` into `dst`. Units: bytes.
pub(crate) fn mirror(k: Kernel, src: &[u8], dst: &mut [u8]) {
    let n = dst.len();
    let src = &src[..n];
    let done = match k.simd {
        #[cfg(target_arch = "x86_64")]
        Some(crate::dispatch::Simd::V3(t)) => mirror_impl_v3(t, src, dst),
        #[cfg(target_arch = "aarch64")]
        Some(crate::dispatch::Simd::Neon(t)) => mirror_impl_arm_v2(t, src, dst),
        _ => 0,
    };
    let done = finished(k, done, n);
    mirror_row_scalar(ScalarToken, &src[..n - done], &mut dst[done..]);
}

/// Reverse the 4-byte pixels of `src` into `dst`. Units: pixels.
pub(crate) fn argb_mirror(k: Kernel, src: &[u8], dst: &mut [u8]) {
    let n = dst.len() / 4;
    let src = &src[..n * 4];
    let done = match k.simd {
        #[cfg(target_arch = "x86_64")]
        Some(crate::dispatch::Simd::V3(t)) => argb_mirror_impl_v3(t, src, dst),
        #[cfg(target_arch = "aarch64")]
        Some(crate::dispatch::Simd::Neon(t)) => argb_mirror_impl_arm_v2(t, src, dst),
        _ => 0,
    };
    let done = finished(k, done, n);
    argb_mirror_row_scalar(ScalarToken, &src[..(n - done) * 4], &mut dst[done * 4..n * 4]);
}

/// Blend two rows with weight `fraction / 256` on `src1`. Units: bytes.
pub(crate) fn interpolate(k: Kernel, dst: &mut [u8], src0: &[u8], src1: &[u8], fraction: u8) {
    let n = dst.len();
    if fraction == 0 {
        dst.copy_from_slice(&src0[..n]);
        return;
    }
    let done = match k.simd {
        #[cfg(target_arch = "x86_64")]
        Some(crate::dispatch::Simd::V3(t)) => interpolate_impl_v3(t, dst, src0, src1, fraction),
        #[cfg(target_arch = "aarch64")]
        Some(crate::dispatch::Simd::Neon(t)) => {
            interpolate_impl_arm_v2(t, dst, src0, src1, fraction)
        }
        _ => 0,
    };
    let done = finished(k, done, n);
    interpolate_row_scalar(
        ScalarToken,
        &mut dst[done..],
        &src0[done..n],
        &src1[done..n],
        fraction,
    );
}

/// Rounded 2x2 box average of two rows into `dst`, which holds half as many
/// samples as each source row. Units: destination bytes.
pub(crate) fn scale_down2_box(k: Kernel, src0: &[u8], src1: &[u8], dst: &mut [u8]) {
    let n = dst.len();
    let done = match k.simd {
        #[cfg(target_arch = "x86_64")]
        Some(crate::dispatch::Simd::V3(t)) => scale_down2_box_impl_v3(t, src0, src1, dst),
        #[cfg(target_arch = "aarch64")]
        Some(crate::dispatch::Simd::Neon(t)) => scale_down2_box_impl_arm_v2(t, src0, src1, dst),
        _ => 0,
    };
    let done = finished(k, done, n);
    scale_down2_box_row_scalar(ScalarToken, &src0[2 * done..], &src1[2 * done..], &mut dst[done..]);
}

/// One row of 4:2:2 YUV to ARGB. Units: pixels.
pub(crate) fn i422_to_argb(
    k: Kernel,
    y: &[u8],
    u: &[u8],
    v: &[u8],
    dst: &mut [u8],
    c: &YuvConstants,
) {
    let n = y.len();
    let dst = &mut dst[..n * 4];
    let done = match k.simd {
        #[cfg(target_arch = "x86_64")]
        Some(crate::dispatch::Simd::V3(t)) => i422_to_argb_impl_v3(t, y, u, v, dst, c),
        _ => 0,
    };
    let done = finished(k, done, n);
    // `done` is always even, so chroma stays paired with its luma.
    i422_to_argb_row_scalar(
        ScalarToken,
        &y[done..],
        &u[done / 2..],
        &v[done / 2..],
        &mut dst[done * 4..],
        c,
    );
}

/// One row of ARGB to luma. Units: pixels.
pub(crate) fn argb_to_y(k: Kernel, src: &[u8], dst: &mut [u8], m: Matrix) {
    let n = dst.len();
    let src = &src[..n * 4];
    let done = match k.simd {
        #[cfg(target_arch = "x86_64")]
        Some(crate::dispatch::Simd::V3(t)) => argb_to_y_impl_v3(t, src, dst, m),
        _ => 0,
    };
    let done = finished(k, done, n);
    argb_to_y_row_scalar(ScalarToken, &src[done * 4..], &mut dst[done..], m);
}

/// One row of ARGB to little-endian RGB565. Units: pixels.
pub(crate) fn argb_to_rgb565(k: Kernel, src: &[u8], dst: &mut [u8]) {
    let n = dst.len() / 2;
    let src = &src[..n * 4];
    let done = match k.simd {
        #[cfg(target_arch = "x86_64")]
        Some(crate::dispatch::Simd::V3(t)) => argb_to_rgb565_impl_v3(t, src, dst),
        #[cfg(target_arch = "aarch64")]
        Some(crate::dispatch::Simd::Neon(t)) => argb_to_rgb565_impl_arm_v2(t, src, dst),
        _ => 0,
    };
    let done = finished(k, done, n);
    argb_to_rgb565_row_scalar(ScalarToken, &src[done * 4..], &mut dst[done * 2..n * 2]);
}

/// Transpose an 8-row strip: column `x` of the strip lands in
/// `tile[x * 8..x * 8 + 8]`. Units: columns.
pub(crate) fn transpose_8(k: Kernel, rows: &[&[u8]; 8], tile: &mut [u8]) {
    let n = tile.len() / 8;
    let done = match k.simd {
        #[cfg(target_arch = "x86_64")]
        Some(crate::dispatch::Simd::V3(t)) => transpose_8_impl_v3(t, rows, tile),
        _ => 0,
    };
    let done = finished(k, done, n);
    transpose_8_scalar(ScalarToken, rows, tile, done);
}

/// Sum of squared byte differences. Units: bytes.
pub(crate) fn sum_square_error(k: Kernel, a: &[u8], b: &[u8]) -> u64 {
    let n = a.len().min(b.len());
    let (a, b) = (&a[..n], &b[..n]);
    let (sum, done) = match k.simd {
        #[cfg(target_arch = "x86_64")]
        Some(crate::dispatch::Simd::V3(t)) => sum_square_error_impl_v3(t, a, b),
        _ => (0, 0),
    };
    let done = finished(k, done, n);
    sum + sum_square_error_scalar(ScalarToken, &a[done..], &b[done..])
}
