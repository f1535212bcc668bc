use archmage::prelude::*;

use crate::color::{
    Matrix, YuvConstants, pack_argb1555, pack_argb4444, pack_rgb565, unpack_argb1555,
    unpack_argb4444, unpack_rgb565, yuv_to_bgr,
};

#[inline(always)]
fn pixels(row: &[u8]) -> &[[u8; 4]] {
    bytemuck::cast_slice(row)
}

#[inline(always)]
fn pixels_mut(row: &mut [u8]) -> &mut [[u8; 4]] {
    bytemuck::cast_slice_mut(row)
}

// ===========================================================================
// Reference kernels for the dispatched operations
// ===========================================================================

pub(super) fn mirror_row_scalar(_token: ScalarToken, src: &[u8], dst: &mut [u8]) {
    for (d, s) in dst.iter_mut().zip(src.iter().rev()) {
        *d = *s;
    }
}

pub(super) fn argb_mirror_row_scalar(_token: ScalarToken, src: &[u8], dst: &mut [u8]) {
    for (d, s) in pixels_mut(dst).iter_mut().zip(pixels(src).iter().rev()) {
        *d = *s;
    }
}

/// `(a * (256 - f) + b * f + 128) >> 8` per byte; `f == 0` copies `a`.
pub(super) fn interpolate_row_scalar(
    _token: ScalarToken,
    dst: &mut [u8],
    src0: &[u8],
    src1: &[u8],
    fraction: u8,
) {
    if fraction == 0 {
        dst.copy_from_slice(&src0[..dst.len()]);
        return;
    }
    let f1 = fraction as u32;
    let f0 = 256 - f1;
    for ((d, &a), &b) in dst.iter_mut().zip(src0).zip(src1) {
        *d = ((a as u32 * f0 + b as u32 * f1 + 128) >> 8) as u8;
    }
}

pub(super) fn scale_down2_box_row_scalar(
    _token: ScalarToken,
    src0: &[u8],
    src1: &[u8],
    dst: &mut [u8],
) {
    for (x, d) in dst.iter_mut().enumerate() {
        let sum = src0[2 * x] as u32
            + src0[2 * x + 1] as u32
            + src1[2 * x] as u32
            + src1[2 * x + 1] as u32;
        *d = ((sum + 2) >> 2) as u8;
    }
}

pub(super) fn i422_to_argb_row_scalar(
    _token: ScalarToken,
    y: &[u8],
    u: &[u8],
    v: &[u8],
    dst: &mut [u8],
    c: &YuvConstants,
) {
    for (x, (&yy, d)) in y.iter().zip(pixels_mut(dst)).enumerate() {
        let [b, g, r] = yuv_to_bgr(yy, u[x / 2], v[x / 2], c);
        *d = [b, g, r, 255];
    }
}

pub(super) fn argb_to_y_row_scalar(_token: ScalarToken, src: &[u8], dst: &mut [u8], m: Matrix) {
    for (p, d) in pixels(src).iter().zip(dst.iter_mut()) {
        *d = m.y(p[2], p[1], p[0]);
    }
}

pub(super) fn argb_to_rgb565_row_scalar(_token: ScalarToken, src: &[u8], dst: &mut [u8]) {
    for (p, d) in pixels(src).iter().zip(dst.chunks_exact_mut(2)) {
        d.copy_from_slice(&pack_rgb565(p[0], p[1], p[2]).to_le_bytes());
    }
}

/// Columns `from..` of an 8-row strip into `tile`, 8 bytes per column.
pub(super) fn transpose_8_scalar(
    _token: ScalarToken,
    rows: &[&[u8]; 8],
    tile: &mut [u8],
    from: usize,
) {
    for (x, col) in tile.chunks_exact_mut(8).enumerate().skip(from) {
        for (j, d) in col.iter_mut().enumerate() {
            *d = rows[j][x];
        }
    }
}

pub(super) fn sum_square_error_scalar(_token: ScalarToken, a: &[u8], b: &[u8]) -> u64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x.abs_diff(y) as u64;
            d * d
        })
        .sum()
}

// ===========================================================================
// YUV -> ARGB rows
// ===========================================================================

pub(crate) fn i444_to_argb_row(y: &[u8], u: &[u8], v: &[u8], dst: &mut [u8], c: &YuvConstants) {
    for (x, (&yy, d)) in y.iter().zip(pixels_mut(dst)).enumerate() {
        let [b, g, r] = yuv_to_bgr(yy, u[x], v[x], c);
        *d = [b, g, r, 255];
    }
}

pub(crate) fn i411_to_argb_row(y: &[u8], u: &[u8], v: &[u8], dst: &mut [u8], c: &YuvConstants) {
    for (x, (&yy, d)) in y.iter().zip(pixels_mut(dst)).enumerate() {
        let [b, g, r] = yuv_to_bgr(yy, u[x / 4], v[x / 4], c);
        *d = [b, g, r, 255];
    }
}

pub(crate) fn i400_to_argb_row(y: &[u8], dst: &mut [u8]) {
    for (&yy, d) in y.iter().zip(pixels_mut(dst)) {
        *d = [yy, yy, yy, 255];
    }
}

// ===========================================================================
// ARGB -> YUV rows
// ===========================================================================

/// 2x2-subsampled chroma from two ARGB rows. Block means truncate; an odd
/// last column averages its two vertical samples.
pub(crate) fn argb_to_uv_row(
    src0: &[u8],
    src1: &[u8],
    u: &mut [u8],
    v: &mut [u8],
    m: Matrix,
) {
    let (p0, p1) = (pixels(src0), pixels(src1));
    let width = p0.len();
    for (x, (du, dv)) in u.iter_mut().zip(v.iter_mut()).enumerate() {
        let i = 2 * x;
        let mut avg = [0u8; 3];
        for (c, a) in avg.iter_mut().enumerate() {
            *a = if i + 1 < width {
                ((p0[i][c] as u32 + p0[i + 1][c] as u32 + p1[i][c] as u32 + p1[i + 1][c] as u32)
                    >> 2) as u8
            } else {
                ((p0[i][c] as u32 + p1[i][c] as u32) >> 1) as u8
            };
        }
        (*du, *dv) = m.uv(avg[2], avg[1], avg[0]);
    }
}

/// Chroma averaged over runs of `n` horizontal pixels, the last run possibly
/// shorter.
pub(crate) fn argb_to_uv_horizontal_row(
    src: &[u8],
    n: usize,
    u: &mut [u8],
    v: &mut [u8],
    m: Matrix,
) {
    for ((run, du), dv) in pixels(src).chunks(n).zip(u.iter_mut()).zip(v.iter_mut()) {
        let mut avg = [0u8; 3];
        for (c, a) in avg.iter_mut().enumerate() {
            let sum: u32 = run.iter().map(|p| p[c] as u32).sum();
            *a = (sum / run.len() as u32) as u8;
        }
        (*du, *dv) = m.uv(avg[2], avg[1], avg[0]);
    }
}

// ===========================================================================
// Packed RGB rows
// ===========================================================================

/// `dst[k] = src[map[k]]` for every 4-byte pixel.
pub(crate) fn shuffle_row(src: &[u8], dst: &mut [u8], map: &[usize; 4]) {
    for (s, d) in pixels(src).iter().zip(pixels_mut(dst)) {
        *d = [s[map[0]], s[map[1]], s[map[2]], s[map[3]]];
    }
}

pub(crate) fn rgb24_to_argb_row(src: &[u8], dst: &mut [u8]) {
    for (s, d) in src.chunks_exact(3).zip(pixels_mut(dst)) {
        *d = [s[0], s[1], s[2], 255];
    }
}

pub(crate) fn raw_to_argb_row(src: &[u8], dst: &mut [u8]) {
    for (s, d) in src.chunks_exact(3).zip(pixels_mut(dst)) {
        *d = [s[2], s[1], s[0], 255];
    }
}

pub(crate) fn argb_to_rgb24_row(src: &[u8], dst: &mut [u8]) {
    for (s, d) in pixels(src).iter().zip(dst.chunks_exact_mut(3)) {
        d.copy_from_slice(&s[..3]);
    }
}

pub(crate) fn argb_to_raw_row(src: &[u8], dst: &mut [u8]) {
    for (s, d) in pixels(src).iter().zip(dst.chunks_exact_mut(3)) {
        d.copy_from_slice(&[s[2], s[1], s[0]]);
    }
}

fn unpack16_row(src: &[u8], dst: &mut [u8], unpack: fn(u16) -> [u8; 4]) {
    for (s, d) in src.chunks_exact(2).zip(pixels_mut(dst)) {
        *d = unpack(u16::from_le_bytes([s[0], s[1]]));
    }
}

pub(crate) fn rgb565_to_argb_row(src: &[u8], dst: &mut [u8]) {
    unpack16_row(src, dst, unpack_rgb565);
}

pub(crate) fn argb1555_to_argb_row(src: &[u8], dst: &mut [u8]) {
    unpack16_row(src, dst, unpack_argb1555);
}

pub(crate) fn argb4444_to_argb_row(src: &[u8], dst: &mut [u8]) {
    unpack16_row(src, dst, unpack_argb4444);
}

pub(crate) fn argb_to_argb1555_row(src: &[u8], dst: &mut [u8]) {
    for (p, d) in pixels(src).iter().zip(dst.chunks_exact_mut(2)) {
        d.copy_from_slice(&pack_argb1555(p[0], p[1], p[2], p[3]).to_le_bytes());
    }
}

pub(crate) fn argb_to_argb4444_row(src: &[u8], dst: &mut [u8]) {
    for (p, d) in pixels(src).iter().zip(dst.chunks_exact_mut(2)) {
        d.copy_from_slice(&pack_argb4444(p[0], p[1], p[2], p[3]).to_le_bytes());
    }
}

// ===========================================================================
// Packed YUV and interleaved chroma rows
// ===========================================================================

/// Byte positions of `(y0, u, y1, v)` inside one 4-byte macropixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PackedYuv {
    pub y0: usize,
    pub u: usize,
    pub y1: usize,
    pub v: usize,
}

pub(crate) const YUY2: PackedYuv = PackedYuv { y0: 0, u: 1, y1: 2, v: 3 };
pub(crate) const UYVY: PackedYuv = PackedYuv { y0: 1, u: 0, y1: 3, v: 2 };

pub(crate) fn packed_to_y_row(src: &[u8], y: &mut [u8], layout: PackedYuv) {
    for (x, d) in y.iter_mut().enumerate() {
        let m = &src[(x / 2) * 4..][..4];
        *d = if x % 2 == 0 { m[layout.y0] } else { m[layout.y1] };
    }
}

pub(crate) fn packed_to_uv422_row(src: &[u8], u: &mut [u8], v: &mut [u8], layout: PackedYuv) {
    for ((m, du), dv) in src.chunks_exact(4).zip(u.iter_mut()).zip(v.iter_mut()) {
        *du = m[layout.u];
        *dv = m[layout.v];
    }
}

/// Chroma of two packed rows, rounded mean of the vertical pair.
pub(crate) fn packed_to_uv_row(
    src0: &[u8],
    src1: &[u8],
    u: &mut [u8],
    v: &mut [u8],
    layout: PackedYuv,
) {
    let avg = |a: u8, b: u8| ((a as u16 + b as u16 + 1) >> 1) as u8;
    for (x, (du, dv)) in u.iter_mut().zip(v.iter_mut()).enumerate() {
        let (m0, m1) = (&src0[x * 4..][..4], &src1[x * 4..][..4]);
        *du = avg(m0[layout.u], m1[layout.u]);
        *dv = avg(m0[layout.v], m1[layout.v]);
    }
}

/// Planar 4:2:2 into a packed row. `y` holds two samples per macropixel.
pub(crate) fn i422_to_packed_row(
    y: &[u8],
    u: &[u8],
    v: &[u8],
    dst: &mut [u8],
    layout: PackedYuv,
) {
    for (((m, l), &uu), &vv) in dst.chunks_exact_mut(4).zip(y.chunks_exact(2)).zip(u).zip(v) {
        m[layout.y0] = l[0];
        m[layout.u] = uu;
        m[layout.y1] = l[1];
        m[layout.v] = vv;
    }
}

pub(crate) fn split_uv_row(src: &[u8], u: &mut [u8], v: &mut [u8]) {
    for ((s, du), dv) in src.chunks_exact(2).zip(u.iter_mut()).zip(v.iter_mut()) {
        *du = s[0];
        *dv = s[1];
    }
}

pub(crate) fn merge_uv_row(u: &[u8], v: &[u8], dst: &mut [u8]) {
    for ((d, &uu), &vv) in dst.chunks_exact_mut(2).zip(u).zip(v) {
        d[0] = uu;
        d[1] = vv;
    }
}

/// Rounded mean of two rows.
pub(crate) fn half_row(src0: &[u8], src1: &[u8], dst: &mut [u8]) {
    for ((d, &a), &b) in dst.iter_mut().zip(src0).zip(src1) {
        *d = ((a as u16 + b as u16 + 1) >> 1) as u8;
    }
}
