// ---------------------------------------------------------------------------
// Everything -> ARGB.
//
// 4:2:0 and 4:2:2 sources go through the dispatched I422 row kernel;
// biplanar and packed YUV are split into scratch chroma rows first. The
// remaining layouts use plain rows.
// ---------------------------------------------------------------------------

use alloc::vec;

use super::yuv::M420;
use super::{frame, src_view};
use crate::Error;
use crate::color::{BT601, JPEG, YuvConstants};
use crate::dispatch::{Geometry, SIMD_ALIGN};
use crate::plane::{RowsMut, half, quarter, row_bytes};
use crate::row::{self, PackedYuv, UYVY, YUY2};

/// How a planar source's chroma lines up with its luma.
#[derive(Clone, Copy)]
enum Planar {
    /// 4:2:0, dispatched kernel.
    I420(&'static YuvConstants),
    /// 4:2:2, dispatched kernel.
    I422,
    I444,
    I411,
}

impl Planar {
    fn chroma_size(self, width: usize, rows: usize) -> (usize, usize) {
        match self {
            Planar::I420(_) => (half(width), half(rows)),
            Planar::I422 => (half(width), rows),
            Planar::I444 => (width, rows),
            Planar::I411 => (quarter(width), rows),
        }
    }
}

fn planar_to_argb(
    planes: [(&[u8], usize); 3],
    dst: &mut [u8],
    dst_stride: usize,
    width: usize,
    height: i32,
    layout: Planar,
) -> Result<(), Error> {
    let (rows, flip) = frame(width, height)?;
    let (cw, ch) = layout.chroma_size(width, rows);
    let aligned = planes.iter().all(|&(p, s)| aligned_plane(p, s)) && aligned_plane(dst, dst_stride);
    let [(y, ys), (u, us), (v, vs)] = planes;
    let sy = src_view(y, ys, width, rows, flip)?;
    let su = src_view(u, us, cw, ch, flip)?;
    let sv = src_view(v, vs, cw, ch, flip)?;
    let mut d = RowsMut::new(dst, dst_stride, row_bytes(width, 4)?, rows)?;
    let k = row::I422_TO_ARGB.bind(Geometry::new(width, aligned));
    for j in 0..rows {
        let o = d.row_mut(j);
        match layout {
            Planar::I420(c) => row::i422_to_argb(k, sy.row(j), su.row(j / 2), sv.row(j / 2), o, c),
            Planar::I422 => row::i422_to_argb(k, sy.row(j), su.row(j), sv.row(j), o, &BT601),
            Planar::I444 => row::i444_to_argb_row(sy.row(j), su.row(j), sv.row(j), o, &BT601),
            Planar::I411 => row::i411_to_argb_row(sy.row(j), su.row(j), sv.row(j), o, &BT601),
        }
    }
    Ok(())
}

pub(super) fn aligned_plane(data: &[u8], stride: usize) -> bool {
    (data.as_ptr() as usize).is_multiple_of(SIMD_ALIGN) && stride.is_multiple_of(SIMD_ALIGN)
}

macro_rules! planar_to_argb {
    ($(#[$doc:meta])* $name:ident, $layout:expr) => {
        $(#[$doc])*
        pub fn $name(
            src_y: &[u8],
            src_stride_y: usize,
            src_u: &[u8],
            src_stride_u: usize,
            src_v: &[u8],
            src_stride_v: usize,
            dst_argb: &mut [u8],
            dst_stride_argb: usize,
            width: usize,
            height: i32,
        ) -> Result<(), Error> {
            planar_to_argb(
                [(src_y, src_stride_y), (src_u, src_stride_u), (src_v, src_stride_v)],
                dst_argb,
                dst_stride_argb,
                width,
                height,
                $layout,
            )
        }
    };
}

planar_to_argb!(
    /// BT.601 studio-swing I420 to ARGB.
    i420_to_argb,
    Planar::I420(&BT601)
);
planar_to_argb!(
    /// Full-range (JPEG) I420 to ARGB.
    j420_to_argb,
    Planar::I420(&JPEG)
);
planar_to_argb!(
    /// I422 to ARGB.
    i422_to_argb,
    Planar::I422
);
planar_to_argb!(
    /// I444 to ARGB.
    i444_to_argb,
    Planar::I444
);
planar_to_argb!(
    /// I411 to ARGB.
    i411_to_argb,
    Planar::I411
);

/// Walk a biplanar source, handing each output row its luma and the split
/// chroma of its row pair.
fn biplanar_rows(
    src_y: &[u8],
    src_stride_y: usize,
    src_uv: &[u8],
    src_stride_uv: usize,
    dst: &mut [u8],
    dst_stride: usize,
    dst_bpp: usize,
    width: usize,
    height: i32,
    swap: bool,
    mut row_fn: impl FnMut(&[u8], &[u8], &[u8], &mut [u8]),
) -> Result<(), Error> {
    let (rows, flip) = frame(width, height)?;
    let cw = half(width);
    let sy = src_view(src_y, src_stride_y, width, rows, flip)?;
    let suv = src_view(src_uv, src_stride_uv, cw * 2, half(rows), flip)?;
    let mut d = RowsMut::new(dst, dst_stride, row_bytes(width, dst_bpp)?, rows)?;
    let (mut u, mut v) = (vec![0u8; cw], vec![0u8; cw]);
    for j in 0..rows {
        if j % 2 == 0 {
            let (a, b) = if swap { (&mut v, &mut u) } else { (&mut u, &mut v) };
            row::split_uv_row(suv.row(j / 2), a, b);
        }
        row_fn(sy.row(j), &u, &v, d.row_mut(j));
    }
    Ok(())
}

fn biplanar_to_argb(
    src_y: &[u8],
    src_stride_y: usize,
    src_uv: &[u8],
    src_stride_uv: usize,
    dst: &mut [u8],
    dst_stride: usize,
    width: usize,
    height: i32,
    swap: bool,
) -> Result<(), Error> {
    let k = row::I422_TO_ARGB.bind(Geometry::new(width, false));
    biplanar_rows(
        src_y,
        src_stride_y,
        src_uv,
        src_stride_uv,
        dst,
        dst_stride,
        4,
        width,
        height,
        swap,
        |y, u, v, o| row::i422_to_argb(k, y, u, v, o, &BT601),
    )
}

fn biplanar_to_rgb565(
    src_y: &[u8],
    src_stride_y: usize,
    src_uv: &[u8],
    src_stride_uv: usize,
    dst: &mut [u8],
    dst_stride: usize,
    width: usize,
    height: i32,
    swap: bool,
) -> Result<(), Error> {
    let k = row::I422_TO_ARGB.bind(Geometry::new(width, false));
    let pack = row::ARGB_TO_RGB565.bind(Geometry::new(width, false));
    let mut argb = vec![0u8; row_bytes(width, 4)?];
    biplanar_rows(
        src_y,
        src_stride_y,
        src_uv,
        src_stride_uv,
        dst,
        dst_stride,
        2,
        width,
        height,
        swap,
        |y, u, v, o| {
            row::i422_to_argb(k, y, u, v, &mut argb, &BT601);
            row::argb_to_rgb565(pack, &argb, o);
        },
    )
}

/// NV12 to ARGB.
pub fn nv12_to_argb(
    src_y: &[u8],
    src_stride_y: usize,
    src_uv: &[u8],
    src_stride_uv: usize,
    dst_argb: &mut [u8],
    dst_stride_argb: usize,
    width: usize,
    height: i32,
) -> Result<(), Error> {
    biplanar_to_argb(
        src_y,
        src_stride_y,
        src_uv,
        src_stride_uv,
        dst_argb,
        dst_stride_argb,
        width,
        height,
        false,
    )
}

/// NV21 to ARGB.
pub fn nv21_to_argb(
    src_y: &[u8],
    src_stride_y: usize,
    src_vu: &[u8],
    src_stride_vu: usize,
    dst_argb: &mut [u8],
    dst_stride_argb: usize,
    width: usize,
    height: i32,
) -> Result<(), Error> {
    biplanar_to_argb(
        src_y,
        src_stride_y,
        src_vu,
        src_stride_vu,
        dst_argb,
        dst_stride_argb,
        width,
        height,
        true,
    )
}

/// NV12 to RGB565.
pub fn nv12_to_rgb565(
    src_y: &[u8],
    src_stride_y: usize,
    src_uv: &[u8],
    src_stride_uv: usize,
    dst_rgb565: &mut [u8],
    dst_stride_rgb565: usize,
    width: usize,
    height: i32,
) -> Result<(), Error> {
    biplanar_to_rgb565(
        src_y,
        src_stride_y,
        src_uv,
        src_stride_uv,
        dst_rgb565,
        dst_stride_rgb565,
        width,
        height,
        false,
    )
}

/// NV21 to RGB565.
pub fn nv21_to_rgb565(
    src_y: &[u8],
    src_stride_y: usize,
    src_vu: &[u8],
    src_stride_vu: usize,
    dst_rgb565: &mut [u8],
    dst_stride_rgb565: usize,
    width: usize,
    height: i32,
) -> Result<(), Error> {
    biplanar_to_rgb565(
        src_y,
        src_stride_y,
        src_vu,
        src_stride_vu,
        dst_rgb565,
        dst_stride_rgb565,
        width,
        height,
        true,
    )
}

/// M420 to ARGB.
pub fn m420_to_argb(
    src_m420: &[u8],
    src_stride_m420: usize,
    dst_argb: &mut [u8],
    dst_stride_argb: usize,
    width: usize,
    height: i32,
) -> Result<(), Error> {
    let src = M420::new(src_m420, src_stride_m420, width, height)?;
    let rows = src.rows();
    let cw = half(width);
    let mut d = RowsMut::new(dst_argb, dst_stride_argb, row_bytes(width, 4)?, rows)?;
    let k = row::I422_TO_ARGB.bind(Geometry::new(width, false));
    let (mut u, mut v) = (vec![0u8; cw], vec![0u8; cw]);
    for j in 0..rows {
        if j % 2 == 0 {
            row::split_uv_row(src.uv(j), &mut u, &mut v);
        }
        row::i422_to_argb(k, src.y(j), &u, &v, d.row_mut(j), &BT601);
    }
    Ok(())
}

fn packed_yuv_to_argb(
    src: &[u8],
    src_stride: usize,
    dst: &mut [u8],
    dst_stride: usize,
    width: usize,
    height: i32,
    layout: PackedYuv,
) -> Result<(), Error> {
    let (rows, flip) = frame(width, height)?;
    let cw = half(width);
    let s = src_view(src, src_stride, cw * 4, rows, flip)?;
    let mut d = RowsMut::new(dst, dst_stride, row_bytes(width, 4)?, rows)?;
    let k = row::I422_TO_ARGB.bind(Geometry::new(width, false));
    let (mut y, mut u, mut v) = (vec![0u8; width], vec![0u8; cw], vec![0u8; cw]);
    for j in 0..rows {
        row::packed_to_y_row(s.row(j), &mut y, layout);
        row::packed_to_uv422_row(s.row(j), &mut u, &mut v, layout);
        row::i422_to_argb(k, &y, &u, &v, d.row_mut(j), &BT601);
    }
    Ok(())
}

/// YUY2 to ARGB.
pub fn yuy2_to_argb(
    src_yuy2: &[u8],
    src_stride_yuy2: usize,
    dst_argb: &mut [u8],
    dst_stride_argb: usize,
    width: usize,
    height: i32,
) -> Result<(), Error> {
    packed_yuv_to_argb(src_yuy2, src_stride_yuy2, dst_argb, dst_stride_argb, width, height, YUY2)
}

/// UYVY to ARGB.
pub fn uyvy_to_argb(
    src_uyvy: &[u8],
    src_stride_uyvy: usize,
    dst_argb: &mut [u8],
    dst_stride_argb: usize,
    width: usize,
    height: i32,
) -> Result<(), Error> {
    packed_yuv_to_argb(src_uyvy, src_stride_uyvy, dst_argb, dst_stride_argb, width, height, UYVY)
}

/// Walk a packed source of `bpp` bytes per pixel into a packed destination
/// of `dst_bpp`, one row at a time.
pub(super) fn packed_rows(
    src: &[u8],
    src_stride: usize,
    bpp: usize,
    dst: &mut [u8],
    dst_stride: usize,
    dst_bpp: usize,
    width: usize,
    height: i32,
    mut row_fn: impl FnMut(&[u8], &mut [u8]),
) -> Result<(), Error> {
    let (rows, flip) = frame(width, height)?;
    let s = src_view(src, src_stride, row_bytes(width, bpp)?, rows, flip)?;
    let mut d = RowsMut::new(dst, dst_stride, row_bytes(width, dst_bpp)?, rows)?;
    for j in 0..rows {
        row_fn(s.row(j), d.row_mut(j));
    }
    Ok(())
}

macro_rules! packed_to_argb {
    ($(#[$doc:meta])* $name:ident, $bpp:expr, $row:expr) => {
        $(#[$doc])*
        pub fn $name(
            src: &[u8],
            src_stride: usize,
            dst_argb: &mut [u8],
            dst_stride_argb: usize,
            width: usize,
            height: i32,
        ) -> Result<(), Error> {
            packed_rows(src, src_stride, $bpp, dst_argb, dst_stride_argb, 4, width, height, $row)
        }
    };
}

/// Byte maps between the 4-byte layouts: `out[k] = in[MAP[k]]`.
pub(super) const BGRA_TO_ARGB: [usize; 4] = [3, 2, 1, 0];
pub(super) const ABGR_TO_ARGB: [usize; 4] = [2, 1, 0, 3];
pub(super) const RGBA_TO_ARGB: [usize; 4] = [1, 2, 3, 0];

packed_to_argb!(
    /// Luma only to gray ARGB.
    i400_to_argb,
    1,
    row::i400_to_argb_row
);
packed_to_argb!(
    /// BGRA (bytes A, R, G, B) to ARGB.
    bgra_to_argb,
    4,
    |s, d| row::shuffle_row(s, d, &BGRA_TO_ARGB)
);
packed_to_argb!(
    /// ABGR (bytes R, G, B, A) to ARGB.
    abgr_to_argb,
    4,
    |s, d| row::shuffle_row(s, d, &ABGR_TO_ARGB)
);
packed_to_argb!(
    /// RGBA (bytes A, B, G, R) to ARGB.
    rgba_to_argb,
    4,
    |s, d| row::shuffle_row(s, d, &RGBA_TO_ARGB)
);
packed_to_argb!(
    /// RGB24 (bytes B, G, R) to opaque ARGB.
    rgb24_to_argb,
    3,
    row::rgb24_to_argb_row
);
packed_to_argb!(
    /// RAW (bytes R, G, B) to opaque ARGB.
    raw_to_argb,
    3,
    row::raw_to_argb_row
);
packed_to_argb!(
    /// RGB565 to opaque ARGB, replicating high bits into the low ones.
    rgb565_to_argb,
    2,
    row::rgb565_to_argb_row
);
packed_to_argb!(
    /// ARGB1555 to ARGB; the alpha bit becomes 0 or 255.
    argb1555_to_argb,
    2,
    row::argb1555_to_argb_row
);
packed_to_argb!(
    /// ARGB4444 to ARGB.
    argb4444_to_argb,
    2,
    row::argb4444_to_argb_row
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::yuv_to_bgr;
    use alloc::vec::Vec;

    #[test]
    fn i420_matches_per_pixel_math() {
        let (w, h) = (7usize, 5usize);
        let y: Vec<u8> = (0..w * h).map(|i| (i * 9 + 16) as u8).collect();
        let u: Vec<u8> = (0..12).map(|i| (i * 20 + 10) as u8).collect();
        let v: Vec<u8> = (0..12).map(|i| (250 - i * 17) as u8).collect();
        let mut argb = vec![0u8; w * h * 4];
        i420_to_argb(&y, w, &u, 4, &v, 4, &mut argb, w * 4, w, h as i32).unwrap();
        for j in 0..h {
            for x in 0..w {
                let ci = (j / 2) * 4 + x / 2;
                let [b, g, r] = yuv_to_bgr(y[j * w + x], u[ci], v[ci], &BT601);
                assert_eq!(&argb[(j * w + x) * 4..][..4], &[b, g, r, 255], "({x},{j})");
            }
        }
    }

    #[test]
    fn nv12_yuy2_and_i420_agree() {
        let (w, h) = (6usize, 4usize);
        let y: Vec<u8> = (0..w * h).map(|i| (i * 11) as u8).collect();
        let u = [40u8, 90, 140, 60, 110, 200];
        let v = [220u8, 30, 128, 75, 5, 180];
        let mut want = vec![0u8; w * h * 4];
        i420_to_argb(&y, w, &u, 3, &v, 3, &mut want, w * 4, w, h as i32).unwrap();

        let uv: Vec<u8> = u.iter().zip(&v).flat_map(|(&a, &b)| [a, b]).collect();
        let mut got = vec![0u8; w * h * 4];
        nv12_to_argb(&y, w, &uv, 6, &mut got, w * 4, w, h as i32).unwrap();
        assert_eq!(got, want);

        let vu: Vec<u8> = u.iter().zip(&v).flat_map(|(&a, &b)| [b, a]).collect();
        nv21_to_argb(&y, w, &vu, 6, &mut got, w * 4, w, h as i32).unwrap();
        assert_eq!(got, want);

        // YUY2 carries 4:2:2 chroma; repeat each I420 chroma row twice.
        let mut yuy2 = vec![0u8; w * 2 * h];
        for j in 0..h {
            for x in 0..w / 2 {
                let c = (j / 2) * 3 + x;
                yuy2[j * w * 2 + x * 4..][..4]
                    .copy_from_slice(&[y[j * w + 2 * x], u[c], y[j * w + 2 * x + 1], v[c]]);
            }
        }
        yuy2_to_argb(&yuy2, w * 2, &mut got, w * 4, w, h as i32).unwrap();
        assert_eq!(got, want);
    }

    #[test]
    fn four_byte_orders() {
        let argb = [1u8, 2, 3, 4];
        let mut out = [0u8; 4];
        bgra_to_argb(&[4, 3, 2, 1], 4, &mut out, 4, 1, 1).unwrap();
        assert_eq!(out, argb);
        abgr_to_argb(&[3, 2, 1, 4], 4, &mut out, 4, 1, 1).unwrap();
        assert_eq!(out, argb);
        rgba_to_argb(&[4, 1, 2, 3], 4, &mut out, 4, 1, 1).unwrap();
        assert_eq!(out, argb);
        rgb24_to_argb(&[1, 2, 3], 3, &mut out, 4, 1, 1).unwrap();
        assert_eq!(out, [1, 2, 3, 255]);
        raw_to_argb(&[3, 2, 1], 3, &mut out, 4, 1, 1).unwrap();
        assert_eq!(out, [1, 2, 3, 255]);
    }

    #[test]
    fn i400_is_gray() {
        let mut out = [0u8; 8];
        i400_to_argb(&[0, 200], 2, &mut out, 8, 2, 1).unwrap();
        assert_eq!(out, [0, 0, 0, 255, 200, 200, 200, 255]);
    }

    #[test]
    fn bottom_up_source() {
        let src = [1u8, 2, 3, 4, 5, 6, 7, 8];
        let mut out = [0u8; 8];
        bgra_to_argb(&src, 4, &mut out, 4, 1, -2).unwrap();
        assert_eq!(out, [8, 7, 6, 5, 4, 3, 2, 1]);
    }

    fn nv12_pattern(w: usize, h: usize) -> (Vec<u8>, Vec<u8>) {
        let y = (0..w * h).map(|i| (i * 13 + 7) as u8).collect();
        let uv = (0..half(w) * 2 * half(h)).map(|i| (i * 29 + 90) as u8).collect();
        (y, uv)
    }

    /// Interleave NV12 planes as M420 rows `stride` apart.
    fn m420_frame(y: &[u8], uv: &[u8], w: usize, h: usize, stride: usize) -> Vec<u8> {
        let cw2 = half(w) * 2;
        let mut m = vec![0u8; (half(h) - 1) * 3 * stride + 2 * stride + cw2];
        for (j, row) in y.chunks_exact(w).enumerate() {
            m[(j / 2) * 3 * stride + (j % 2) * stride..][..w].copy_from_slice(row);
        }
        for (c, row) in uv.chunks_exact(cw2).enumerate() {
            m[c * 3 * stride + 2 * stride..][..cw2].copy_from_slice(row);
        }
        m
    }

    #[test]
    fn m420_matches_nv12() {
        let (w, h) = (9usize, 7usize);
        let (y, uv) = nv12_pattern(w, h);
        let m = m420_frame(&y, &uv, w, h, 12);
        for height in [h as i32, -(h as i32)] {
            let mut want = vec![0u8; w * h * 4];
            nv12_to_argb(&y, w, &uv, 10, &mut want, w * 4, w, height).unwrap();
            let mut got = vec![0u8; w * h * 4];
            m420_to_argb(&m, 12, &mut got, w * 4, w, height).unwrap();
            assert_eq!(got, want, "height {height}");
        }

        let tight = m420_frame(&y, &uv, w, h, 10);
        let mut want = vec![0u8; w * h * 4];
        m420_to_argb(&tight, 10, &mut want, w * 4, w, h as i32).unwrap();
        let mut got = vec![0u8; w * h * 4];
        crate::convert_to_argb(&tight, 0, crate::FourCc::M420, &mut got, 0, w, h as i32).unwrap();
        assert_eq!(got, want);
    }

    #[test]
    fn nv12_rgb565_packs_the_argb_result() {
        let (w, h) = (11usize, 6usize);
        let (y, uv) = nv12_pattern(w, h);
        for swap in [false, true] {
            let mut argb = vec![0u8; w * h * 4];
            let mut want = vec![0u8; w * h * 2];
            let mut got = vec![0u8; w * h * 2];
            if swap {
                nv21_to_argb(&y, w, &uv, 12, &mut argb, w * 4, w, -(h as i32)).unwrap();
                nv21_to_rgb565(&y, w, &uv, 12, &mut got, w * 2, w, -(h as i32)).unwrap();
            } else {
                nv12_to_argb(&y, w, &uv, 12, &mut argb, w * 4, w, -(h as i32)).unwrap();
                nv12_to_rgb565(&y, w, &uv, 12, &mut got, w * 2, w, -(h as i32)).unwrap();
            }
            crate::argb_to_rgb565(&argb, w * 4, &mut want, w * 2, w, h as i32).unwrap();
            assert_eq!(got, want, "swap {swap}");
        }
        let mut short = vec![9u8; w * h * 2 - 1];
        assert!(nv12_to_rgb565(&y, w, &uv, 12, &mut short, w * 2, w, h as i32).is_err());
        assert!(short.iter().all(|&b| b == 9));
    }

    #[test]
    fn new_entry_points_ignore_cpu_mask() {
        use crate::cpu::{CpuFlags, with_cpu_flags};
        use rand::{Rng, SeedableRng, rngs::StdRng};
        let mut rng = StdRng::seed_from_u64(420);
        let (w, h) = (45usize, 13usize);
        let y: Vec<u8> = (0..w * h).map(|_| rng.random()).collect();
        let uv: Vec<u8> = (0..half(w) * 2 * half(h)).map(|_| rng.random()).collect();
        let m = m420_frame(&y, &uv, w, h, half(w) * 2 + 5);
        let run = || {
            let mut argb = vec![0u8; w * h * 4];
            m420_to_argb(&m, half(w) * 2 + 5, &mut argb, w * 4, w, -(h as i32)).unwrap();
            let mut rgb565 = vec![0u8; w * h * 2];
            nv12_to_rgb565(&y, w, &uv, half(w) * 2, &mut rgb565, w * 2, w, h as i32).unwrap();
            let mut rgb565_vu = vec![0u8; w * h * 2];
            nv21_to_rgb565(&y, w, &uv, half(w) * 2, &mut rgb565_vu, w * 2, w, -(h as i32)).unwrap();
            (argb, rgb565, rgb565_vu)
        };
        let scalar = with_cpu_flags(CpuFlags::empty(), run);
        let best = with_cpu_flags(CpuFlags::all(), run);
        assert_eq!(scalar, best);
    }
}
