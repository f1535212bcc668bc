// ---------------------------------------------------------------------------
// ARGB (and the other packed RGB layouts, through a scratch ARGB row) to
// YUV, plus ARGB to the other packed RGB layouts.
//
// Luma goes through the dispatched ARGB -> Y kernel. Chroma is computed from
// truncated averages of the pixels each sample covers; an odd last row or
// column averages only the pixels that exist.
// ---------------------------------------------------------------------------

use alloc::vec;

use super::to_argb::{ABGR_TO_ARGB, BGRA_TO_ARGB, RGBA_TO_ARGB, aligned_plane, packed_rows};
use super::{frame, src_view};
use crate::Error;
use crate::color::Matrix;
use crate::dispatch::{Geometry, Kernel};
use crate::plane::{Rows, RowsMut, half, quarter, row_bytes};
use crate::row::{self, PackedYuv, UYVY, YUY2};

type RowFn = fn(&[u8], &mut [u8]);

/// Where ARGB rows come from: the source itself, or a per-row conversion
/// into scratch.
struct ArgbSource<'a> {
    rows: Rows<'a>,
    convert: Option<RowFn>,
}

impl<'a> ArgbSource<'a> {
    fn new(
        src: &'a [u8],
        stride: usize,
        bpp: usize,
        convert: Option<RowFn>,
        width: usize,
        rows: usize,
        flip: bool,
    ) -> Result<Self, Error> {
        Ok(Self {
            rows: src_view(src, stride, row_bytes(width, bpp)?, rows, flip)?,
            convert,
        })
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn aligned(&self, stride: usize) -> bool {
        self.convert.is_none() && aligned_plane(self.rows.row(0), stride)
    }

    /// ARGB row `j`, converted into `scratch` when needed. Rows past the
    /// bottom clamp to the last one.
    fn line<'s>(&self, j: usize, scratch: &'s mut [u8]) -> &'s [u8]
    where
        'a: 's,
    {
        let src = self.rows.row_clamped(j);
        match self.convert {
            None => src,
            Some(f) => {
                f(src, scratch);
                scratch
            }
        }
    }
}

/// Chroma subsampling of a planar destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sub {
    S420,
    S422,
    S444,
    S411,
}

impl Sub {
    fn chroma_size(self, width: usize, rows: usize) -> (usize, usize) {
        match self {
            Sub::S420 => (half(width), half(rows)),
            Sub::S422 => (half(width), rows),
            Sub::S444 => (width, rows),
            Sub::S411 => (quarter(width), rows),
        }
    }

    fn run(self) -> usize {
        match self {
            Sub::S420 | Sub::S422 => 2,
            Sub::S444 => 1,
            Sub::S411 => 4,
        }
    }
}

fn luma_kernel(width: usize, aligned: bool) -> Kernel {
    row::ARGB_TO_Y.bind(Geometry::new(width, aligned))
}

fn argb_to_planar(
    src: ArgbSource<'_>,
    src_stride: usize,
    dst: [(&mut [u8], usize); 3],
    width: usize,
    sub: Sub,
    m: Matrix,
) -> Result<(), Error> {
    let rows = src.len();
    let (cw, ch) = sub.chroma_size(width, rows);
    let [(dy, dys), (du, dus), (dv, dvs)] = dst;
    let aligned = src.aligned(src_stride) && aligned_plane(dy, dys);
    let mut dy = RowsMut::new(dy, dys, width, rows)?;
    let mut du = RowsMut::new(du, dus, cw, ch)?;
    let mut dv = RowsMut::new(dv, dvs, cw, ch)?;
    let k = luma_kernel(width, aligned);
    let (mut s0, mut s1) = (vec![0u8; width * 4], vec![0u8; width * 4]);
    for j in 0..rows {
        row::argb_to_y(k, src.line(j, &mut s0), dy.row_mut(j), m);
    }
    for j in 0..ch {
        if sub == Sub::S420 {
            let a = src.line(2 * j, &mut s0);
            if 2 * j + 1 < rows {
                let b = src.line(2 * j + 1, &mut s1);
                row::argb_to_uv_row(a, b, du.row_mut(j), dv.row_mut(j), m);
            } else {
                row::argb_to_uv_row(a, a, du.row_mut(j), dv.row_mut(j), m);
            }
        } else {
            let a = src.line(j, &mut s0);
            row::argb_to_uv_horizontal_row(a, sub.run(), du.row_mut(j), dv.row_mut(j), m);
        }
    }
    Ok(())
}

macro_rules! argb_to_planar {
    ($(#[$doc:meta])* $name:ident, $bpp:expr, $convert:expr, $sub:expr, $m:expr) => {
        $(#[$doc])*
        pub fn $name(
            src: &[u8],
            src_stride: usize,
            dst_y: &mut [u8],
            dst_stride_y: usize,
            dst_u: &mut [u8],
            dst_stride_u: usize,
            dst_v: &mut [u8],
            dst_stride_v: usize,
            width: usize,
            height: i32,
        ) -> Result<(), Error> {
            let (rows, flip) = frame(width, height)?;
            let src = ArgbSource::new(src, src_stride, $bpp, $convert, width, rows, flip)?;
            argb_to_planar(
                src,
                src_stride,
                [(dst_y, dst_stride_y), (dst_u, dst_stride_u), (dst_v, dst_stride_v)],
                width,
                $sub,
                $m,
            )
        }
    };
}

argb_to_planar!(
    /// ARGB to BT.601 studio-swing I420.
    argb_to_i420, 4, None, Sub::S420, Matrix::Bt601
);
argb_to_planar!(
    /// ARGB to full-range (JPEG) I420.
    argb_to_j420, 4, None, Sub::S420, Matrix::Jpeg
);
argb_to_planar!(
    /// ARGB to I422.
    argb_to_i422, 4, None, Sub::S422, Matrix::Bt601
);
argb_to_planar!(
    /// ARGB to I444.
    argb_to_i444, 4, None, Sub::S444, Matrix::Bt601
);
argb_to_planar!(
    /// ARGB to I411.
    argb_to_i411, 4, None, Sub::S411, Matrix::Bt601
);
argb_to_planar!(
    /// BGRA to I420.
    bgra_to_i420,
    4,
    Some(|s: &[u8], d: &mut [u8]| row::shuffle_row(s, d, &BGRA_TO_ARGB)),
    Sub::S420,
    Matrix::Bt601
);
argb_to_planar!(
    /// ABGR to I420.
    abgr_to_i420,
    4,
    Some(|s: &[u8], d: &mut [u8]| row::shuffle_row(s, d, &ABGR_TO_ARGB)),
    Sub::S420,
    Matrix::Bt601
);
argb_to_planar!(
    /// RGBA to I420.
    rgba_to_i420,
    4,
    Some(|s: &[u8], d: &mut [u8]| row::shuffle_row(s, d, &RGBA_TO_ARGB)),
    Sub::S420,
    Matrix::Bt601
);
argb_to_planar!(
    /// RGB24 to I420.
    rgb24_to_i420, 3, Some(row::rgb24_to_argb_row), Sub::S420, Matrix::Bt601
);
argb_to_planar!(
    /// RAW to I420.
    raw_to_i420, 3, Some(row::raw_to_argb_row), Sub::S420, Matrix::Bt601
);
argb_to_planar!(
    /// RGB565 to I420.
    rgb565_to_i420, 2, Some(row::rgb565_to_argb_row), Sub::S420, Matrix::Bt601
);
argb_to_planar!(
    /// ARGB1555 to I420.
    argb1555_to_i420, 2, Some(row::argb1555_to_argb_row), Sub::S420, Matrix::Bt601
);
argb_to_planar!(
    /// ARGB4444 to I420.
    argb4444_to_i420, 2, Some(row::argb4444_to_argb_row), Sub::S420, Matrix::Bt601
);

fn argb_to_luma(
    src: &[u8],
    src_stride: usize,
    dst_y: &mut [u8],
    dst_stride_y: usize,
    width: usize,
    height: i32,
    m: Matrix,
) -> Result<(), Error> {
    let aligned = aligned_plane(src, src_stride) && aligned_plane(dst_y, dst_stride_y);
    let k = luma_kernel(width, aligned);
    packed_rows(src, src_stride, 4, dst_y, dst_stride_y, 1, width, height, |s, d| {
        row::argb_to_y(k, s, d, m)
    })
}

/// ARGB to BT.601 studio-swing luma.
pub fn argb_to_i400(
    src_argb: &[u8],
    src_stride_argb: usize,
    dst_y: &mut [u8],
    dst_stride_y: usize,
    width: usize,
    height: i32,
) -> Result<(), Error> {
    argb_to_luma(src_argb, src_stride_argb, dst_y, dst_stride_y, width, height, Matrix::Bt601)
}

/// ARGB to full-range luma.
pub fn argb_to_j400(
    src_argb: &[u8],
    src_stride_argb: usize,
    dst_y: &mut [u8],
    dst_stride_y: usize,
    width: usize,
    height: i32,
) -> Result<(), Error> {
    argb_to_luma(src_argb, src_stride_argb, dst_y, dst_stride_y, width, height, Matrix::Jpeg)
}

fn argb_to_biplanar(
    src: &[u8],
    src_stride: usize,
    dst_y: &mut [u8],
    dst_stride_y: usize,
    dst_uv: &mut [u8],
    dst_stride_uv: usize,
    width: usize,
    height: i32,
    swap: bool,
) -> Result<(), Error> {
    let (rows, flip) = frame(width, height)?;
    let (cw, ch) = (half(width), half(rows));
    let s = src_view(src, src_stride, row_bytes(width, 4)?, rows, flip)?;
    let mut dy = RowsMut::new(dst_y, dst_stride_y, width, rows)?;
    let mut duv = RowsMut::new(dst_uv, dst_stride_uv, cw * 2, ch)?;
    let k = luma_kernel(width, false);
    for j in 0..rows {
        row::argb_to_y(k, s.row(j), dy.row_mut(j), Matrix::Bt601);
    }
    let (mut u, mut v) = (vec![0u8; cw], vec![0u8; cw]);
    for j in 0..ch {
        let (a, b) = (s.row(2 * j), s.row_clamped(2 * j + 1));
        row::argb_to_uv_row(a, b, &mut u, &mut v, Matrix::Bt601);
        let (first, second) = if swap { (&v, &u) } else { (&u, &v) };
        row::merge_uv_row(first, second, duv.row_mut(j));
    }
    Ok(())
}

/// ARGB to NV12.
pub fn argb_to_nv12(
    src_argb: &[u8],
    src_stride_argb: usize,
    dst_y: &mut [u8],
    dst_stride_y: usize,
    dst_uv: &mut [u8],
    dst_stride_uv: usize,
    width: usize,
    height: i32,
) -> Result<(), Error> {
    argb_to_biplanar(
        src_argb,
        src_stride_argb,
        dst_y,
        dst_stride_y,
        dst_uv,
        dst_stride_uv,
        width,
        height,
        false,
    )
}

/// ARGB to NV21.
pub fn argb_to_nv21(
    src_argb: &[u8],
    src_stride_argb: usize,
    dst_y: &mut [u8],
    dst_stride_y: usize,
    dst_vu: &mut [u8],
    dst_stride_vu: usize,
    width: usize,
    height: i32,
) -> Result<(), Error> {
    argb_to_biplanar(
        src_argb,
        src_stride_argb,
        dst_y,
        dst_stride_y,
        dst_vu,
        dst_stride_vu,
        width,
        height,
        true,
    )
}

fn argb_to_packed_yuv(
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
    let s = src_view(src, src_stride, row_bytes(width, 4)?, rows, flip)?;
    let mut d = RowsMut::new(dst, dst_stride, cw * 4, rows)?;
    let k = luma_kernel(width, false);
    let (mut y, mut u, mut v) = (vec![0u8; cw * 2], vec![0u8; cw], vec![0u8; cw]);
    for j in 0..rows {
        row::argb_to_y(k, s.row(j), &mut y[..width], Matrix::Bt601);
        let last = y[width - 1];
        y[width..].fill(last);
        row::argb_to_uv_horizontal_row(s.row(j), 2, &mut u, &mut v, Matrix::Bt601);
        row::i422_to_packed_row(&y, &u, &v, d.row_mut(j), layout);
    }
    Ok(())
}

/// ARGB to YUY2. An odd last pixel fills a whole macropixel, its luma
/// repeated.
pub fn argb_to_yuy2(
    src_argb: &[u8],
    src_stride_argb: usize,
    dst_yuy2: &mut [u8],
    dst_stride_yuy2: usize,
    width: usize,
    height: i32,
) -> Result<(), Error> {
    argb_to_packed_yuv(src_argb, src_stride_argb, dst_yuy2, dst_stride_yuy2, width, height, YUY2)
}

/// ARGB to UYVY.
pub fn argb_to_uyvy(
    src_argb: &[u8],
    src_stride_argb: usize,
    dst_uyvy: &mut [u8],
    dst_stride_uyvy: usize,
    width: usize,
    height: i32,
) -> Result<(), Error> {
    argb_to_packed_yuv(src_argb, src_stride_argb, dst_uyvy, dst_stride_uyvy, width, height, UYVY)
}

macro_rules! argb_to_packed {
    ($(#[$doc:meta])* $name:ident, $bpp:expr, $row:expr) => {
        $(#[$doc])*
        pub fn $name(
            src_argb: &[u8],
            src_stride_argb: usize,
            dst: &mut [u8],
            dst_stride: usize,
            width: usize,
            height: i32,
        ) -> Result<(), Error> {
            packed_rows(src_argb, src_stride_argb, 4, dst, dst_stride, $bpp, width, height, $row)
        }
    };
}

const ARGB_TO_BGRA: [usize; 4] = [3, 2, 1, 0];
const ARGB_TO_ABGR: [usize; 4] = [2, 1, 0, 3];
const ARGB_TO_RGBA: [usize; 4] = [3, 0, 1, 2];

argb_to_packed!(
    /// ARGB to BGRA (bytes A, R, G, B).
    argb_to_bgra,
    4,
    |s, d| row::shuffle_row(s, d, &ARGB_TO_BGRA)
);
argb_to_packed!(
    /// ARGB to ABGR (bytes R, G, B, A).
    argb_to_abgr,
    4,
    |s, d| row::shuffle_row(s, d, &ARGB_TO_ABGR)
);
argb_to_packed!(
    /// ARGB to RGBA (bytes A, B, G, R).
    argb_to_rgba,
    4,
    |s, d| row::shuffle_row(s, d, &ARGB_TO_RGBA)
);
argb_to_packed!(
    /// ARGB to RGB24, dropping alpha.
    argb_to_rgb24,
    3,
    row::argb_to_rgb24_row
);
argb_to_packed!(
    /// ARGB to RAW, dropping alpha.
    argb_to_raw,
    3,
    row::argb_to_raw_row
);
argb_to_packed!(
    /// ARGB to ARGB1555; alpha keeps its top bit.
    argb_to_argb1555,
    2,
    row::argb_to_argb1555_row
);
argb_to_packed!(
    /// ARGB to ARGB4444.
    argb_to_argb4444,
    2,
    row::argb_to_argb4444_row
);

/// ARGB to RGB565, truncating each channel.
pub fn argb_to_rgb565(
    src_argb: &[u8],
    src_stride_argb: usize,
    dst_rgb565: &mut [u8],
    dst_stride_rgb565: usize,
    width: usize,
    height: i32,
) -> Result<(), Error> {
    let k = row::ARGB_TO_RGB565.bind(Geometry::new(width, false));
    packed_rows(src_argb, src_stride_argb, 4, dst_rgb565, dst_stride_rgb565, 2, width, height, |s, d| {
        row::argb_to_rgb565(k, s, d)
    })
}
