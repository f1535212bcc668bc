// ---------------------------------------------------------------------------
// YUV <-> YUV: planar resampling of chroma, biplanar and packed 4:2:2.
// ---------------------------------------------------------------------------

use alloc::vec;

use super::{frame, src_view};
use crate::Error;
use crate::plane::{Rows, RowsMut, copy_rows, half, quarter};
use crate::row::{self, PackedYuv, UYVY, YUY2};
use crate::scale::{FilterMode, scale_rows};

/// Copy an I420 frame, flipping it when `height` is negative.
pub fn i420_copy(
    src_y: &[u8],
    src_stride_y: usize,
    src_u: &[u8],
    src_stride_u: usize,
    src_v: &[u8],
    src_stride_v: usize,
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
    let (cw, ch) = (half(width), half(rows));
    let sy = src_view(src_y, src_stride_y, width, rows, flip)?;
    let su = src_view(src_u, src_stride_u, cw, ch, flip)?;
    let sv = src_view(src_v, src_stride_v, cw, ch, flip)?;
    let mut dy = RowsMut::new(dst_y, dst_stride_y, width, rows)?;
    let mut du = RowsMut::new(dst_u, dst_stride_u, cw, ch)?;
    let mut dv = RowsMut::new(dst_v, dst_stride_v, cw, ch)?;
    copy_rows(&sy, &mut dy);
    copy_rows(&su, &mut du);
    copy_rows(&sv, &mut dv);
    Ok(())
}

/// Planar YUV with `src_cw x src_ch` chroma to I420. Luma is copied; each
/// chroma plane goes through `chroma`.
fn planar_to_i420(
    planes: [(&[u8], usize); 3],
    dst: [(&mut [u8], usize); 3],
    width: usize,
    height: i32,
    chroma_of: impl Fn(usize, usize) -> (usize, usize),
    chroma: impl Fn(&Rows<'_>, &mut RowsMut<'_>),
) -> Result<(), Error> {
    let (rows, flip) = frame(width, height)?;
    let (scw, sch) = chroma_of(width, rows);
    let (dcw, dch) = (half(width), half(rows));
    let [(y, ys), (u, us), (v, vs)] = planes;
    let sy = src_view(y, ys, width, rows, flip)?;
    let su = src_view(u, us, scw, sch, flip)?;
    let sv = src_view(v, vs, scw, sch, flip)?;
    let [(dy, dys), (du, dus), (dv, dvs)] = dst;
    let mut dy = RowsMut::new(dy, dys, width, rows)?;
    let mut du = RowsMut::new(du, dus, dcw, dch)?;
    let mut dv = RowsMut::new(dv, dvs, dcw, dch)?;
    copy_rows(&sy, &mut dy);
    chroma(&su, &mut du);
    chroma(&sv, &mut dv);
    Ok(())
}

/// I420 to planar YUV with `dst_cw x dst_ch` chroma.
fn i420_to_planar(
    planes: [(&[u8], usize); 3],
    dst: [(&mut [u8], usize); 3],
    width: usize,
    height: i32,
    chroma_of: impl Fn(usize, usize) -> (usize, usize),
    chroma: impl Fn(&Rows<'_>, &mut RowsMut<'_>),
) -> Result<(), Error> {
    let (rows, flip) = frame(width, height)?;
    let (scw, sch) = (half(width), half(rows));
    let (dcw, dch) = chroma_of(width, rows);
    let [(y, ys), (u, us), (v, vs)] = planes;
    let sy = src_view(y, ys, width, rows, flip)?;
    let su = src_view(u, us, scw, sch, flip)?;
    let sv = src_view(v, vs, scw, sch, flip)?;
    let [(dy, dys), (du, dus), (dv, dvs)] = dst;
    let mut dy = RowsMut::new(dy, dys, width, rows)?;
    let mut du = RowsMut::new(du, dus, dcw, dch)?;
    let mut dv = RowsMut::new(dv, dvs, dcw, dch)?;
    copy_rows(&sy, &mut dy);
    chroma(&su, &mut du);
    chroma(&sv, &mut dv);
    Ok(())
}

/// Pairs of chroma rows averaged; an odd last row is copied.
fn halve_rows(src: &Rows<'_>, dst: &mut RowsMut<'_>) {
    for j in 0..dst.len() {
        row::half_row(src.row(2 * j), src.row_clamped(2 * j + 1), dst.row_mut(j));
    }
}

fn double_rows(src: &Rows<'_>, dst: &mut RowsMut<'_>) {
    for j in 0..dst.len() {
        dst.row_mut(j).copy_from_slice(src.row(j / 2));
    }
}

macro_rules! planar_entry {
    ($(#[$doc:meta])* $name:ident, $driver:ident, $chroma_of:expr, $chroma:expr) => {
        $(#[$doc])*
        pub fn $name(
            src_y: &[u8],
            src_stride_y: usize,
            src_u: &[u8],
            src_stride_u: usize,
            src_v: &[u8],
            src_stride_v: usize,
            dst_y: &mut [u8],
            dst_stride_y: usize,
            dst_u: &mut [u8],
            dst_stride_u: usize,
            dst_v: &mut [u8],
            dst_stride_v: usize,
            width: usize,
            height: i32,
        ) -> Result<(), Error> {
            $driver(
                [(src_y, src_stride_y), (src_u, src_stride_u), (src_v, src_stride_v)],
                [(dst_y, dst_stride_y), (dst_u, dst_stride_u), (dst_v, dst_stride_v)],
                width,
                height,
                $chroma_of,
                $chroma,
            )
        }
    };
}

planar_entry!(
    /// I422 to I420: vertical chroma pairs are averaged with rounding.
    i422_to_i420,
    planar_to_i420,
    |w, h| (half(w), h),
    halve_rows
);
planar_entry!(
    /// I444 to I420: chroma is box-filtered to half size.
    i444_to_i420,
    planar_to_i420,
    |w, h| (w, h),
    |s, d| scale_rows(s, d, FilterMode::Box)
);
planar_entry!(
    /// I411 to I420: chroma is bilinearly resampled.
    i411_to_i420,
    planar_to_i420,
    |w, h| (quarter(w), h),
    |s, d| scale_rows(s, d, FilterMode::Bilinear)
);
planar_entry!(
    /// I420 to I422: each chroma row is used for two output rows.
    i420_to_i422,
    i420_to_planar,
    |w, h| (half(w), h),
    double_rows
);
planar_entry!(
    /// I420 to I444: chroma is bilinearly upsampled.
    i420_to_i444,
    i420_to_planar,
    |w, h| (w, h),
    |s, d| scale_rows(s, d, FilterMode::Bilinear)
);
planar_entry!(
    /// I420 to I411: chroma is bilinearly resampled.
    i420_to_i411,
    i420_to_planar,
    |w, h| (quarter(w), h),
    |s, d| scale_rows(s, d, FilterMode::Bilinear)
);

/// Luma-only to I420 with neutral (128) chroma.
pub fn i400_to_i420(
    src_y: &[u8],
    src_stride_y: usize,
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
    let (cw, ch) = (half(width), half(rows));
    let sy = src_view(src_y, src_stride_y, width, rows, flip)?;
    let mut dy = RowsMut::new(dst_y, dst_stride_y, width, rows)?;
    let mut du = RowsMut::new(dst_u, dst_stride_u, cw, ch)?;
    let mut dv = RowsMut::new(dst_v, dst_stride_v, cw, ch)?;
    copy_rows(&sy, &mut dy);
    for j in 0..ch {
        du.row_mut(j).fill(128);
        dv.row_mut(j).fill(128);
    }
    Ok(())
}

/// I420 to luma only. The chroma planes are validated but not read.
pub fn i420_to_i400(
    src_y: &[u8],
    src_stride_y: usize,
    src_u: &[u8],
    src_stride_u: usize,
    src_v: &[u8],
    src_stride_v: usize,
    dst_y: &mut [u8],
    dst_stride_y: usize,
    width: usize,
    height: i32,
) -> Result<(), Error> {
    let (rows, flip) = frame(width, height)?;
    let (cw, ch) = (half(width), half(rows));
    let sy = src_view(src_y, src_stride_y, width, rows, flip)?;
    src_view(src_u, src_stride_u, cw, ch, flip)?;
    src_view(src_v, src_stride_v, cw, ch, flip)?;
    let mut dy = RowsMut::new(dst_y, dst_stride_y, width, rows)?;
    copy_rows(&sy, &mut dy);
    Ok(())
}

fn biplanar_to_i420(
    src_y: &[u8],
    src_stride_y: usize,
    src_uv: &[u8],
    src_stride_uv: usize,
    dst: [(&mut [u8], usize); 3],
    width: usize,
    height: i32,
    swap: bool,
) -> Result<(), Error> {
    let (rows, flip) = frame(width, height)?;
    let (cw, ch) = (half(width), half(rows));
    let sy = src_view(src_y, src_stride_y, width, rows, flip)?;
    let suv = src_view(src_uv, src_stride_uv, cw * 2, ch, flip)?;
    let [(dy, dys), (du, dus), (dv, dvs)] = dst;
    let mut dy = RowsMut::new(dy, dys, width, rows)?;
    let mut du = RowsMut::new(du, dus, cw, ch)?;
    let mut dv = RowsMut::new(dv, dvs, cw, ch)?;
    copy_rows(&sy, &mut dy);
    for j in 0..ch {
        let (u, v) = if swap {
            (dv.row_mut(j), du.row_mut(j))
        } else {
            (du.row_mut(j), dv.row_mut(j))
        };
        row::split_uv_row(suv.row(j), u, v);
    }
    Ok(())
}

/// NV12 (Y plus interleaved UV) to I420.
pub fn nv12_to_i420(
    src_y: &[u8],
    src_stride_y: usize,
    src_uv: &[u8],
    src_stride_uv: usize,
    dst_y: &mut [u8],
    dst_stride_y: usize,
    dst_u: &mut [u8],
    dst_stride_u: usize,
    dst_v: &mut [u8],
    dst_stride_v: usize,
    width: usize,
    height: i32,
) -> Result<(), Error> {
    biplanar_to_i420(
        src_y,
        src_stride_y,
        src_uv,
        src_stride_uv,
        [(dst_y, dst_stride_y), (dst_u, dst_stride_u), (dst_v, dst_stride_v)],
        width,
        height,
        false,
    )
}

/// NV21 (Y plus interleaved VU) to I420.
pub fn nv21_to_i420(
    src_y: &[u8],
    src_stride_y: usize,
    src_vu: &[u8],
    src_stride_vu: usize,
    dst_y: &mut [u8],
    dst_stride_y: usize,
    dst_u: &mut [u8],
    dst_stride_u: usize,
    dst_v: &mut [u8],
    dst_stride_v: usize,
    width: usize,
    height: i32,
) -> Result<(), Error> {
    biplanar_to_i420(
        src_y,
        src_stride_y,
        src_vu,
        src_stride_vu,
        [(dst_y, dst_stride_y), (dst_u, dst_stride_u), (dst_v, dst_stride_v)],
        width,
        height,
        true,
    )
}

fn i420_to_biplanar(
    planes: [(&[u8], usize); 3],
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
    let [(y, ys), (u, us), (v, vs)] = planes;
    let sy = src_view(y, ys, width, rows, flip)?;
    let su = src_view(u, us, cw, ch, flip)?;
    let sv = src_view(v, vs, cw, ch, flip)?;
    let mut dy = RowsMut::new(dst_y, dst_stride_y, width, rows)?;
    let mut duv = RowsMut::new(dst_uv, dst_stride_uv, cw * 2, ch)?;
    copy_rows(&sy, &mut dy);
    for j in 0..ch {
        let (a, b) = if swap { (sv.row(j), su.row(j)) } else { (su.row(j), sv.row(j)) };
        row::merge_uv_row(a, b, duv.row_mut(j));
    }
    Ok(())
}

/// I420 to NV12.
pub fn i420_to_nv12(
    src_y: &[u8],
    src_stride_y: usize,
    src_u: &[u8],
    src_stride_u: usize,
    src_v: &[u8],
    src_stride_v: usize,
    dst_y: &mut [u8],
    dst_stride_y: usize,
    dst_uv: &mut [u8],
    dst_stride_uv: usize,
    width: usize,
    height: i32,
) -> Result<(), Error> {
    i420_to_biplanar(
        [(src_y, src_stride_y), (src_u, src_stride_u), (src_v, src_stride_v)],
        dst_y,
        dst_stride_y,
        dst_uv,
        dst_stride_uv,
        width,
        height,
        false,
    )
}

/// I420 to NV21.
pub fn i420_to_nv21(
    src_y: &[u8],
    src_stride_y: usize,
    src_u: &[u8],
    src_stride_u: usize,
    src_v: &[u8],
    src_stride_v: usize,
    dst_y: &mut [u8],
    dst_stride_y: usize,
    dst_vu: &mut [u8],
    dst_stride_vu: usize,
    width: usize,
    height: i32,
) -> Result<(), Error> {
    i420_to_biplanar(
        [(src_y, src_stride_y), (src_u, src_stride_u), (src_v, src_stride_v)],
        dst_y,
        dst_stride_y,
        dst_vu,
        dst_stride_vu,
        width,
        height,
        true,
    )
}

/// Packed 4:2:2 to planar 4:2:0 (`vertical`) or 4:2:2.
fn packed_to_planar(
    src: &[u8],
    src_stride: usize,
    dst: [(&mut [u8], usize); 3],
    width: usize,
    height: i32,
    layout: PackedYuv,
    vertical: bool,
) -> Result<(), Error> {
    let (rows, flip) = frame(width, height)?;
    let cw = half(width);
    let ch = if vertical { half(rows) } else { rows };
    let s = src_view(src, src_stride, cw * 4, rows, flip)?;
    let [(dy, dys), (du, dus), (dv, dvs)] = dst;
    let mut dy = RowsMut::new(dy, dys, width, rows)?;
    let mut du = RowsMut::new(du, dus, cw, ch)?;
    let mut dv = RowsMut::new(dv, dvs, cw, ch)?;
    for j in 0..rows {
        row::packed_to_y_row(s.row(j), dy.row_mut(j), layout);
    }
    for j in 0..ch {
        if vertical {
            let (s0, s1) = (s.row(2 * j), s.row_clamped(2 * j + 1));
            row::packed_to_uv_row(s0, s1, du.row_mut(j), dv.row_mut(j), layout);
        } else {
            row::packed_to_uv422_row(s.row(j), du.row_mut(j), dv.row_mut(j), layout);
        }
    }
    Ok(())
}

macro_rules! packed_entry {
    ($(#[$doc:meta])* $name:ident, $layout:expr, $vertical:expr) => {
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
            packed_to_planar(
                src,
                src_stride,
                [(dst_y, dst_stride_y), (dst_u, dst_stride_u), (dst_v, dst_stride_v)],
                width,
                height,
                $layout,
                $vertical,
            )
        }
    };
}

packed_entry!(
    /// YUY2 to I420; chroma of each row pair is averaged with rounding.
    yuy2_to_i420,
    YUY2,
    true
);
packed_entry!(
    /// UYVY to I420; chroma of each row pair is averaged with rounding.
    uyvy_to_i420,
    UYVY,
    true
);
packed_entry!(
    /// YUY2 to I422.
    yuy2_to_i422,
    YUY2,
    false
);
packed_entry!(
    /// UYVY to I422.
    uyvy_to_i422,
    UYVY,
    false
);

/// Planar 4:2:0 (`vertical`) or 4:2:2 into packed YUV.
fn planar_to_packed(
    planes: [(&[u8], usize); 3],
    dst: &mut [u8],
    dst_stride: usize,
    width: usize,
    height: i32,
    layout: PackedYuv,
    vertical: bool,
) -> Result<(), Error> {
    let (rows, flip) = frame(width, height)?;
    let cw = half(width);
    let ch = if vertical { half(rows) } else { rows };
    let [(y, ys), (u, us), (v, vs)] = planes;
    let sy = src_view(y, ys, width, rows, flip)?;
    let su = src_view(u, us, cw, ch, flip)?;
    let sv = src_view(v, vs, cw, ch, flip)?;
    let mut d = RowsMut::new(dst, dst_stride, cw * 4, rows)?;
    let mut luma = vec![0u8; cw * 2];
    for j in 0..rows {
        let c = if vertical { j / 2 } else { j };
        // Pad an odd last pixel so the macropixel's second luma is defined.
        luma[..width].copy_from_slice(sy.row(j));
        luma[width..].fill(sy.row(j)[width - 1]);
        row::i422_to_packed_row(&luma, su.row(c), sv.row(c), d.row_mut(j), layout);
    }
    Ok(())
}

macro_rules! planar_to_packed_entry {
    ($(#[$doc:meta])* $name:ident, $layout:expr, $vertical:expr) => {
        $(#[$doc])*
        pub fn $name(
            src_y: &[u8],
            src_stride_y: usize,
            src_u: &[u8],
            src_stride_u: usize,
            src_v: &[u8],
            src_stride_v: usize,
            dst: &mut [u8],
            dst_stride: usize,
            width: usize,
            height: i32,
        ) -> Result<(), Error> {
            planar_to_packed(
                [(src_y, src_stride_y), (src_u, src_stride_u), (src_v, src_stride_v)],
                dst,
                dst_stride,
                width,
                height,
                $layout,
                $vertical,
            )
        }
    };
}

planar_to_packed_entry!(
    /// I420 to YUY2. Each output row takes the chroma of its row pair.
    i420_to_yuy2,
    YUY2,
    true
);
planar_to_packed_entry!(
    /// I420 to UYVY.
    i420_to_uyvy,
    UYVY,
    true
);
planar_to_packed_entry!(
    /// I422 to YUY2.
    i422_to_yuy2,
    YUY2,
    false
);
planar_to_packed_entry!(
    /// I422 to UYVY.
    i422_to_uyvy,
    UYVY,
    false
);

/// An M420 frame: groups of three rows `stride` apart, two luma rows
/// followed by one interleaved UV row at half resolution. An odd last luma
/// row still has its UV row two strides below it.
pub(super) struct M420<'a> {
    even: Rows<'a>,
    odd: Option<Rows<'a>>,
    uv: Rows<'a>,
    rows: usize,
    flip: bool,
}

impl<'a> M420<'a> {
    pub(super) fn new(src: &'a [u8], stride: usize, width: usize, height: i32) -> Result<Self, Error> {
        let (rows, flip) = frame(width, height)?;
        let (cw, ch) = (half(width), half(rows));
        if stride < cw * 2 {
            return Err(Error::StrideTooSmall { stride, row_bytes: cw * 2 });
        }
        let overflow = Error::InvalidArgument("frame size overflows usize");
        let group = stride.checked_mul(3).ok_or(overflow)?;
        let needed = (ch - 1)
            .checked_mul(group)
            .and_then(|n| n.checked_add(stride.checked_mul(2)?))
            .and_then(|n| n.checked_add(cw * 2))
            .ok_or(overflow)?;
        if src.len() < needed {
            return Err(Error::BufferTooSmall { needed, len: src.len() });
        }
        let odd = match rows / 2 {
            0 => None,
            n => Some(Rows::new(&src[stride..], group, width, n)?),
        };
        Ok(Self {
            even: Rows::new(src, group, width, ch)?,
            odd,
            uv: Rows::new(&src[stride * 2..], group, cw * 2, ch)?,
            rows,
            flip,
        })
    }

    pub(super) fn rows(&self) -> usize {
        self.rows
    }

    /// Luma of output row `j`.
    pub(super) fn y(&self, j: usize) -> &'a [u8] {
        let r = if self.flip { self.rows - 1 - j } else { j };
        match (r % 2, &self.odd) {
            (1, Some(odd)) => odd.row(r / 2),
            _ => self.even.row(r / 2),
        }
    }

    /// Interleaved UV of output row `j`.
    pub(super) fn uv(&self, j: usize) -> &'a [u8] {
        let c = if self.flip { self.uv.len() - 1 - j / 2 } else { j / 2 };
        self.uv.row(c)
    }
}

/// M420 to I420.
pub fn m420_to_i420(
    src_m420: &[u8],
    src_stride_m420: usize,
    dst_y: &mut [u8],
    dst_stride_y: usize,
    dst_u: &mut [u8],
    dst_stride_u: usize,
    dst_v: &mut [u8],
    dst_stride_v: usize,
    width: usize,
    height: i32,
) -> Result<(), Error> {
    let src = M420::new(src_m420, src_stride_m420, width, height)?;
    let rows = src.rows();
    let (cw, ch) = (half(width), half(rows));
    let mut dy = RowsMut::new(dst_y, dst_stride_y, width, rows)?;
    let mut du = RowsMut::new(dst_u, dst_stride_u, cw, ch)?;
    let mut dv = RowsMut::new(dst_v, dst_stride_v, cw, ch)?;
    for j in 0..rows {
        dy.row_mut(j).copy_from_slice(src.y(j));
    }
    for c in 0..ch {
        row::split_uv_row(src.uv(c * 2), du.row_mut(c), dv.row_mut(c));
    }
    Ok(())
}
