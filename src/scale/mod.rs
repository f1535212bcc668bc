//! Plane and image resampling.
//!
//! Exact 1/2, 1/4, 1/8, 3/4 and 3/8 downscales have dedicated filtered
//! kernels; everything else goes through 16.16 fixed-point coordinate
//! stepping with point, two-tap or area sampling.

mod argb;
mod down;
mod fixed;
mod generic;

pub use argb::{argb_scale, argb_scale_clip};

use fixed::Step;

use crate::Error;
use crate::plane::{Rows, RowsMut, check_width, copy_rows, half, rows_of};

/// How destination samples are derived from the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    /// Nearest sample, no filtering.
    #[default]
    None,
    /// Two-tap horizontal filtering, nearest row vertically.
    Linear,
    /// Two-tap filtering in both directions.
    Bilinear,
    /// Area averaging when shrinking; bilinear when growing.
    Box,
}

impl FilterMode {
    fn is_filtered(self) -> bool {
        self != FilterMode::None
    }
}

/// Dimensions go through 16.16 arithmetic in `u32`.
fn check_dimension(n: usize) -> Result<u32, Error> {
    check_width(n)?;
    u32::try_from(n)
        .ok()
        .filter(|&n| n <= i32::MAX as u32)
        .ok_or(Error::InvalidArgument("dimension too large to scale"))
}

fn frame_bytes(width: usize, height: usize) -> Result<usize, Error> {
    width
        .checked_mul(height)
        .filter(|n| n.checked_mul(2).is_some())
        .ok_or(Error::InvalidArgument("frame size overflows usize"))
}

/// Coordinate stepper for one axis.
fn axis(src: u32, dst: u32, filter: FilterMode) -> Step {
    match filter {
        FilterMode::None => {
            let whole = Step::new(0, src, dst).whole();
            Step::new(whole >> 1, src, dst)
        }
        FilterMode::Box => Step::new(0, src, dst),
        FilterMode::Linear | FilterMode::Bilinear => {
            if dst <= src {
                // Sample at the centre of each destination footprint.
                let whole = Step::new(0, src, dst).whole();
                Step::new((whole >> 1) - 32768, src, dst)
            } else if dst > 1 {
                // Growing: first and last samples land on the source edges.
                Step::new(0, src - 1, dst - 1)
            } else {
                Step::fixed(0)
            }
        }
    }
}

/// Resample through the generic paths, `bpp` bytes per pixel, producing the
/// region of a `dst_w x dst_h` output that starts at column `clip_x`, row
/// `clip_y`.
fn resample(
    src: &Rows<'_>,
    dst: &mut RowsMut<'_>,
    bpp: usize,
    (dst_w, dst_h): (u32, u32),
    (clip_x, clip_y): (usize, usize),
    filter: FilterMode,
) {
    let src_w = (src.row_bytes() / bpp) as u32;
    let src_h = src.len() as u32;
    let filter = match filter {
        FilterMode::Box if dst_w > src_w || dst_h > src_h => FilterMode::Bilinear,
        f => f,
    };
    let mut x = axis(src_w, dst_w, filter);
    let mut y = axis(src_h, dst_h, filter);
    x.skip(clip_x);
    y.skip(clip_y);
    log::trace!(
        "tailor: resample {src_w}x{src_h} -> {dst_w}x{dst_h} bpp={bpp} filter={filter:?}"
    );
    match filter {
        FilterMode::None => generic::point(src, dst, bpp, x, y),
        FilterMode::Linear => generic::bilinear(src, dst, bpp, x, y, false),
        FilterMode::Bilinear => generic::bilinear(src, dst, bpp, x, y, true),
        FilterMode::Box => generic::boxed(src, dst, bpp, x, y),
    }
}

/// Scale a validated single-byte plane. Both views carry their dimensions.
pub(crate) fn scale_rows(src: &Rows<'_>, dst: &mut RowsMut<'_>, filter: FilterMode) {
    let (sw, sh) = (src.row_bytes(), src.len());
    let (dw, dh) = (dst.row_bytes(), dst.len());
    if sw == dw && sh == dh {
        copy_rows(src, dst);
        return;
    }
    if filter.is_filtered() && dw <= sw && dh <= sh {
        if 4 * dw == 3 * sw && 4 * dh == 3 * sh {
            return down::down34(src, dst);
        }
        if 2 * dw == sw && 2 * dh == sh {
            return down::down2(src, dst);
        }
        // Implies both source dimensions are multiples of 8.
        if 8 * dw == 3 * sw && 8 * dh == 3 * sh {
            return down::down38(src, dst);
        }
        if 4 * dw == sw && 4 * dh == sh {
            return down::down4(src, dst);
        }
        if 8 * dw == sw && 8 * dh == sh {
            return down::down8(src, dst);
        }
    }
    resample(src, dst, 1, (dw as u32, dh as u32), (0, 0), filter);
}

/// Resample one 8-bit plane to `dst_width x dst_height`.
///
/// A negative `src_height` reads the source bottom-up. The destination is
/// always written top-down.
pub fn scale_plane(
    src: &[u8],
    src_stride: usize,
    src_width: usize,
    src_height: i32,
    dst: &mut [u8],
    dst_stride: usize,
    dst_width: usize,
    dst_height: usize,
    filter: FilterMode,
) -> Result<(), Error> {
    let (src_rows, flip) = rows_of(src_height)?;
    check_dimension(src_width)?;
    check_dimension(src_rows)?;
    check_dimension(dst_width)?;
    check_dimension(dst_height)?;
    let src = Rows::new(src, src_stride, src_width, src_rows)?.flipped(flip);
    let mut dst = RowsMut::new(dst, dst_stride, dst_width, dst_height)?;
    scale_rows(&src, &mut dst, filter);
    Ok(())
}

/// Resample an I420 frame. Chroma planes are `(n + 1) / 2` of the luma
/// dimensions on both sides.
pub fn i420_scale(
    src_y: &[u8],
    src_stride_y: usize,
    src_u: &[u8],
    src_stride_u: usize,
    src_v: &[u8],
    src_stride_v: usize,
    src_width: usize,
    src_height: i32,
    dst_y: &mut [u8],
    dst_stride_y: usize,
    dst_u: &mut [u8],
    dst_stride_u: usize,
    dst_v: &mut [u8],
    dst_stride_v: usize,
    dst_width: usize,
    dst_height: usize,
    filter: FilterMode,
) -> Result<(), Error> {
    let (src_rows, flip) = rows_of(src_height)?;
    for n in [src_width, src_rows, dst_width, dst_height] {
        check_dimension(n)?;
    }
    let (scw, sch) = (half(src_width), half(src_rows));
    let (dcw, dch) = (half(dst_width), half(dst_height));
    let sy = Rows::new(src_y, src_stride_y, src_width, src_rows)?.flipped(flip);
    let su = Rows::new(src_u, src_stride_u, scw, sch)?.flipped(flip);
    let sv = Rows::new(src_v, src_stride_v, scw, sch)?.flipped(flip);
    let mut dy = RowsMut::new(dst_y, dst_stride_y, dst_width, dst_height)?;
    let mut du = RowsMut::new(dst_u, dst_stride_u, dcw, dch)?;
    let mut dv = RowsMut::new(dst_v, dst_stride_v, dcw, dch)?;
    scale_rows(&sy, &mut dy, filter);
    scale_rows(&su, &mut du, filter);
    scale_rows(&sv, &mut dv, filter);
    Ok(())
}

/// Scale a contiguous I420 frame into a horizontal band of a contiguous
/// I420 destination, leaving `offset` rows above and below untouched.
///
/// `offset` is rounded down to even so chroma rows stay paired; the band is
/// `dst_height - 2 * offset` rows tall. `interpolate` selects box filtering
/// over point sampling.
pub fn scale_i420_letterbox(
    src: &[u8],
    src_width: usize,
    src_height: usize,
    dst: &mut [u8],
    dst_width: usize,
    dst_height: usize,
    offset: usize,
    interpolate: bool,
) -> Result<(), Error> {
    for n in [src_width, src_height, dst_width, dst_height] {
        check_dimension(n)?;
    }
    let offset = offset & !1;
    let band = offset
        .checked_mul(2)
        .and_then(|o| dst_height.checked_sub(o))
        .filter(|&b| b > 0)
        .ok_or(Error::InvalidArgument("letterbox offset leaves no rows"))?;
    let filter = if interpolate { FilterMode::Box } else { FilterMode::None };

    let (scw, sch) = (half(src_width), half(src_height));
    let (dcw, dch) = (half(dst_width), half(dst_height));
    let src_luma = frame_bytes(src_width, src_height)?;
    let src_chroma = scw * sch;
    let needed = src_luma + 2 * src_chroma;
    if src.len() < needed {
        return Err(Error::BufferTooSmall { needed, len: src.len() });
    }
    let dst_luma = frame_bytes(dst_width, dst_height)?;
    let dst_chroma = dcw * dch;
    let needed = dst_luma + 2 * dst_chroma;
    if dst.len() < needed {
        return Err(Error::BufferTooSmall { needed, len: dst.len() });
    }

    let (s_y, s_uv) = src.split_at(src_luma);
    let (s_u, s_v) = s_uv.split_at(src_chroma);
    let sy = Rows::new(s_y, src_width, src_width, src_height)?;
    let su = Rows::new(s_u, scw, scw, sch)?;
    let sv = Rows::new(&s_v[..src_chroma], scw, scw, sch)?;

    let (d_y, d_uv) = dst.split_at_mut(dst_luma);
    let (d_u, d_v) = d_uv.split_at_mut(dst_chroma);
    let band_chroma = half(band);
    let chroma_at = (offset / 2) * dcw;
    let mut dy = RowsMut::new(&mut d_y[offset * dst_width..], dst_width, dst_width, band)?;
    let mut du = RowsMut::new(&mut d_u[chroma_at..], dcw, dcw, band_chroma)?;
    let mut dv = RowsMut::new(&mut d_v[chroma_at..dst_chroma], dcw, dcw, band_chroma)?;

    scale_rows(&sy, &mut dy, filter);
    scale_rows(&su, &mut du, filter);
    scale_rows(&sv, &mut dv, filter);
    Ok(())
}

#[cfg(test)]
mod tests {
    extern crate alloc;
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    fn ramp(w: usize, h: usize) -> Vec<u8> {
        (0..w * h).map(|i| ((i % w) * 7 + (i / w) * 13) as u8).collect()
    }

    const FILTERS: [FilterMode; 4] =
        [FilterMode::None, FilterMode::Linear, FilterMode::Bilinear, FilterMode::Box];

    #[test]
    fn same_size_is_a_copy() {
        let src = ramp(13, 7);
        for f in FILTERS {
            let mut dst = vec![0u8; 13 * 7];
            scale_plane(&src, 13, 13, 7, &mut dst, 13, 13, 7, f).unwrap();
            assert_eq!(dst, src, "{f:?}");
        }
    }

    #[test]
    fn point_sampling_identity_through_generic_path() {
        let src = ramp(9, 5);
        let s = Rows::new(&src, 9, 9, 5).unwrap();
        let mut out = vec![0u8; 45];
        let mut d = RowsMut::new(&mut out, 9, 9, 5).unwrap();
        resample(&s, &mut d, 1, (9, 5), (0, 0), FilterMode::None);
        assert_eq!(out, src);
    }

    #[test]
    fn flat_fields_stay_flat() {
        let src = vec![123u8; 40 * 30];
        for f in FILTERS {
            for (dw, dh) in [(20, 15), (30, 22), (15, 11), (10, 7), (5, 3), (57, 41), (1, 1)] {
                let mut dst = vec![0u8; dw * dh];
                scale_plane(&src, 40, 40, 30, &mut dst, dw, dw, dh, f).unwrap();
                assert!(dst.iter().all(|&v| v == 123), "{f:?} {dw}x{dh}");
            }
        }
    }

    #[test]
    fn negative_height_matches_flipped_source() {
        let (w, h) = (24usize, 18usize);
        let src = ramp(w, h);
        let flipped: Vec<u8> = src.chunks_exact(w).rev().flatten().copied().collect();
        for f in FILTERS {
            let mut a = vec![0u8; 10 * 7];
            let mut b = vec![0u8; 10 * 7];
            scale_plane(&src, w, w, -(h as i32), &mut a, 10, 10, 7, f).unwrap();
            scale_plane(&flipped, w, w, h as i32, &mut b, 10, 10, 7, f).unwrap();
            assert_eq!(a, b, "{f:?}");
        }
    }

    #[test]
    fn half_box_matches_rounded_mean() {
        let src = ramp(32, 8);
        let mut dst = vec![0u8; 16 * 4];
        scale_plane(&src, 32, 32, 8, &mut dst, 16, 16, 4, FilterMode::Box).unwrap();
        for y in 0..4 {
            for x in 0..16 {
                let s = src[2 * y * 32 + 2 * x] as u32
                    + src[2 * y * 32 + 2 * x + 1] as u32
                    + src[(2 * y + 1) * 32 + 2 * x] as u32
                    + src[(2 * y + 1) * 32 + 2 * x + 1] as u32;
                assert_eq!(dst[y * 16 + x] as u32, (s + 2) / 4);
            }
        }
    }

    #[test]
    fn i420_scale_chroma_rounds_up() {
        let (sw, sh, dw, dh) = (5usize, 5usize, 3usize, 3usize);
        let y = vec![50u8; sw * sh];
        let u = vec![60u8; 9];
        let v = vec![70u8; 9];
        let mut dy = vec![0u8; dw * dh];
        let mut du = vec![0u8; 4];
        let mut dv = vec![0u8; 4];
        i420_scale(
            &y, sw, &u, 3, &v, 3, sw, sh as i32, &mut dy, dw, &mut du, 2, &mut dv, 2, dw, dh,
            FilterMode::Bilinear,
        )
        .unwrap();
        assert!(dy.iter().all(|&p| p == 50));
        assert_eq!(du, [60; 4]);
        assert_eq!(dv, [70; 4]);
    }

    #[test]
    fn letterbox_leaves_borders() {
        let (sw, sh) = (8usize, 8usize);
        let mut src = vec![200u8; sw * sh];
        src.extend(vec![90u8; 2 * 16]);
        let (dw, dh) = (8usize, 12usize);
        let mut dst = vec![7u8; dw * dh + 2 * 4 * 6];
        scale_i420_letterbox(&src, sw, sh, &mut dst, dw, dh, 3, true).unwrap();
        // offset 3 rounds to 2: rows 0..2 and 10..12 keep their fill.
        assert!(dst[..2 * dw].iter().all(|&v| v == 7));
        assert!(dst[2 * dw..10 * dw].iter().all(|&v| v == 200));
        assert!(dst[10 * dw..12 * dw].iter().all(|&v| v == 7));
        let u = &dst[dw * dh..dw * dh + 24];
        assert!(u[..4].iter().all(|&v| v == 7));
        assert!(u[4..20].iter().all(|&v| v == 90));
        assert!(u[20..].iter().all(|&v| v == 7));
    }

    #[test]
    fn rejects_bad_geometry_without_writing() {
        let src = vec![1u8; 16];
        let mut dst = vec![9u8; 4];
        assert!(scale_plane(&src, 4, 4, 0, &mut dst, 2, 2, 2, FilterMode::None).is_err());
        assert!(scale_plane(&src, 4, 0, 4, &mut dst, 2, 2, 2, FilterMode::None).is_err());
        assert_eq!(
            scale_plane(&src, 4, 4, 4, &mut dst, 2, 2, 3, FilterMode::None),
            Err(Error::BufferTooSmall { needed: 6, len: 4 })
        );
        assert_eq!(dst, [9; 4]);
        assert!(scale_i420_letterbox(&src, 2, 2, &mut dst, 2, 2, 2, false).is_err());
    }

    #[test]
    fn huge_box_shrink_keeps_flat_value() {
        let n = 5000;
        let src = vec![255u8; n * n];
        let mut dst = [0u8; 1];
        scale_plane(&src, n, n, n as i32, &mut dst, 1, 1, 1, FilterMode::Box).unwrap();
        assert_eq!(dst, [255]);

        let mut dst = [0u8; 3 * 2];
        scale_plane(&src, n, n, n as i32, &mut dst, 3, 3, 2, FilterMode::Box).unwrap();
        assert_eq!(dst, [255; 6]);
    }
}
