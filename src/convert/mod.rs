//! Pixel-format conversion.
//!
//! Every function takes source planes with their strides, destination planes
//! with theirs, a width in pixels and a signed height. A negative height
//! reads the source bottom-up; destinations are always written top-down.
//! All geometry is validated before the first byte is written.
//!
//! The FourCC entry points ([`convert_to_argb`], [`convert_to_i420`],
//! [`convert_from_i420`]) work on a single contiguous sample buffer. Planar
//! samples hold the luma plane (`stride * rows` bytes) followed by tightly
//! packed chroma planes, V first for the YV layouts. A stride of 0 means
//! tightly packed rows.

mod from_argb;
mod from_i420;
mod to_argb;
mod yuv;

pub use from_argb::*;
pub use from_i420::*;
pub use to_argb::*;
pub use yuv::*;

use crate::Error;
use crate::bayer;
use crate::fourcc::{FourCc, PixelFormat, validate_jpeg};
use crate::plane::{Rows, check_width, half, quarter, row_bytes, rows_of};

/// Validate `width` and resolve `height` into `(rows, bottom_up)`.
pub(crate) fn frame(width: usize, height: i32) -> Result<(usize, bool), Error> {
    check_width(width)?;
    rows_of(height)
}

/// A validated source view, walked bottom-up when `flip` is set.
pub(crate) fn src_view(
    data: &[u8],
    stride: usize,
    row_bytes: usize,
    rows: usize,
    flip: bool,
) -> Result<Rows<'_>, Error> {
    Ok(Rows::new(data, stride, row_bytes, rows)?.flipped(flip))
}

fn stride_or(stride: usize, tight: usize) -> usize {
    if stride == 0 { tight } else { stride }
}

/// Chroma plane size of a planar layout.
fn chroma_size(format: PixelFormat, width: usize, rows: usize) -> (usize, usize) {
    match format {
        PixelFormat::I420 => (half(width), half(rows)),
        PixelFormat::I422 => (half(width), rows),
        PixelFormat::I444 => (width, rows),
        PixelFormat::I411 => (quarter(width), rows),
        PixelFormat::Nv12 | PixelFormat::Nv21 => (half(width) * 2, half(rows)),
        _ => (0, 0),
    }
}

/// Byte offsets of the planes of a contiguous planar sample:
/// `(luma_bytes, chroma_bytes)`.
fn planar_extent(
    len: usize,
    luma_stride: usize,
    rows: usize,
    (cw, ch): (usize, usize),
    planes: usize,
) -> Result<(usize, usize), Error> {
    let overflow = Error::InvalidArgument("frame size overflows usize");
    let luma = luma_stride.checked_mul(rows).ok_or(overflow)?;
    let chroma = cw.checked_mul(ch).ok_or(overflow)?;
    let needed = chroma
        .checked_mul(planes)
        .and_then(|c| c.checked_add(luma))
        .ok_or(overflow)?;
    if len < needed {
        return Err(Error::BufferTooSmall { needed, len });
    }
    Ok((luma, chroma))
}

/// Split a planar sample into `[(y, stride), (u, stride), (v, stride)]`.
fn split_planar<'a>(
    sample: &'a [u8],
    luma_stride: usize,
    rows: usize,
    size: (usize, usize),
    swap: bool,
) -> Result<[(&'a [u8], usize); 3], Error> {
    let (luma, chroma) = planar_extent(sample.len(), luma_stride, rows, size, 2)?;
    let (y, rest) = sample.split_at(luma);
    let (a, b) = rest.split_at(chroma);
    let (u, v) = if swap { (b, a) } else { (a, b) };
    Ok([(y, luma_stride), (u, size.0), (v, size.0)])
}

fn split_planar_mut<'a>(
    sample: &'a mut [u8],
    luma_stride: usize,
    rows: usize,
    size: (usize, usize),
    swap: bool,
) -> Result<[(&'a mut [u8], usize); 3], Error> {
    let (luma, chroma) = planar_extent(sample.len(), luma_stride, rows, size, 2)?;
    let (y, rest) = sample.split_at_mut(luma);
    let (a, b) = rest.split_at_mut(chroma);
    let (u, v) = if swap { (b, a) } else { (a, b) };
    Ok([(y, luma_stride), (u, size.0), (v, size.0)])
}

/// Resolve a FourCC, turning MJPG into the matching error.
fn resolve(format: FourCc, sample: Option<&[u8]>) -> Result<(PixelFormat, bool), Error> {
    let code = format.canonical();
    if code == FourCc::MJPG {
        if let Some(s) = sample
            && !validate_jpeg(s)
        {
            return Err(Error::InvalidArgument("malformed JPEG sample"));
        }
        return Err(Error::Unsupported("MJPG decoding"));
    }
    let pf = PixelFormat::from_fourcc(code).ok_or(Error::Unsupported("unknown FourCC"))?;
    Ok((pf, code.swaps_uv()))
}

/// Convert a sample in any supported layout to ARGB.
///
/// MJPG samples are checked for a well-formed JPEG envelope and then
/// rejected with [`Error::Unsupported`].
pub fn convert_to_argb(
    sample: &[u8],
    sample_stride: usize,
    format: FourCc,
    dst_argb: &mut [u8],
    dst_stride_argb: usize,
    width: usize,
    height: i32,
) -> Result<(), Error> {
    let (pf, swap) = resolve(format, Some(sample))?;
    let (rows, _) = frame(width, height)?;
    let tight = row_bytes(width, pf.bytes_per_pixel())?;
    let stride = stride_or(sample_stride, tight);
    let ds = stride_or(dst_stride_argb, row_bytes(width, 4)?);
    let d = dst_argb;
    match pf {
        PixelFormat::I420 | PixelFormat::I422 | PixelFormat::I444 | PixelFormat::I411 => {
            let [(y, ys), (u, us), (v, vs)] =
                split_planar(sample, stride, rows, chroma_size(pf, width, rows), swap)?;
            let f = match pf {
                PixelFormat::I420 => i420_to_argb,
                PixelFormat::I422 => i422_to_argb,
                PixelFormat::I444 => i444_to_argb,
                _ => i411_to_argb,
            };
            f(y, ys, u, us, v, vs, d, ds, width, height)
        }
        PixelFormat::Nv12 | PixelFormat::Nv21 => {
            let size = chroma_size(pf, width, rows);
            let (luma, _) = planar_extent(sample.len(), stride, rows, size, 1)?;
            let (y, uv) = sample.split_at(luma);
            let f = if pf == PixelFormat::Nv12 { nv12_to_argb } else { nv21_to_argb };
            f(y, stride, uv, size.0, d, ds, width, height)
        }
        PixelFormat::M420 => {
            m420_to_argb(sample, stride_or(sample_stride, half(width) * 2), d, ds, width, height)
        }
        PixelFormat::Yuy2 => yuy2_to_argb(sample, stride_or(sample_stride, half(width) * 4), d, ds, width, height),
        PixelFormat::Uyvy => uyvy_to_argb(sample, stride_or(sample_stride, half(width) * 4), d, ds, width, height),
        PixelFormat::I400 => i400_to_argb(sample, stride, d, ds, width, height),
        PixelFormat::Argb => crate::planar::argb_copy(sample, stride, d, ds, width, height),
        PixelFormat::Bgra => bgra_to_argb(sample, stride, d, ds, width, height),
        PixelFormat::Abgr => abgr_to_argb(sample, stride, d, ds, width, height),
        PixelFormat::Rgba => rgba_to_argb(sample, stride, d, ds, width, height),
        PixelFormat::Rgb24 => rgb24_to_argb(sample, stride, d, ds, width, height),
        PixelFormat::Raw => raw_to_argb(sample, stride, d, ds, width, height),
        PixelFormat::Rgb565 => rgb565_to_argb(sample, stride, d, ds, width, height),
        PixelFormat::Argb1555 => argb1555_to_argb(sample, stride, d, ds, width, height),
        PixelFormat::Argb4444 => argb4444_to_argb(sample, stride, d, ds, width, height),
        PixelFormat::Bayer(order) => bayer::bayer_to_argb(sample, stride, d, ds, width, height, order),
    }
}

/// Convert a sample in any supported layout to I420.
pub fn convert_to_i420(
    sample: &[u8],
    sample_stride: usize,
    format: FourCc,
    dst_y: &mut [u8],
    dst_stride_y: usize,
    dst_u: &mut [u8],
    dst_stride_u: usize,
    dst_v: &mut [u8],
    dst_stride_v: usize,
    width: usize,
    height: i32,
) -> Result<(), Error> {
    let (pf, swap) = resolve(format, Some(sample))?;
    let (rows, _) = frame(width, height)?;
    let stride = stride_or(sample_stride, row_bytes(width, pf.bytes_per_pixel())?);
    let (dy, dys, du, dus, dv, dvs) = (dst_y, dst_stride_y, dst_u, dst_stride_u, dst_v, dst_stride_v);
    match pf {
        PixelFormat::I420 | PixelFormat::I422 | PixelFormat::I444 | PixelFormat::I411 => {
            let [(y, ys), (u, us), (v, vs)] =
                split_planar(sample, stride, rows, chroma_size(pf, width, rows), swap)?;
            let f = match pf {
                PixelFormat::I420 => i420_copy,
                PixelFormat::I422 => i422_to_i420,
                PixelFormat::I444 => i444_to_i420,
                _ => i411_to_i420,
            };
            f(y, ys, u, us, v, vs, dy, dys, du, dus, dv, dvs, width, height)
        }
        PixelFormat::Nv12 | PixelFormat::Nv21 => {
            let size = chroma_size(pf, width, rows);
            let (luma, _) = planar_extent(sample.len(), stride, rows, size, 1)?;
            let (y, uv) = sample.split_at(luma);
            let f = if pf == PixelFormat::Nv12 { nv12_to_i420 } else { nv21_to_i420 };
            f(y, stride, uv, size.0, dy, dys, du, dus, dv, dvs, width, height)
        }
        PixelFormat::Yuy2 | PixelFormat::Uyvy => {
            let stride = stride_or(sample_stride, half(width) * 4);
            let f = if pf == PixelFormat::Yuy2 { yuy2_to_i420 } else { uyvy_to_i420 };
            f(sample, stride, dy, dys, du, dus, dv, dvs, width, height)
        }
        PixelFormat::M420 => {
            let stride = stride_or(sample_stride, half(width) * 2);
            m420_to_i420(sample, stride, dy, dys, du, dus, dv, dvs, width, height)
        }
        PixelFormat::I400 => i400_to_i420(sample, stride, dy, dys, du, dus, dv, dvs, width, height),
        PixelFormat::Bayer(order) => {
            bayer::bayer_to_i420(sample, stride, dy, dys, du, dus, dv, dvs, width, height, order)
        }
        _ => {
            let f = match pf {
                PixelFormat::Argb => argb_to_i420,
                PixelFormat::Bgra => bgra_to_i420,
                PixelFormat::Abgr => abgr_to_i420,
                PixelFormat::Rgba => rgba_to_i420,
                PixelFormat::Rgb24 => rgb24_to_i420,
                PixelFormat::Raw => raw_to_i420,
                PixelFormat::Rgb565 => rgb565_to_i420,
                PixelFormat::Argb1555 => argb1555_to_i420,
                _ => argb4444_to_i420,
            };
            f(sample, stride, dy, dys, du, dus, dv, dvs, width, height)
        }
    }
}

/// Convert I420 planes into a sample of any supported layout.
pub fn convert_from_i420(
    src_y: &[u8],
    src_stride_y: usize,
    src_u: &[u8],
    src_stride_u: usize,
    src_v: &[u8],
    src_stride_v: usize,
    dst_sample: &mut [u8],
    dst_sample_stride: usize,
    width: usize,
    height: i32,
    format: FourCc,
) -> Result<(), Error> {
    let (pf, swap) = resolve(format, None)?;
    let (rows, _) = frame(width, height)?;
    let stride = stride_or(dst_sample_stride, row_bytes(width, pf.bytes_per_pixel())?);
    let (y, ys, u, us, v, vs) = (src_y, src_stride_y, src_u, src_stride_u, src_v, src_stride_v);
    let d = dst_sample;
    match pf {
        PixelFormat::I420 | PixelFormat::I422 | PixelFormat::I444 | PixelFormat::I411 => {
            let [(dy, dys), (du, dus), (dv, dvs)] =
                split_planar_mut(d, stride, rows, chroma_size(pf, width, rows), swap)?;
            let f = match pf {
                PixelFormat::I420 => i420_copy,
                PixelFormat::I422 => i420_to_i422,
                PixelFormat::I444 => i420_to_i444,
                _ => i420_to_i411,
            };
            f(y, ys, u, us, v, vs, dy, dys, du, dus, dv, dvs, width, height)
        }
        PixelFormat::Nv12 | PixelFormat::Nv21 => {
            let size = chroma_size(pf, width, rows);
            let (luma, _) = planar_extent(d.len(), stride, rows, size, 1)?;
            let (dy, duv) = d.split_at_mut(luma);
            let f = if pf == PixelFormat::Nv12 { i420_to_nv12 } else { i420_to_nv21 };
            f(y, ys, u, us, v, vs, dy, stride, duv, size.0, width, height)
        }
        PixelFormat::Yuy2 | PixelFormat::Uyvy => {
            let stride = stride_or(dst_sample_stride, half(width) * 4);
            let f = if pf == PixelFormat::Yuy2 { i420_to_yuy2 } else { i420_to_uyvy };
            f(y, ys, u, us, v, vs, d, stride, width, height)
        }
        PixelFormat::I400 => i420_to_i400(y, ys, u, us, v, vs, d, stride, width, height),
        PixelFormat::M420 => Err(Error::Unsupported("M420 output")),
        PixelFormat::Bayer(order) => {
            bayer::check_even(width, rows)?;
            from_i420::i420_through_argb([(y, ys), (u, us), (v, vs)], d, stride, 1, width, height, |s, o, j| {
                bayer::argb_to_bayer_row(s, o, order, j)
            })
        }
        _ => {
            let f = match pf {
                PixelFormat::Argb => i420_to_argb,
                PixelFormat::Bgra => i420_to_bgra,
                PixelFormat::Abgr => i420_to_abgr,
                PixelFormat::Rgba => i420_to_rgba,
                PixelFormat::Rgb24 => i420_to_rgb24,
                PixelFormat::Raw => i420_to_raw,
                PixelFormat::Rgb565 => i420_to_rgb565,
                PixelFormat::Argb1555 => i420_to_argb1555,
                _ => i420_to_argb4444,
            };
            f(y, ys, u, us, v, vs, d, stride, width, height)
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;
    use super::*;
    use crate::bayer::BayerOrder;
    use alloc::vec;
    use alloc::vec::Vec;

    fn i420_frame(w: usize, h: usize) -> Vec<u8> {
        let c = half(w) * half(h);
        let mut s: Vec<u8> = (0..w * h).map(|i| (i * 7 + 16) as u8).collect();
        s.extend((0..c).map(|i| (i * 29 + 60) as u8));
        s.extend((0..c).map(|i| 200u32.wrapping_sub(i as u32 * 23) as u8));
        s
    }

    #[test]
    fn yv12_swaps_chroma_planes() {
        let (w, h) = (6usize, 4usize);
        let s = i420_frame(w, h);
        let c = half(w) * half(h);
        let mut yv12 = s.clone();
        yv12[w * h..w * h + c].copy_from_slice(&s[w * h + c..]);
        yv12[w * h + c..].copy_from_slice(&s[w * h..w * h + c]);

        let mut a = vec![0u8; w * h * 4];
        let mut b = vec![0u8; w * h * 4];
        convert_to_argb(&s, 0, FourCc::I420, &mut a, 0, w, h as i32).unwrap();
        convert_to_argb(&yv12, 0, FourCc::YV12, &mut b, 0, w, h as i32).unwrap();
        assert_eq!(a, b);
        convert_to_argb(&s, 0, FourCc::IYUV, &mut b, 0, w, h as i32).unwrap();
        assert_eq!(a, b);

        let mut back = vec![0u8; s.len()];
        let (y, rest) = s.split_at(w * h);
        let (u, v) = rest.split_at(c);
        convert_from_i420(y, w, u, 3, v, 3, &mut back, 0, w, h as i32, FourCc::YV12).unwrap();
        assert_eq!(back, yv12);
    }

    #[test]
    fn i420_to_i420_is_a_copy() {
        let (w, h) = (5usize, 3usize);
        let s = i420_frame(w, h);
        let (mut y, mut u, mut v) = (vec![0u8; 15], vec![0u8; 6], vec![0u8; 6]);
        convert_to_i420(&s, 0, FourCc::I420, &mut y, w, &mut u, 3, &mut v, 3, w, h as i32).unwrap();
        assert_eq!([y, u, v].concat(), s);
    }

    #[test]
    fn generic_entry_points_agree_with_direct_calls() {
        let (w, h) = (8usize, 6usize);
        let s = i420_frame(w, h);
        let (y, rest) = s.split_at(w * h);
        let (u, v) = rest.split_at(12);
        for code in [FourCc::NV12, FourCc::YUY2, FourCc::RGB565, FourCc::BGRA, FourCc::ARGB] {
            let pf = PixelFormat::from_fourcc(code).unwrap();
            let mut sample = vec![0u8; w * h * 4];
            convert_from_i420(y, w, u, 4, v, 4, &mut sample, 0, w, h as i32, code).unwrap();
            let mut via = vec![0u8; w * h * 4];
            convert_to_argb(&sample, 0, code, &mut via, 0, w, h as i32).unwrap();
            let mut direct = vec![0u8; w * h * 4];
            i420_to_argb(y, w, u, 4, v, 4, &mut direct, w * 4, w, h as i32).unwrap();
            match pf {
                // 5/6-bit channels lose the low bits.
                PixelFormat::Rgb565 => {
                    let worst = via.iter().zip(&direct).map(|(a, b)| a.abs_diff(*b)).max();
                    assert!(worst <= Some(8), "{worst:?}");
                }
                _ => assert_eq!(via, direct, "{code:?}"),
            }
        }
    }

    #[test]
    fn mjpg_is_validated_then_unsupported() {
        let mut dst = vec![0u8; 16];
        let junk = vec![0u8; 100];
        assert!(matches!(
            convert_to_argb(&junk, 0, FourCc::MJPG, &mut dst, 0, 2, 2),
            Err(Error::InvalidArgument(_))
        ));
        let mut jpeg = vec![0u8; 100];
        jpeg[..2].copy_from_slice(&[0xff, 0xd8]);
        jpeg[98..].copy_from_slice(&[0xff, 0xd9]);
        assert_eq!(
            convert_to_argb(&jpeg, 0, FourCc::JPEG, &mut dst, 0, 2, 2),
            Err(Error::Unsupported("MJPG decoding"))
        );
        assert!(matches!(
            convert_to_argb(&jpeg, 0, FourCc::new(*b"ZZZZ"), &mut dst, 0, 2, 2),
            Err(Error::Unsupported(_))
        ));
    }

    #[test]
    fn short_planar_sample_is_rejected() {
        let s = i420_frame(4, 4);
        let mut dst = vec![0u8; 64];
        assert_eq!(
            convert_to_argb(&s[..s.len() - 1], 0, FourCc::I420, &mut dst, 0, 4, 4),
            Err(Error::BufferTooSmall { needed: 24, len: 23 })
        );
    }

    #[test]
    fn bayer_round_trip_through_i420() {
        let (w, h) = (4usize, 4usize);
        let s = i420_frame(w, h);
        let (y, rest) = s.split_at(16);
        let (u, v) = rest.split_at(4);
        let mut mosaic = vec![0u8; 16];
        convert_from_i420(y, w, u, 2, v, 2, &mut mosaic, 0, w, h as i32, FourCc::BA81).unwrap();
        assert_eq!(
            PixelFormat::from_fourcc(FourCc::BA81.canonical()),
            Some(PixelFormat::Bayer(BayerOrder::Bggr))
        );
        let mut argb = vec![0u8; 64];
        convert_to_argb(&mosaic, 0, FourCc::BGGR, &mut argb, 0, w, h as i32).unwrap();
        assert!(argb.chunks_exact(4).all(|p| p[3] == 255));
    }
}
