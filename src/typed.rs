//! Conversions over [`rgb`] pixel slices, via bytemuck.
//!
//! `Bgra<u8>` has the byte order this crate calls ARGB, `Bgr<u8>` is RGB24
//! and `Rgb<u8>` is RAW. Buffers here are tightly packed `width * height`
//! pixels; use the byte-level functions for strided planes.
//!
//! ```rust
//! use rgb::{Bgra, Rgb};
//! use tailor::typed;
//!
//! let src = vec![Rgb::new(255u8, 0, 128); 4 * 2];
//! let mut dst = vec![Bgra::default(); 4 * 2];
//! typed::rgb_to_bgra(&src, &mut dst, 4, 2).unwrap();
//! assert_eq!(dst[0], Bgra { b: 128, g: 0, r: 255, a: 255 });
//! ```

use rgb::{Bgr, Bgra, Rgb};

use crate::{Error, FilterMode, RotationMode};

fn height(h: usize) -> Result<i32, Error> {
    i32::try_from(h).map_err(|_| Error::InvalidArgument("height exceeds i32"))
}

/// `Bgr<u8>` pixels (RGB24) to `Bgra<u8>`.
pub fn bgr_to_bgra(src: &[Bgr<u8>], dst: &mut [Bgra<u8>], width: usize, h: usize) -> Result<(), Error> {
    crate::rgb24_to_argb(
        bytemuck::cast_slice(src),
        width * 3,
        bytemuck::cast_slice_mut(dst),
        width * 4,
        width,
        height(h)?,
    )
}

/// `Rgb<u8>` pixels (RAW) to `Bgra<u8>`.
pub fn rgb_to_bgra(src: &[Rgb<u8>], dst: &mut [Bgra<u8>], width: usize, h: usize) -> Result<(), Error> {
    crate::raw_to_argb(
        bytemuck::cast_slice(src),
        width * 3,
        bytemuck::cast_slice_mut(dst),
        width * 4,
        width,
        height(h)?,
    )
}

/// `Bgra<u8>` pixels to `Rgb<u8>`, dropping alpha.
pub fn bgra_to_rgb(src: &[Bgra<u8>], dst: &mut [Rgb<u8>], width: usize, h: usize) -> Result<(), Error> {
    crate::argb_to_raw(
        bytemuck::cast_slice(src),
        width * 4,
        bytemuck::cast_slice_mut(dst),
        width * 3,
        width,
        height(h)?,
    )
}

/// Tightly packed I420 planes to `Bgra<u8>`.
pub fn i420_to_bgra(
    y: &[u8],
    u: &[u8],
    v: &[u8],
    dst: &mut [Bgra<u8>],
    width: usize,
    h: usize,
) -> Result<(), Error> {
    let cw = width.div_ceil(2);
    crate::i420_to_argb(y, width, u, cw, v, cw, bytemuck::cast_slice_mut(dst), width * 4, width, height(h)?)
}

/// `Bgra<u8>` pixels to tightly packed I420 planes.
pub fn bgra_to_i420(
    src: &[Bgra<u8>],
    y: &mut [u8],
    u: &mut [u8],
    v: &mut [u8],
    width: usize,
    h: usize,
) -> Result<(), Error> {
    let cw = width.div_ceil(2);
    crate::argb_to_i420(bytemuck::cast_slice(src), width * 4, y, width, u, cw, v, cw, width, height(h)?)
}

/// Resample `src_width x src_height` pixels into `dst_width x dst_height`.
pub fn bgra_scale(
    src: &[Bgra<u8>],
    src_width: usize,
    src_height: usize,
    dst: &mut [Bgra<u8>],
    dst_width: usize,
    dst_height: usize,
    filter: FilterMode,
) -> Result<(), Error> {
    crate::argb_scale(
        bytemuck::cast_slice(src),
        src_width * 4,
        src_width,
        height(src_height)?,
        bytemuck::cast_slice_mut(dst),
        dst_width * 4,
        dst_width,
        dst_height,
        filter,
    )
}

/// Rotate `width x height` pixels; `dst` is `height x width` for quarter
/// turns.
pub fn bgra_rotate(
    src: &[Bgra<u8>],
    dst: &mut [Bgra<u8>],
    width: usize,
    h: usize,
    mode: RotationMode,
) -> Result<(), Error> {
    let dst_width = if mode.swaps_axes() { h } else { width };
    crate::argb_rotate(
        bytemuck::cast_slice(src),
        width * 4,
        bytemuck::cast_slice_mut(dst),
        dst_width * 4,
        width,
        height(h)?,
        mode,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn pixel_orders_line_up() {
        let px = Bgra { b: 1u8, g: 2, r: 3, a: 4 };
        let src = vec![px; 6];
        let mut rgb = vec![Rgb::default(); 6];
        bgra_to_rgb(&src, &mut rgb, 3, 2).unwrap();
        assert!(rgb.iter().all(|p| *p == Rgb::new(3, 2, 1)));
        let mut back = vec![Bgra::default(); 6];
        rgb_to_bgra(&rgb, &mut back, 3, 2).unwrap();
        assert!(back.iter().all(|p| *p == Bgra { b: 1, g: 2, r: 3, a: 255 }));
        let bgr = vec![Bgr { b: 1u8, g: 2, r: 3 }; 6];
        bgr_to_bgra(&bgr, &mut back, 3, 2).unwrap();
        assert!(back.iter().all(|p| *p == Bgra { b: 1, g: 2, r: 3, a: 255 }));
    }

    #[test]
    fn short_pixel_buffer_is_an_error() {
        let src = vec![Bgra::<u8>::default(); 5];
        let mut dst = vec![Bgra::<u8>::default(); 6];
        assert!(matches!(
            bgra_rotate(&src, &mut dst, 3, 2, RotationMode::Rotate90),
            Err(Error::BufferTooSmall { .. })
        ));
    }

    #[test]
    fn gray_through_i420() {
        let src = vec![Bgra { b: 128u8, g: 128, r: 128, a: 255 }; 16];
        let (mut y, mut u, mut v) = (vec![0u8; 16], vec![0u8; 4], vec![0u8; 4]);
        bgra_to_i420(&src, &mut y, &mut u, &mut v, 4, 4).unwrap();
        let mut out = vec![Bgra::default(); 16];
        i420_to_bgra(&y, &u, &v, &mut out, 4, 4).unwrap();
        assert!(out.iter().all(|p| p.r.abs_diff(128) <= 3 && p.r == p.g && p.g == p.b));
    }
}
