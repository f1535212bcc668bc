//! Whole-image operations on [`imgref`] images of [`Bgra<u8>`] pixels.
//!
//! Sources may be strided sub-images; results are freshly allocated,
//! tightly packed [`ImgVec`]s.
//!
//! ```rust
//! use rgb::Bgra;
//! use imgref::ImgVec;
//! use tailor::{FilterMode, RotationMode, img};
//!
//! let frame = ImgVec::new(vec![Bgra { b: 10u8, g: 20, r: 30, a: 255 }; 64 * 48], 64, 48);
//! let thumb = img::scale(frame.as_ref(), 16, 12, FilterMode::Box).unwrap();
//! let portrait = img::rotate(thumb.as_ref(), RotationMode::Rotate90).unwrap();
//! assert_eq!((portrait.width(), portrait.height()), (12, 16));
//! ```

use alloc::vec;

use imgref::{ImgRef, ImgVec};
use rgb::Bgra;

use crate::{Error, FilterMode, RotationMode};

fn height(h: usize) -> Result<i32, Error> {
    i32::try_from(h).map_err(|_| Error::InvalidArgument("height exceeds i32"))
}

fn bytes<'b>(img: &'b ImgRef<'_, Bgra<u8>>) -> (&'b [u8], usize) {
    (bytemuck::cast_slice(&img.buf()[..]), img.stride() * 4)
}

fn blank(width: usize, height: usize) -> ImgVec<Bgra<u8>> {
    ImgVec::new(vec![Bgra::default(); width * height], width, height)
}

/// Resample to `width x height`.
pub fn scale(
    src: ImgRef<'_, Bgra<u8>>,
    width: usize,
    height_px: usize,
    filter: FilterMode,
) -> Result<ImgVec<Bgra<u8>>, Error> {
    let (data, stride) = bytes(&src);
    let mut dst = blank(width, height_px);
    crate::argb_scale(
        data,
        stride,
        src.width(),
        height(src.height())?,
        bytemuck::cast_slice_mut(&mut dst.buf_mut()[..]),
        width * 4,
        width,
        height_px,
        filter,
    )?;
    Ok(dst)
}

/// Rotate clockwise.
pub fn rotate(src: ImgRef<'_, Bgra<u8>>, mode: RotationMode) -> Result<ImgVec<Bgra<u8>>, Error> {
    let (w, h) = (src.width(), src.height());
    let (dw, dh) = if mode.swaps_axes() { (h, w) } else { (w, h) };
    let (data, stride) = bytes(&src);
    let mut dst = blank(dw, dh);
    let out = bytemuck::cast_slice_mut(&mut dst.buf_mut()[..]);
    crate::argb_rotate(data, stride, out, dw * 4, w, height(h)?, mode)?;
    Ok(dst)
}

/// Mirror left to right.
pub fn mirror(src: ImgRef<'_, Bgra<u8>>) -> Result<ImgVec<Bgra<u8>>, Error> {
    let (w, h) = (src.width(), src.height());
    let (data, stride) = bytes(&src);
    let mut dst = blank(w, h);
    let out = bytemuck::cast_slice_mut(&mut dst.buf_mut()[..]);
    crate::argb_mirror(data, stride, out, w * 4, w, height(h)?)?;
    Ok(dst)
}

/// Convert I420 planes to an image the size of the luma plane. Each chroma
/// plane must cover `(width + 1) / 2 x (height + 1) / 2`.
pub fn i420_to_bgra(
    y: ImgRef<'_, u8>,
    u: ImgRef<'_, u8>,
    v: ImgRef<'_, u8>,
) -> Result<ImgVec<Bgra<u8>>, Error> {
    let (w, h) = (y.width(), y.height());
    let (cw, ch) = (w.div_ceil(2), h.div_ceil(2));
    if [u, v].iter().any(|c| c.width() < cw || c.height() < ch) {
        return Err(Error::InvalidArgument("chroma plane smaller than half the luma plane"));
    }
    let mut dst = blank(w, h);
    crate::i420_to_argb(
        y.buf(),
        y.stride(),
        u.buf(),
        u.stride(),
        v.buf(),
        v.stride(),
        bytemuck::cast_slice_mut(&mut dst.buf_mut()[..]),
        w * 4,
        w,
        height(h)?,
    )?;
    Ok(dst)
}
