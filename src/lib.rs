//! # tailor
//!
//! *Cut your frames to fit.*
//!
//! Video frames arrive in whatever layout the camera, decoder or capture card
//! felt like producing: I420, NV12, YUY2, a Bayer mosaic, a 16-bit RGB
//! variant. `tailor` converts between them, resamples them to a new size,
//! rotates and mirrors them, and measures how far two frames have drifted
//! apart.
//!
//! Hot rows run through SIMD kernels on x86-64 AVX2 and AArch64 NEON, picked
//! at run time from the detected CPU features. Every kernel has a scalar twin
//! that produces the same bytes, so output never depends on the machine.
//!
//! ## Conventions
//!
//! Every operation takes plain byte slices with a stride per plane, a width
//! in pixels and a signed height. A negative height reads the source
//! bottom-up. Geometry is validated before anything is written: an `Err`
//! means the destination is untouched.
//!
//! Byte orders follow the little-endian FourCC names: `ARGB` pixels are
//! stored B, G, R, A in memory, `RGB24` is B, G, R and `RAW` is R, G, B.
//!
//! ```rust
//! let (w, h) = (4usize, 2usize);
//! let y = [81u8; 8];
//! let (u, v) = ([90u8; 2], [240u8; 2]);
//! let mut argb = [0u8; 32];
//! tailor::i420_to_argb(&y, w, &u, 2, &v, 2, &mut argb, w * 4, w, h as i32).unwrap();
//! // Studio-swing red, bytes B, G, R, A.
//! assert_eq!(&argb[..4], &[0, 0, 254, 255]);
//! ```
//!
//! ## Feature flags
//!
//! - **`std`** (default): runtime CPU detection, the `TAILOR_DISABLE_*`
//!   environment overrides and PSNR.
//! - **`rgb`**: conversions over [`rgb`] pixel slices in [`typed`].
//! - **`imgref`**: whole-image operations on [`imgref`] images in [`img`].
//!   Implies `rgb`.

#![no_std]
#![forbid(unsafe_code)]
#![allow(clippy::too_many_arguments)]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

mod bayer;
mod color;
mod compare;
mod convert;
pub mod cpu;
mod dispatch;
mod error;
mod fourcc;
mod planar;
mod plane;
mod rotate;
mod row;
mod scale;

pub use bayer::{BayerOrder, argb_to_bayer, bayer_to_argb, bayer_to_i420};
#[cfg(feature = "std")]
pub use compare::{i420_psnr, psnr};
pub use compare::{MAX_PSNR, hash_djb2, sum_square_error, sum_square_error_plane};
pub use convert::*;
pub use error::Error;
pub use fourcc::{FourCc, PixelFormat, validate_jpeg};
pub use planar::{
    argb_attenuate, argb_blend, argb_blur, argb_color_matrix, argb_color_table,
    argb_compute_cumulative_sum, argb_copy, argb_gray, argb_quantize, argb_rect, argb_sepia,
    argb_unattenuate, copy_plane, i420_rect, set_plane,
};
pub use rotate::{
    RotationMode, argb_mirror, argb_rotate, i420_mirror, i420_rotate, mirror_plane,
    nv12_to_i420_rotate, rotate_plane, rotate_uv,
};
pub use scale::{FilterMode, argb_scale, argb_scale_clip, i420_scale, scale_i420_letterbox, scale_plane};

#[cfg(feature = "rgb")]
pub mod typed;

#[cfg(feature = "imgref")]
pub mod img;
