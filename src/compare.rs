//! Frame comparison: hashing, squared error and PSNR.

use crate::Error;
use crate::convert::{frame, src_view};
use crate::dispatch::{Geometry, SIMD_ALIGN};
use crate::plane::half;
use crate::row;

/// PSNR reported for identical inputs.
pub const MAX_PSNR: f64 = 128.0;

/// djb2 over `data`: `hash = hash * 33 + byte`, wrapping. 5381 is the usual
/// seed.
pub fn hash_djb2(data: &[u8], seed: u32) -> u32 {
    data.iter()
        .fold(seed, |h, &b| h.wrapping_mul(33).wrapping_add(b as u32))
}

/// Sum of squared differences of two equally long buffers.
pub fn sum_square_error(a: &[u8], b: &[u8]) -> Result<u64, Error> {
    if a.len() != b.len() {
        return Err(Error::InvalidArgument("buffers differ in length"));
    }
    let aligned = (a.as_ptr() as usize).is_multiple_of(SIMD_ALIGN)
        && (b.as_ptr() as usize).is_multiple_of(SIMD_ALIGN);
    let k = row::SUM_SQUARE_ERROR.bind(Geometry::new(a.len(), aligned));
    Ok(row::sum_square_error(k, a, b))
}

/// Sum of squared differences of two planes of `width` x `height` bytes.
pub fn sum_square_error_plane(
    src_a: &[u8],
    stride_a: usize,
    src_b: &[u8],
    stride_b: usize,
    width: usize,
    height: i32,
) -> Result<u64, Error> {
    let (rows, flip) = frame(width, height)?;
    let a = src_view(src_a, stride_a, width, rows, flip)?;
    let b = src_view(src_b, stride_b, width, rows, flip)?;
    let k = row::SUM_SQUARE_ERROR.bind(Geometry::new(width, false));
    Ok((0..rows).map(|j| row::sum_square_error(k, a.row(j), b.row(j))).sum())
}

/// Peak signal-to-noise ratio in dB for `sse` over `count` samples, capped
/// at [`MAX_PSNR`].
#[cfg(feature = "std")]
pub fn psnr(sse: u64, count: u64) -> f64 {
    if sse == 0 || count == 0 {
        return MAX_PSNR;
    }
    let mse = sse as f64 / count as f64;
    (10.0 * (255.0 * 255.0 / mse).log10()).min(MAX_PSNR)
}

/// PSNR over all three planes of two I420 frames.
#[cfg(feature = "std")]
pub fn i420_psnr(
    src_y_a: &[u8],
    stride_y_a: usize,
    src_u_a: &[u8],
    stride_u_a: usize,
    src_v_a: &[u8],
    stride_v_a: usize,
    src_y_b: &[u8],
    stride_y_b: usize,
    src_u_b: &[u8],
    stride_u_b: usize,
    src_v_b: &[u8],
    stride_v_b: usize,
    width: usize,
    height: i32,
) -> Result<f64, Error> {
    let (rows, _) = frame(width, height)?;
    let (cw, ch) = (half(width), half(rows) as i32 * height.signum());
    let sse = sum_square_error_plane(src_y_a, stride_y_a, src_y_b, stride_y_b, width, height)?
        + sum_square_error_plane(src_u_a, stride_u_a, src_u_b, stride_u_b, cw, ch)?
        + sum_square_error_plane(src_v_a, stride_v_a, src_v_b, stride_v_b, cw, ch)?;
    let count = (width * rows + 2 * cw * half(rows)) as u64;
    Ok(psnr(sse, count))
}

#[cfg(test)]
mod tests {
    extern crate alloc;
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn djb2_matches_the_textbook_definition() {
        assert_eq!(hash_djb2(b"", 5381), 5381);
        assert_eq!(hash_djb2(b"a", 5381), 5381 * 33 + 97);
        assert_eq!(hash_djb2(b"ab", 0), 97 * 33 + 98);
    }

    #[test]
    fn sse_over_long_buffers() {
        let a: Vec<u8> = (0..10_000).map(|i| (i % 251) as u8).collect();
        let b: Vec<u8> = a.iter().map(|&x| x ^ 3).collect();
        let want: u64 = a.iter().zip(&b).map(|(&x, &y)| (x.abs_diff(y) as u64).pow(2)).sum();
        assert_eq!(sum_square_error(&a, &b), Ok(want));
        assert_eq!(sum_square_error(&a, &a), Ok(0));
        assert!(sum_square_error(&a, &b[1..]).is_err());
    }

    #[test]
    fn plane_sse_ignores_stride_padding() {
        let a = [1u8, 2, 99, 3, 4, 99];
        let b = [1u8, 4, 0, 6, 4, 0];
        assert_eq!(sum_square_error_plane(&a, 3, &b, 3, 2, 2), Ok(4 + 9));
    }

    #[cfg(feature = "std")]
    #[test]
    fn psnr_values() {
        assert_eq!(psnr(0, 100), MAX_PSNR);
        // mse 1 -> 20 * log10(255)
        assert!((psnr(100, 100) - 48.1308).abs() < 1e-3);

        let y = [10u8; 16];
        let c = [128u8; 4];
        let y2 = [11u8; 16];
        let p = i420_psnr(&y, 4, &c, 2, &c, 2, &y2, 4, &c, 2, &c, 2, 4, 4).unwrap();
        assert!((p - psnr(16, 24)).abs() < 1e-9);
        let same = i420_psnr(&y, 4, &c, 2, &c, 2, &y, 4, &c, 2, &c, 2, 4, -4).unwrap();
        assert_eq!(same, MAX_PSNR);
    }
}
