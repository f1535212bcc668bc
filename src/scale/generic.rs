// ---------------------------------------------------------------------------
// Arbitrary-ratio resampling shared by planes (1 byte per pixel) and ARGB
// (4 bytes per pixel).
//
// Each path takes the source view, the destination view of the region being
// produced and the two coordinate steppers, already advanced to the region's
// first row and column.
// ---------------------------------------------------------------------------

use alloc::vec;
use alloc::vec::Vec;

use super::fixed::Step;
use crate::dispatch::Geometry;
use crate::plane::{Rows, RowsMut};
use crate::row;

#[inline]
fn index(pos: u64, limit: usize) -> usize {
    ((pos >> 16) as usize).min(limit - 1)
}

/// Nearest-neighbour sampling.
pub(crate) fn point(src: &Rows<'_>, dst: &mut RowsMut<'_>, bpp: usize, mut x: Step, mut y: Step) {
    let src_w = src.row_bytes() / bpp;
    let cols: Vec<usize> = (0..dst.row_bytes() / bpp)
        .map(|_| {
            let i = index(x.pos(), src_w) * bpp;
            x.advance();
            i
        })
        .collect();
    for j in 0..dst.len() {
        let s = src.row(index(y.pos(), src.len()));
        y.advance();
        for (d, &at) in dst.row_mut(j).chunks_exact_mut(bpp).zip(&cols) {
            d.copy_from_slice(&s[at..at + bpp]);
        }
    }
}

/// Source column pair and 8-bit weight for each destination column.
fn filter_columns(mut x: Step, src_w: usize, dst_w: usize) -> Vec<(usize, usize, u32)> {
    (0..dst_w)
        .map(|_| {
            let p = x.pos();
            x.advance();
            let xi = index(p, src_w);
            (xi, (xi + 1).min(src_w - 1), ((p >> 8) & 255) as u32)
        })
        .collect()
}

fn filter_row(dst: &mut [u8], src: &[u8], bpp: usize, cols: &[(usize, usize, u32)]) {
    for (d, &(a, b, f)) in dst.chunks_exact_mut(bpp).zip(cols) {
        let (pa, pb) = (&src[a * bpp..][..bpp], &src[b * bpp..][..bpp]);
        for c in 0..bpp {
            d[c] = ((pa[c] as u32 * (256 - f) + pb[c] as u32 * f + 128) >> 8) as u8;
        }
    }
}

/// Two-tap horizontal filtering, with two-row vertical blending when
/// `vertical` is set (bilinear) and nearest rows otherwise (linear).
pub(crate) fn bilinear(
    src: &Rows<'_>,
    dst: &mut RowsMut<'_>,
    bpp: usize,
    x: Step,
    mut y: Step,
    vertical: bool,
) {
    let src_w = src.row_bytes() / bpp;
    let src_h = src.len();
    let cols = filter_columns(x, src_w, dst.row_bytes() / bpp);
    let max_y = if src_h > 1 { (((src_h - 1) as u64) << 16) - 1 } else { 0 };
    let k = row::INTERPOLATE.bind(Geometry::new(src.row_bytes(), false));
    let mut blended = vec![0u8; src.row_bytes()];
    for j in 0..dst.len() {
        let p = y.pos().min(max_y);
        y.advance();
        let yi = (p >> 16) as usize;
        let line = if vertical {
            let f = ((p >> 8) & 255) as u8;
            row::interpolate(k, &mut blended, src.row(yi), src.row_clamped(yi + 1), f);
            &blended[..]
        } else {
            src.row(yi)
        };
        filter_row(dst.row_mut(j), line, bpp, &cols);
    }
}

/// Area averaging for downscales: every destination pixel is the rounded
/// mean of the source box its footprint covers.
pub(crate) fn boxed(src: &Rows<'_>, dst: &mut RowsMut<'_>, bpp: usize, x: Step, mut y: Step) {
    let src_w = src.row_bytes() / bpp;
    let src_h = src.len();
    let limit_y = (src_h as u64) << 16;

    let mut bounds = Vec::with_capacity(dst.row_bytes() / bpp);
    let mut xs = x;
    for _ in 0..dst.row_bytes() / bpp {
        let ix = index(xs.pos(), src_w);
        xs.advance();
        let end = ((xs.pos() >> 16) as usize).clamp(ix + 1, src_w);
        bounds.push((ix, end));
    }

    let mut sums = vec![0u64; src.row_bytes()];
    for j in 0..dst.len() {
        let iy = index(y.pos(), src_h);
        y.advance();
        let end = ((y.pos().min(limit_y) >> 16) as usize).clamp(iy + 1, src_h);
        sums.fill(0);
        for r in iy..end {
            for (s, &v) in sums.iter_mut().zip(src.row(r)) {
                *s += v as u64;
            }
        }
        let box_h = (end - iy) as u64;
        for (d, &(ix, ex)) in dst.row_mut(j).chunks_exact_mut(bpp).zip(&bounds) {
            let area = (ex - ix) as u64 * box_h;
            for c in 0..bpp {
                let sum: u64 = (ix..ex).map(|i| sums[i * bpp + c]).sum();
                d[c] = ((sum + area / 2) / area) as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[u8], w: usize, h: usize) -> Rows<'_> {
        Rows::new(data, w, w, h).unwrap()
    }

    #[test]
    fn point_identity() {
        let src: Vec<u8> = (0..48).collect();
        let mut out = vec![0u8; 48];
        let mut dst = RowsMut::new(&mut out, 8, 8, 6).unwrap();
        point(&rows(&src, 8, 6), &mut dst, 1, Step::new(1 << 15, 8, 8), Step::new(1 << 15, 6, 6));
        assert_eq!(out, src);
    }

    #[test]
    fn bilinear_midpoints() {
        // Two columns, 0 and 200; upsampling to three puts the middle at 100.
        let src = [0u8, 200, 0, 200];
        let mut out = [0u8; 6];
        let mut dst = RowsMut::new(&mut out, 3, 3, 2).unwrap();
        bilinear(&rows(&src, 2, 2), &mut dst, 1, Step::new(0, 1, 2), Step::new(0, 1, 1), true);
        assert_eq!(out, [0, 100, 200, 0, 100, 200]);
    }

    #[test]
    fn box_averages_with_rounding() {
        let src = [1u8, 2, 3, 4, 5, 6, 7, 8, 9];
        let mut out = [0u8; 1];
        let mut dst = RowsMut::new(&mut out, 1, 1, 1).unwrap();
        boxed(&rows(&src, 3, 3), &mut dst, 1, Step::new(0, 3, 1), Step::new(0, 3, 1));
        assert_eq!(out, [5]);
    }

    #[test]
    fn argb_channels_stay_separate() {
        let src = [10u8, 20, 30, 255, 30, 40, 50, 255];
        let mut out = [0u8; 4];
        let mut dst = RowsMut::new(&mut out, 4, 4, 1).unwrap();
        boxed(&rows(&src, 8, 1), &mut dst, 4, Step::new(0, 2, 1), Step::new(0, 1, 1));
        assert_eq!(out, [20, 30, 40, 255]);
    }
}
