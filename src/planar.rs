// ---------------------------------------------------------------------------
// Whole-plane utilities: fills, copies and per-pixel ARGB effects.
//
// The effects work in place on `width x height` ARGB pixels; offset the slice
// to address a sub-rectangle. Alpha passes through unchanged unless an effect
// says otherwise.
// ---------------------------------------------------------------------------

use crate::Error;
use crate::color::{clamp255, rgb_to_yj};
use crate::convert::{frame, src_view};
use crate::plane::{Rows, RowsMut, check_plane, copy_rows, half, row_bytes};

/// Fill a `width x height` byte plane with `value`.
pub fn set_plane(dst: &mut [u8], dst_stride: usize, width: usize, height: i32, value: u8) -> Result<(), Error> {
    let (rows, _) = frame(width, height)?;
    fill(RowsMut::new(dst, dst_stride, width, rows)?, value);
    Ok(())
}

/// Copy a byte plane. A negative height copies it upside down.
pub fn copy_plane(
    src: &[u8],
    src_stride: usize,
    dst: &mut [u8],
    dst_stride: usize,
    width: usize,
    height: i32,
) -> Result<(), Error> {
    let (rows, flip) = frame(width, height)?;
    let s = src_view(src, src_stride, width, rows, flip)?;
    let mut d = RowsMut::new(dst, dst_stride, width, rows)?;
    copy_rows(&s, &mut d);
    Ok(())
}

/// Copy an ARGB image. A negative height copies it upside down.
pub fn argb_copy(
    src_argb: &[u8],
    src_stride_argb: usize,
    dst_argb: &mut [u8],
    dst_stride_argb: usize,
    width: usize,
    height: i32,
) -> Result<(), Error> {
    copy_plane(src_argb, src_stride_argb, dst_argb, dst_stride_argb, row_bytes(width, 4)?, height)
}

/// The `row_bytes x rows` window of `dst` whose first byte is at row `y`,
/// byte `x`.
fn window(
    dst: &mut [u8],
    stride: usize,
    x: usize,
    y: usize,
    row_bytes: usize,
    rows: usize,
) -> Result<RowsMut<'_>, Error> {
    let len = dst.len();
    let offset = y
        .checked_mul(stride)
        .and_then(|o| o.checked_add(x))
        .filter(|&o| o < len)
        .ok_or(Error::BufferTooSmall { needed: len.saturating_add(1), len })?;
    RowsMut::new(&mut dst[offset..], stride, row_bytes, rows)
}

/// Fill a rectangle of an I420 image. The chroma rectangle starts at
/// `(x / 2, y / 2)` and covers `((width + 1) / 2, (height + 1) / 2)`.
pub fn i420_rect(
    dst_y: &mut [u8],
    dst_stride_y: usize,
    dst_u: &mut [u8],
    dst_stride_u: usize,
    dst_v: &mut [u8],
    dst_stride_v: usize,
    x: usize,
    y: usize,
    width: usize,
    height: usize,
    value_y: u8,
    value_u: u8,
    value_v: u8,
) -> Result<(), Error> {
    let rows = i32::try_from(height).map_err(|_| Error::InvalidArgument("height exceeds i32"))?;
    let (rows, _) = frame(width, rows)?;
    let (cw, ch) = (half(width), half(rows));
    let wy = window(dst_y, dst_stride_y, x, y, width, rows)?;
    let wu = window(dst_u, dst_stride_u, x / 2, y / 2, cw, ch)?;
    let wv = window(dst_v, dst_stride_v, x / 2, y / 2, cw, ch)?;
    fill(wy, value_y);
    fill(wu, value_u);
    fill(wv, value_v);
    Ok(())
}

fn fill(mut w: RowsMut<'_>, value: u8) {
    for j in 0..w.len() {
        w.row_mut(j).fill(value);
    }
}

/// Fill a rectangle of an ARGB image with `value`, read as `0xAARRGGBB`.
pub fn argb_rect(
    dst_argb: &mut [u8],
    dst_stride_argb: usize,
    x: usize,
    y: usize,
    width: usize,
    height: usize,
    value: u32,
) -> Result<(), Error> {
    let rows = i32::try_from(height).map_err(|_| Error::InvalidArgument("height exceeds i32"))?;
    let (rows, _) = frame(width, rows)?;
    let x = x.checked_mul(4).ok_or(Error::InvalidArgument("x overflows usize"))?;
    let mut w = window(dst_argb, dst_stride_argb, x, y, row_bytes(width, 4)?, rows)?;
    let px = value.to_le_bytes();
    for j in 0..rows {
        for d in w.row_mut(j).chunks_exact_mut(4) {
            d.copy_from_slice(&px);
        }
    }
    Ok(())
}

/// Apply `f` to every `[b, g, r, a]` pixel in place.
fn for_each_pixel(
    dst_argb: &mut [u8],
    dst_stride_argb: usize,
    width: usize,
    height: i32,
    mut f: impl FnMut(&mut [u8]),
) -> Result<(), Error> {
    let (rows, _) = frame(width, height)?;
    let mut d = RowsMut::new(dst_argb, dst_stride_argb, row_bytes(width, 4)?, rows)?;
    for j in 0..rows {
        d.row_mut(j).chunks_exact_mut(4).for_each(&mut f);
    }
    Ok(())
}

/// Replace colour with full-range luma.
pub fn argb_gray(dst_argb: &mut [u8], dst_stride_argb: usize, width: usize, height: i32) -> Result<(), Error> {
    for_each_pixel(dst_argb, dst_stride_argb, width, height, |p| {
        let y = rgb_to_yj(p[2], p[1], p[0]);
        p[..3].fill(y);
    })
}

/// Sepia tone.
pub fn argb_sepia(dst_argb: &mut [u8], dst_stride_argb: usize, width: usize, height: i32) -> Result<(), Error> {
    for_each_pixel(dst_argb, dst_stride_argb, width, height, |p| {
        let (b, g, r) = (p[0] as i32, p[1] as i32, p[2] as i32);
        p[0] = clamp255((b * 17 + g * 68 + r * 35) >> 7);
        p[1] = clamp255((b * 22 + g * 88 + r * 45) >> 7);
        p[2] = clamp255((b * 24 + g * 98 + r * 50) >> 7);
    })
}

/// Multiply colour by a matrix of signed coefficients with 7 fractional
/// bits (64 is 0.5). Each group of four, `[b, g, r, a]` weights, produces
/// B, G and R in that order.
pub fn argb_color_matrix(
    dst_argb: &mut [u8],
    dst_stride_argb: usize,
    matrix: &[i8; 12],
    width: usize,
    height: i32,
) -> Result<(), Error> {
    for_each_pixel(dst_argb, dst_stride_argb, width, height, |p| {
        let px = [p[0] as i32, p[1] as i32, p[2] as i32, p[3] as i32];
        for (out, m) in p.iter_mut().zip(matrix.chunks_exact(4)) {
            let sum: i32 = px.iter().zip(m).map(|(&c, &w)| c * w as i32).sum();
            *out = clamp255(sum >> 7);
        }
    })
}

/// Look every channel up in `table`, which interleaves four 256-entry
/// tables: entry `v * 4 + c` maps value `v` of channel `c` (B, G, R, A).
pub fn argb_color_table(
    dst_argb: &mut [u8],
    dst_stride_argb: usize,
    table: &[u8; 1024],
    width: usize,
    height: i32,
) -> Result<(), Error> {
    for_each_pixel(dst_argb, dst_stride_argb, width, height, |p| {
        for (c, v) in p.iter_mut().enumerate() {
            *v = table[*v as usize * 4 + c];
        }
    })
}

/// Posterize colour: `((v * scale) >> 16) * interval_size + interval_offset`.
pub fn argb_quantize(
    dst_argb: &mut [u8],
    dst_stride_argb: usize,
    scale: u32,
    interval_size: u32,
    interval_offset: u32,
    width: usize,
    height: i32,
) -> Result<(), Error> {
    if interval_size == 0 || interval_size > 255 || interval_offset > 255 {
        return Err(Error::InvalidArgument("quantize interval out of range"));
    }
    for_each_pixel(dst_argb, dst_stride_argb, width, height, |p| {
        for v in &mut p[..3] {
            let q = ((*v as u64 * scale as u64) >> 16) * interval_size as u64 + interval_offset as u64;
            *v = q.min(255) as u8;
        }
    })
}

#[inline(always)]
fn attenuate(f: u8, a: u8) -> u8 {
    let (f, a) = (f as u32 * 0x101, a as u32 * 0x101);
    ((f * a) >> 24) as u8
}

/// Premultiply colour by alpha.
pub fn argb_attenuate(
    src_argb: &[u8],
    src_stride_argb: usize,
    dst_argb: &mut [u8],
    dst_stride_argb: usize,
    width: usize,
    height: i32,
) -> Result<(), Error> {
    let (rows, flip) = frame(width, height)?;
    let rb = row_bytes(width, 4)?;
    let s = src_view(src_argb, src_stride_argb, rb, rows, flip)?;
    let mut d = RowsMut::new(dst_argb, dst_stride_argb, rb, rows)?;
    for j in 0..rows {
        for (o, p) in d.row_mut(j).chunks_exact_mut(4).zip(s.row(j).chunks_exact(4)) {
            let a = p[3];
            o.copy_from_slice(&[attenuate(p[0], a), attenuate(p[1], a), attenuate(p[2], a), a]);
        }
    }
    Ok(())
}

/// Divide premultiplied colour by alpha. Zero alpha leaves colour as is.
pub fn argb_unattenuate(
    src_argb: &[u8],
    src_stride_argb: usize,
    dst_argb: &mut [u8],
    dst_stride_argb: usize,
    width: usize,
    height: i32,
) -> Result<(), Error> {
    let (rows, flip) = frame(width, height)?;
    let rb = row_bytes(width, 4)?;
    let s = src_view(src_argb, src_stride_argb, rb, rows, flip)?;
    let mut d = RowsMut::new(dst_argb, dst_stride_argb, rb, rows)?;
    for j in 0..rows {
        for (o, p) in d.row_mut(j).chunks_exact_mut(4).zip(s.row(j).chunks_exact(4)) {
            let a = p[3];
            let inv = if a == 0 { 256 } else { 65536 / a as u32 };
            for (o, &c) in o.iter_mut().zip(&p[..3]) {
                *o = ((c as u32 * inv) >> 8).min(255) as u8;
            }
            o[3] = a;
        }
    }
    Ok(())
}

/// Composite premultiplied `src_argb0` over `src_argb1`. The result is
/// opaque.
pub fn argb_blend(
    src_argb0: &[u8],
    src_stride_argb0: usize,
    src_argb1: &[u8],
    src_stride_argb1: usize,
    dst_argb: &mut [u8],
    dst_stride_argb: usize,
    width: usize,
    height: i32,
) -> Result<(), Error> {
    let (rows, flip) = frame(width, height)?;
    let rb = row_bytes(width, 4)?;
    let fg = src_view(src_argb0, src_stride_argb0, rb, rows, flip)?;
    let bg = src_view(src_argb1, src_stride_argb1, rb, rows, flip)?;
    let mut d = RowsMut::new(dst_argb, dst_stride_argb, rb, rows)?;
    for j in 0..rows {
        let pixels = fg.row(j).chunks_exact(4).zip(bg.row(j).chunks_exact(4));
        for (o, (f, b)) in d.row_mut(j).chunks_exact_mut(4).zip(pixels) {
            let keep = 256 - f[3] as u32;
            for c in 0..3 {
                o[c] = (f[c] as u32 + ((b[c] as u32 * keep) >> 8)).min(255) as u8;
            }
            o[3] = 255;
        }
    }
    Ok(())
}

/// Running per-channel sums over an ARGB image. Entry `x * 4 + c` of table
/// row `y` holds the sum of channel `c` over every pixel at or above row `y`
/// and at or left of column `x`. Rows are `dst_stride32_cumsum` entries
/// apart. Sums wrap, so the difference of four corners is exact whenever the
/// box it describes sums to less than 2^32.
pub fn argb_compute_cumulative_sum(
    src_argb: &[u8],
    src_stride_argb: usize,
    dst_cumsum: &mut [u32],
    dst_stride32_cumsum: usize,
    width: usize,
    height: i32,
) -> Result<(), Error> {
    let (rows, flip) = frame(width, height)?;
    let rb = row_bytes(width, 4)?;
    let s = src_view(src_argb, src_stride_argb, rb, rows, flip)?;
    check_plane(dst_cumsum.len(), rb, rows, dst_stride32_cumsum)?;
    cumulative_sum(&s, dst_cumsum, dst_stride32_cumsum);
    Ok(())
}

fn cumulative_sum(src: &Rows<'_>, table: &mut [u32], stride: usize) {
    for j in 0..src.len() {
        let at = j * stride;
        let mut run = [0u32; 4];
        for (i, &v) in src.row(j).iter().enumerate() {
            let c = i & 3;
            run[c] = run[c].wrapping_add(v as u32);
            let up = if j > 0 { table[at - stride + i] } else { 0 };
            table[at + i] = run[c].wrapping_add(up);
        }
    }
}

/// Sum of channel `c` over columns `x0..=x1` and rows `y0..=y1`.
fn box_sum(table: &[u32], stride: usize, x0: usize, y0: usize, x1: usize, y1: usize, c: usize) -> u32 {
    let at = |x: usize, y: usize| table[y * stride + x * 4 + c];
    let left = if x0 > 0 { at(x0 - 1, y1) } else { 0 };
    let top = if y0 > 0 { at(x1, y0 - 1) } else { 0 };
    let corner = if x0 > 0 && y0 > 0 { at(x0 - 1, y0 - 1) } else { 0 };
    at(x1, y1).wrapping_sub(left).wrapping_sub(top).wrapping_add(corner)
}

/// Box blur. Each output pixel is the truncated mean of the source pixels
/// within `radius` of it in both directions, the box clipped to the image.
/// `dst_cumsum` is scratch for [`argb_compute_cumulative_sum`] covering the
/// whole image. Boxes whose 8-bit sums could reach 2^32 are rejected.
pub fn argb_blur(
    src_argb: &[u8],
    src_stride_argb: usize,
    dst_argb: &mut [u8],
    dst_stride_argb: usize,
    dst_cumsum: &mut [u32],
    dst_stride32_cumsum: usize,
    width: usize,
    height: i32,
    radius: usize,
) -> Result<(), Error> {
    let (rows, flip) = frame(width, height)?;
    let side = radius.saturating_mul(2).saturating_add(1);
    let area = side.min(width) as u64 * side.min(rows) as u64;
    if area * 255 > u32::MAX as u64 {
        return Err(Error::InvalidArgument("blur box too large"));
    }
    let rb = row_bytes(width, 4)?;
    let s = src_view(src_argb, src_stride_argb, rb, rows, flip)?;
    check_plane(dst_cumsum.len(), rb, rows, dst_stride32_cumsum)?;
    let mut d = RowsMut::new(dst_argb, dst_stride_argb, rb, rows)?;
    cumulative_sum(&s, dst_cumsum, dst_stride32_cumsum);
    let table = &*dst_cumsum;
    for j in 0..rows {
        let (y0, y1) = (j.saturating_sub(radius), j.saturating_add(radius).min(rows - 1));
        for (x, o) in d.row_mut(j).chunks_exact_mut(4).enumerate() {
            let (x0, x1) = (x.saturating_sub(radius), x.saturating_add(radius).min(width - 1));
            let n = ((x1 - x0 + 1) * (y1 - y0 + 1)) as u32;
            for (c, o) in o.iter_mut().enumerate() {
                *o = (box_sum(table, dst_stride32_cumsum, x0, y0, x1, y1, c) / n) as u8;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    extern crate alloc;
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    #[test]
    fn fills_and_copies() {
        let mut p = vec![0u8; 12];
        set_plane(&mut p, 4, 3, 3, 7).unwrap();
        assert_eq!(p, [7, 7, 7, 0, 7, 7, 7, 0, 7, 7, 7, 0]);

        let src: Vec<u8> = (0..6).collect();
        let mut dst = vec![0u8; 6];
        copy_plane(&src, 3, &mut dst, 3, 3, -2).unwrap();
        assert_eq!(dst, [3, 4, 5, 0, 1, 2]);
    }

    #[test]
    fn rectangles_stay_inside() {
        let mut argb = vec![0u8; 4 * 4 * 4];
        argb_rect(&mut argb, 16, 1, 2, 2, 1, 0xff10_2030).unwrap();
        let px = |x: usize, y: usize| &argb[y * 16 + x * 4..][..4];
        assert_eq!(px(1, 2), [0x30, 0x20, 0x10, 0xff]);
        assert_eq!(px(2, 2), [0x30, 0x20, 0x10, 0xff]);
        assert_eq!(px(3, 2), [0, 0, 0, 0]);
        assert_eq!(px(1, 1), [0, 0, 0, 0]);

        let (mut y, mut u, mut v) = (vec![0u8; 16], vec![0u8; 4], vec![0u8; 4]);
        i420_rect(&mut y, 4, &mut u, 2, &mut v, 2, 2, 2, 2, 2, 1, 2, 3).unwrap();
        assert_eq!(y, [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 0, 0, 1, 1]);
        assert_eq!(u, [0, 0, 0, 2]);
        assert_eq!(v, [0, 0, 0, 3]);

        assert!(argb_rect(&mut argb, 16, 0, 4, 1, 1, 0).is_err());
    }

    #[test]
    fn gray_and_sepia() {
        let mut p = [255u8, 0, 0, 9, 10, 20, 30, 40];
        argb_gray(&mut p, 8, 2, 1).unwrap();
        assert_eq!(p[..4], [30, 30, 30, 9]);
        assert_eq!(p[4], rgb_to_yj(30, 20, 10));

        let mut white = [255u8; 4];
        argb_sepia(&mut white, 4, 1, 1).unwrap();
        // 255 * 120 / 128, 255 * 155 / 128 and 255 * 172 / 128.
        assert_eq!(white, [239, 255, 255, 255]);
    }

    #[test]
    fn identity_matrix_and_table() {
        let src = [12u8, 34, 56, 78];
        let mut p = src;
        let mut m = [0i8; 12];
        m[0] = 127;
        m[5] = 127;
        m[10] = 127;
        argb_color_matrix(&mut p, 4, &m, 1, 1).unwrap();
        // 127/128 of each channel, alpha untouched.
        assert_eq!(p, [11, 33, 55, 78]);

        let mut swap = [0i8; 12];
        swap[2] = 64;
        swap[6] = 64;
        swap[8] = 64;
        let mut p = [100u8, 50, 200, 1];
        argb_color_matrix(&mut p, 4, &swap, 1, 1).unwrap();
        assert_eq!(p, [100, 100, 50, 1]);

        let table: Vec<u8> = (0..1024).map(|i| (i / 4) as u8 ^ 0xff).collect();
        let mut p = src;
        argb_color_table(&mut p, 4, table.as_slice().try_into().unwrap(), 1, 1).unwrap();
        assert_eq!(p, [!12, !34, !56, !78]);
    }

    #[test]
    fn quantize_posterizes_colour_only() {
        // 8 levels of 32, centred.
        let mut p = [0u8, 100, 255, 77];
        argb_quantize(&mut p, 4, 8 * 256, 32, 16, 1, 1).unwrap();
        assert_eq!(p, [16, 112, 240, 77]);
        assert!(argb_quantize(&mut p, 4, 1, 0, 0, 1, 1).is_err());
    }

    #[test]
    fn attenuate_round_trip() {
        let src = [200u8, 100, 50, 255, 200, 100, 50, 128, 9, 9, 9, 0];
        let mut pre = [0u8; 12];
        argb_attenuate(&src, 12, &mut pre, 12, 3, 1).unwrap();
        assert_eq!(pre[..4], src[..4]);
        assert_eq!(pre[4..8], [100, 50, 25, 128]);
        assert_eq!(pre[8..], [0, 0, 0, 0]);

        let mut back = [0u8; 12];
        argb_unattenuate(&pre, 12, &mut back, 12, 3, 1).unwrap();
        assert_eq!(back[..4], src[..4]);
        assert!(back[4..7].iter().zip(&src[4..7]).all(|(a, b)| a.abs_diff(*b) <= 1));
    }

    #[test]
    fn blend_over_background() {
        let fg = [0u8, 0, 0, 0, 100, 50, 0, 255, 64, 32, 0, 128];
        let bg = [10u8, 20, 30, 40, 200, 200, 200, 200, 200, 100, 0, 0];
        let mut out = [0u8; 12];
        argb_blend(&fg, 12, &bg, 12, &mut out, 12, 3, 1).unwrap();
        assert_eq!(out[..4], [10, 20, 30, 255]);
        assert_eq!(out[4..8], [100, 50, 0, 255]);
        assert_eq!(out[8..], [164, 82, 0, 255]);
    }

    #[test]
    fn cumulative_sum_counts_up_and_left() {
        let src = [1u8, 2, 3, 4, 10, 20, 30, 40, 100, 100, 100, 100, 0, 0, 0, 255];
        let mut table = vec![0u32; 2 * 8];
        argb_compute_cumulative_sum(&src, 8, &mut table, 8, 2, 2).unwrap();
        assert_eq!(table[..8], [1, 2, 3, 4, 11, 22, 33, 44]);
        assert_eq!(table[8..], [101, 102, 103, 104, 111, 122, 133, 399]);

        let mut flipped = vec![0u32; 2 * 8];
        argb_compute_cumulative_sum(&src, 8, &mut flipped, 8, 2, -2).unwrap();
        assert_eq!(flipped[..8], [100, 100, 100, 100, 100, 100, 100, 355]);
        assert!(argb_compute_cumulative_sum(&src, 8, &mut table[..15], 8, 2, 2).is_err());
    }

    fn blur_reference(src: &[u8], w: usize, h: usize, r: usize) -> Vec<u8> {
        let mut out = vec![0u8; w * h * 4];
        for y in 0..h {
            for x in 0..w {
                let ys = y.saturating_sub(r)..=(y + r).min(h - 1);
                let xs = x.saturating_sub(r)..=(x + r).min(w - 1);
                let n = (ys.clone().count() * xs.clone().count()) as u32;
                for c in 0..4 {
                    let mut sum = 0u32;
                    for yy in ys.clone() {
                        for xx in xs.clone() {
                            sum += src[(yy * w + xx) * 4 + c] as u32;
                        }
                    }
                    out[(y * w + x) * 4 + c] = (sum / n) as u8;
                }
            }
        }
        out
    }

    #[test]
    fn blur_matches_brute_force_mean() {
        use rand::{Rng, SeedableRng, rngs::StdRng};
        let mut rng = StdRng::seed_from_u64(0xb1u64);
        for (w, h, r) in [(1, 1, 3), (7, 5, 1), (19, 11, 2), (33, 3, 5), (6, 9, 0)] {
            let src: Vec<u8> = (0..w * h * 4).map(|_| rng.random()).collect();
            let mut dst = vec![0u8; w * h * 4];
            let mut table = vec![0u32; w * h * 4];
            argb_blur(&src, w * 4, &mut dst, w * 4, &mut table, w * 4, w, h as i32, r).unwrap();
            assert_eq!(dst, blur_reference(&src, w, h, r), "{w}x{h} r{r}");
        }
    }

    #[test]
    fn blur_edge_cases() {
        let flat = vec![77u8; 8 * 8 * 4];
        let mut dst = vec![0u8; 8 * 8 * 4];
        let mut table = vec![0u32; 8 * 8 * 4];
        argb_blur(&flat, 32, &mut dst, 32, &mut table, 32, 8, 8, 100).unwrap();
        assert_eq!(dst, flat);

        // Bottom-up source gives the blurred image upside down.
        let src: Vec<u8> = (0..4 * 3 * 4).map(|i| (i * 5) as u8).collect();
        let mut up = vec![0u8; src.len()];
        let mut down = vec![0u8; src.len()];
        argb_blur(&src, 16, &mut up, 16, &mut table, 16, 4, 3, 1).unwrap();
        argb_blur(&src, 16, &mut down, 16, &mut table, 16, 4, -3, 1).unwrap();
        for j in 0..3 {
            assert_eq!(down[j * 16..][..16], up[(2 - j) * 16..][..16]);
        }

        assert_eq!(
            argb_blur(&[], 0, &mut [], 0, &mut [], 0, 5000, 5000, 5000),
            Err(Error::InvalidArgument("blur box too large"))
        );
        assert!(argb_blur(&flat, 32, &mut dst, 32, &mut table[..10], 32, 8, 8, 1).is_err());
    }
}
