// ---------------------------------------------------------------------------
// Exact-ratio filtered downscales of single-byte planes: 1/2, 1/4, 1/8 box
// averages, the 3/4 three-tap filter and the 3/8 box groups.
// ---------------------------------------------------------------------------

use crate::dispatch::{Geometry, SIMD_ALIGN};
use crate::plane::{Rows, RowsMut};
use crate::row;

/// `(sum + n/2) / n`.
#[inline(always)]
fn mean(sum: u32, n: u32) -> u8 {
    ((sum + n / 2) / n) as u8
}

pub(crate) fn down2(src: &Rows<'_>, dst: &mut RowsMut<'_>) {
    let aligned = src.aligned(SIMD_ALIGN) && dst.aligned(SIMD_ALIGN);
    let k = row::SCALE_DOWN2_BOX.bind(Geometry::new(dst.row_bytes(), aligned));
    for j in 0..dst.len() {
        row::scale_down2_box(k, src.row(2 * j), src.row(2 * j + 1), dst.row_mut(j));
    }
}

/// Box average of `n x n` blocks, `n` a power of two.
fn down_n(src: &Rows<'_>, dst: &mut RowsMut<'_>, n: usize) {
    let area = (n * n) as u32;
    for j in 0..dst.len() {
        let lines: [&[u8]; 8] = core::array::from_fn(|r| src.row(n * j + r.min(n - 1)));
        for (x, d) in dst.row_mut(j).iter_mut().enumerate() {
            let sum: u32 = lines[..n]
                .iter()
                .flat_map(|l| &l[n * x..n * x + n])
                .map(|&v| v as u32)
                .sum();
            *d = mean(sum, area);
        }
    }
}

pub(crate) fn down4(src: &Rows<'_>, dst: &mut RowsMut<'_>) {
    down_n(src, dst, 4);
}

pub(crate) fn down8(src: &Rows<'_>, dst: &mut RowsMut<'_>) {
    down_n(src, dst, 8);
}

/// Four source samples to three: weights 3:1, 1:1 and 1:3.
#[inline]
fn taps34(a: u32, b: u32, c: u32, d: u32) -> [u32; 3] {
    [(a * 3 + b + 2) >> 2, (b + c + 1) >> 1, (c + d * 3 + 2) >> 2]
}

/// Blend two rows already filtered to 3/4 width, `w0:w1` out of 4.
fn down34_row(dst: &mut [u8], near: &[u8], far: &[u8], near_weight: u32) {
    let far_weight = 4 - near_weight;
    for ((d, s), t) in dst.chunks_exact_mut(3).zip(near.chunks_exact(4)).zip(far.chunks_exact(4)) {
        let a = taps34(s[0] as u32, s[1] as u32, s[2] as u32, s[3] as u32);
        let b = taps34(t[0] as u32, t[1] as u32, t[2] as u32, t[3] as u32);
        for i in 0..3 {
            d[i] = ((a[i] * near_weight + b[i] * far_weight + 2) >> 2) as u8;
        }
    }
}

/// Source rows 0..4 produce destination rows 0..3 as blends of (0,1) 3:1,
/// (1,2) 1:1 and (3,2) 3:1.
pub(crate) fn down34(src: &Rows<'_>, dst: &mut RowsMut<'_>) {
    for j in 0..dst.len() {
        let base = (j / 3) * 4;
        let (near, far, w) = match j % 3 {
            0 => (base, base + 1, 3),
            1 => (base + 1, base + 2, 2),
            _ => (base + 3, base + 2, 3),
        };
        down34_row(dst.row_mut(j), src.row(near), src.row(far), w);
    }
}

/// Eight source samples to three, in boxes 3, 3 and 2 wide; rows group the
/// same way.
pub(crate) fn down38(src: &Rows<'_>, dst: &mut RowsMut<'_>) {
    const SPANS: [(usize, usize); 3] = [(0, 3), (3, 6), (6, 8)];
    for j in 0..dst.len() {
        let (r0, r1) = SPANS[j % 3];
        let base = (j / 3) * 8;
        let rows_in = (r1 - r0) as u32;
        for (g, out) in dst.row_mut(j).chunks_exact_mut(3).enumerate() {
            for (k, &(c0, c1)) in SPANS.iter().enumerate() {
                let sum: u32 = (base + r0..base + r1)
                    .flat_map(|r| &src.row(r)[8 * g + c0..8 * g + c1])
                    .map(|&v| v as u32)
                    .sum();
                out[k] = mean(sum, (c1 - c0) as u32 * rows_in);
            }
        }
    }
}
