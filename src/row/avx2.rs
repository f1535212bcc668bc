use archmage::prelude::*;

use crate::color::{Matrix, YuvConstants};

// ===========================================================================
// SIMD constants
// ===========================================================================

const REVERSE_BYTES_AVX: [i8; 32] = [
    15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0, 15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4,
    3, 2, 1, 0,
];

// Sum of squares is flushed to u64 every this many vectors, before an i32
// lane can overflow (4 * 255^2 per lane per vector).
const SSE_BLOCK_VECTORS: usize = 1024;

// ===========================================================================
// x86-64 AVX2: rite row implementations
//
// Each returns how many units (bytes or pixels) it handled; the caller runs
// the scalar kernel on the rest.
// ===========================================================================

#[rite]
pub(super) fn mirror_row_v3(_token: X64V3Token, src: &[u8], dst: &mut [u8]) -> usize {
    let rev = _mm256_loadu_si256(&REVERSE_BYTES_AVX);
    let n = dst.len();
    let mut i = 0;
    while i + 32 <= n {
        let s: &[u8; 32] = src[n - i - 32..n - i].try_into().unwrap();
        let v = _mm256_shuffle_epi8(_mm256_loadu_si256(s), rev);
        let v = _mm256_permute4x64_epi64::<0b01_00_11_10>(v);
        let d: &mut [u8; 32] = (&mut dst[i..i + 32]).try_into().unwrap();
        _mm256_storeu_si256(d, v);
        i += 32;
    }
    i
}

#[rite]
pub(super) fn argb_mirror_row_v3(_token: X64V3Token, src: &[u8], dst: &mut [u8]) -> usize {
    let perm = _mm256_setr_epi32(7, 6, 5, 4, 3, 2, 1, 0);
    let n = dst.len() / 4;
    let mut i = 0;
    while i + 8 <= n {
        let at = (n - i - 8) * 4;
        let s: &[u8; 32] = src[at..at + 32].try_into().unwrap();
        let v = _mm256_permutevar8x32_epi32(_mm256_loadu_si256(s), perm);
        let d: &mut [u8; 32] = (&mut dst[i * 4..i * 4 + 32]).try_into().unwrap();
        _mm256_storeu_si256(d, v);
        i += 8;
    }
    i
}

#[rite]
pub(super) fn interpolate_row_v3(
    _token: X64V3Token,
    dst: &mut [u8],
    src0: &[u8],
    src1: &[u8],
    fraction: u8,
) -> usize {
    let f1 = _mm256_set1_epi16(fraction as i16);
    let f0 = _mm256_set1_epi16(256 - fraction as i16);
    let round = _mm256_set1_epi16(128);
    let zero = _mm256_setzero_si256();
    let n = dst.len();
    let mut i = 0;
    while i + 32 <= n {
        let a: &[u8; 32] = src0[i..i + 32].try_into().unwrap();
        let b: &[u8; 32] = src1[i..i + 32].try_into().unwrap();
        let a = _mm256_loadu_si256(a);
        let b = _mm256_loadu_si256(b);
        // u16 lanes: 255 * 256 + 128 still fits, so the wrapping mul is exact.
        let lo = _mm256_add_epi16(
            _mm256_add_epi16(
                _mm256_mullo_epi16(_mm256_unpacklo_epi8(a, zero), f0),
                _mm256_mullo_epi16(_mm256_unpacklo_epi8(b, zero), f1),
            ),
            round,
        );
        let hi = _mm256_add_epi16(
            _mm256_add_epi16(
                _mm256_mullo_epi16(_mm256_unpackhi_epi8(a, zero), f0),
                _mm256_mullo_epi16(_mm256_unpackhi_epi8(b, zero), f1),
            ),
            round,
        );
        let out = _mm256_packus_epi16(_mm256_srli_epi16::<8>(lo), _mm256_srli_epi16::<8>(hi));
        let d: &mut [u8; 32] = (&mut dst[i..i + 32]).try_into().unwrap();
        _mm256_storeu_si256(d, out);
        i += 32;
    }
    i
}

#[rite]
pub(super) fn scale_down2_box_row_v3(
    _token: X64V3Token,
    src0: &[u8],
    src1: &[u8],
    dst: &mut [u8],
) -> usize {
    let ones = _mm256_set1_epi8(1);
    let two = _mm256_set1_epi16(2);
    let n = dst.len();
    let mut i = 0;
    while i + 32 <= n {
        let s = 2 * i;
        let a0: &[u8; 32] = src0[s..s + 32].try_into().unwrap();
        let a1: &[u8; 32] = src0[s + 32..s + 64].try_into().unwrap();
        let b0: &[u8; 32] = src1[s..s + 32].try_into().unwrap();
        let b1: &[u8; 32] = src1[s + 32..s + 64].try_into().unwrap();
        let sum0 = _mm256_add_epi16(
            _mm256_maddubs_epi16(_mm256_loadu_si256(a0), ones),
            _mm256_maddubs_epi16(_mm256_loadu_si256(b0), ones),
        );
        let sum1 = _mm256_add_epi16(
            _mm256_maddubs_epi16(_mm256_loadu_si256(a1), ones),
            _mm256_maddubs_epi16(_mm256_loadu_si256(b1), ones),
        );
        let avg0 = _mm256_srli_epi16::<2>(_mm256_add_epi16(sum0, two));
        let avg1 = _mm256_srli_epi16::<2>(_mm256_add_epi16(sum1, two));
        let out = _mm256_permute4x64_epi64::<0b11_01_10_00>(_mm256_packus_epi16(avg0, avg1));
        let d: &mut [u8; 32] = (&mut dst[i..i + 32]).try_into().unwrap();
        _mm256_storeu_si256(d, out);
        i += 32;
    }
    i
}

#[rite]
pub(super) fn i422_to_argb_row_v3(
    _token: X64V3Token,
    y: &[u8],
    u: &[u8],
    v: &[u8],
    dst: &mut [u8],
    c: &YuvConstants,
) -> usize {
    let yg = _mm256_set1_epi32(c.yg);
    let y_bias = _mm256_set1_epi32(c.y_bias);
    let ub = _mm256_set1_epi32(c.ub);
    let ug = _mm256_set1_epi32(c.ug);
    let vg = _mm256_set1_epi32(c.vg);
    let vr = _mm256_set1_epi32(c.vr);
    let round = _mm256_set1_epi32(8192);
    let chroma_bias = _mm256_set1_epi32(128);
    let zero = _mm256_setzero_si256();
    let max = _mm256_set1_epi32(255);
    let alpha = _mm256_set1_epi32(0xFF00_0000_u32 as i32);
    let n = y.len();
    let mut i = 0;
    while i + 8 <= n {
        let y8 = i64::from_le_bytes(y[i..i + 8].try_into().unwrap());
        let u4 = i32::from_le_bytes(u[i / 2..i / 2 + 4].try_into().unwrap());
        let v4 = i32::from_le_bytes(v[i / 2..i / 2 + 4].try_into().unwrap());
        let yy = _mm256_cvtepu8_epi32(_mm_cvtsi64_si128(y8));
        let uu = _mm_cvtsi32_si128(u4);
        let vv = _mm_cvtsi32_si128(v4);
        // Each chroma sample covers two pixels.
        let uu = _mm256_sub_epi32(_mm256_cvtepu8_epi32(_mm_unpacklo_epi8(uu, uu)), chroma_bias);
        let vv = _mm256_sub_epi32(_mm256_cvtepu8_epi32(_mm_unpacklo_epi8(vv, vv)), chroma_bias);
        let y1 = _mm256_mullo_epi32(_mm256_sub_epi32(yy, y_bias), yg);

        let b = _mm256_add_epi32(_mm256_add_epi32(y1, _mm256_mullo_epi32(ub, uu)), round);
        let g = _mm256_add_epi32(
            _mm256_sub_epi32(
                _mm256_sub_epi32(y1, _mm256_mullo_epi32(ug, uu)),
                _mm256_mullo_epi32(vg, vv),
            ),
            round,
        );
        let r = _mm256_add_epi32(_mm256_add_epi32(y1, _mm256_mullo_epi32(vr, vv)), round);
        let b = _mm256_min_epi32(_mm256_max_epi32(_mm256_srai_epi32::<14>(b), zero), max);
        let g = _mm256_min_epi32(_mm256_max_epi32(_mm256_srai_epi32::<14>(g), zero), max);
        let r = _mm256_min_epi32(_mm256_max_epi32(_mm256_srai_epi32::<14>(r), zero), max);

        let px = _mm256_or_si256(
            _mm256_or_si256(b, _mm256_slli_epi32::<8>(g)),
            _mm256_or_si256(_mm256_slli_epi32::<16>(r), alpha),
        );
        let d: &mut [u8; 32] = (&mut dst[i * 4..i * 4 + 32]).try_into().unwrap();
        _mm256_storeu_si256(d, px);
        i += 8;
    }
    i
}

#[rite]
pub(super) fn argb_to_y_row_v3(_token: X64V3Token, src: &[u8], dst: &mut [u8], m: Matrix) -> usize {
    // (b, g, r, a) weights, rounding term, shift and offset of each matrix.
    let (cb, cg, cr, round, shift, offset) = match m {
        Matrix::Bt601 => (25i64, 129i64, 66i64, 128, 8, 16),
        Matrix::Jpeg => (15, 75, 38, 64, 7, 0),
    };
    let coef = _mm256_set1_epi64x(cb | (cg << 16) | (cr << 32));
    let round = _mm256_set1_epi32(round);
    let offset = _mm256_set1_epi32(offset);
    let shift = _mm_cvtsi32_si128(shift);
    let zero = _mm256_setzero_si256();
    let n = dst.len();
    let mut i = 0;
    while i + 8 <= n {
        let s: &[u8; 32] = src[i * 4..i * 4 + 32].try_into().unwrap();
        let v = _mm256_loadu_si256(s);
        // Per 128-bit lane: pixels {0,1} in lo, {2,3} in hi.
        let lo = _mm256_madd_epi16(_mm256_unpacklo_epi8(v, zero), coef);
        let hi = _mm256_madd_epi16(_mm256_unpackhi_epi8(v, zero), coef);
        let sum = _mm256_hadd_epi32(lo, hi);
        let luma = _mm256_add_epi32(
            _mm256_srl_epi32(_mm256_add_epi32(sum, round), shift),
            offset,
        );
        let packed = _mm256_packus_epi16(
            _mm256_packs_epi32(luma, luma),
            _mm256_packs_epi32(luma, luma),
        );
        let first = _mm_cvtsi128_si32(_mm256_castsi256_si128(packed));
        let second = _mm_cvtsi128_si32(_mm256_extracti128_si256::<1>(packed));
        dst[i..i + 4].copy_from_slice(&first.to_le_bytes());
        dst[i + 4..i + 8].copy_from_slice(&second.to_le_bytes());
        i += 8;
    }
    i
}

#[rite]
fn pack_rgb565_v3(_token: X64V3Token, v: __m256i) -> __m256i {
    let b = _mm256_and_si256(_mm256_srli_epi32::<3>(v), _mm256_set1_epi32(0x001f));
    let g = _mm256_and_si256(_mm256_srli_epi32::<5>(v), _mm256_set1_epi32(0x07e0));
    let r = _mm256_and_si256(_mm256_srli_epi32::<8>(v), _mm256_set1_epi32(0xf800));
    _mm256_or_si256(_mm256_or_si256(b, g), r)
}

#[rite]
pub(super) fn argb_to_rgb565_row_v3(t: X64V3Token, src: &[u8], dst: &mut [u8]) -> usize {
    let n = src.len() / 4;
    let mut i = 0;
    while i + 16 <= n {
        let a: &[u8; 32] = src[i * 4..i * 4 + 32].try_into().unwrap();
        let b: &[u8; 32] = src[i * 4 + 32..i * 4 + 64].try_into().unwrap();
        let words = _mm256_packus_epi32(
            pack_rgb565_v3(t, _mm256_loadu_si256(a)),
            pack_rgb565_v3(t, _mm256_loadu_si256(b)),
        );
        let out = _mm256_permute4x64_epi64::<0b11_01_10_00>(words);
        let d: &mut [u8; 32] = (&mut dst[i * 2..i * 2 + 32]).try_into().unwrap();
        _mm256_storeu_si256(d, out);
        i += 16;
    }
    i
}

#[rite]
fn load8_v3(_token: X64V3Token, row: &[u8], x: usize) -> __m128i {
    _mm_cvtsi64_si128(i64::from_le_bytes(row[x..x + 8].try_into().unwrap()))
}

#[rite]
pub(super) fn transpose_8_v3(t: X64V3Token, rows: &[&[u8]; 8], tile: &mut [u8]) -> usize {
    let w = tile.len() / 8;
    let mut x = 0;
    while x + 8 <= w {
        let t0 = _mm_unpacklo_epi8(load8_v3(t, rows[0], x), load8_v3(t, rows[1], x));
        let t1 = _mm_unpacklo_epi8(load8_v3(t, rows[2], x), load8_v3(t, rows[3], x));
        let t2 = _mm_unpacklo_epi8(load8_v3(t, rows[4], x), load8_v3(t, rows[5], x));
        let t3 = _mm_unpacklo_epi8(load8_v3(t, rows[6], x), load8_v3(t, rows[7], x));
        // Columns 0..4 and 4..8 of rows 0..4, then of rows 4..8.
        let u0 = _mm_unpacklo_epi16(t0, t1);
        let u1 = _mm_unpackhi_epi16(t0, t1);
        let u2 = _mm_unpacklo_epi16(t2, t3);
        let u3 = _mm_unpackhi_epi16(t2, t3);
        let cols = [
            _mm_unpacklo_epi32(u0, u2),
            _mm_unpackhi_epi32(u0, u2),
            _mm_unpacklo_epi32(u1, u3),
            _mm_unpackhi_epi32(u1, u3),
        ];
        for (k, pair) in cols.into_iter().enumerate() {
            let at = (x + 2 * k) * 8;
            let d: &mut [u8; 16] = (&mut tile[at..at + 16]).try_into().unwrap();
            _mm_storeu_si128(d, pair);
        }
        x += 8;
    }
    x
}

#[rite]
pub(super) fn sum_square_error_v3(_token: X64V3Token, a: &[u8], b: &[u8]) -> (u64, usize) {
    let zero = _mm256_setzero_si256();
    let n = a.len().min(b.len());
    let mut total = 0u64;
    let mut i = 0;
    while i + 32 <= n {
        let block_end = (i + 32 * SSE_BLOCK_VECTORS).min(n);
        let mut acc = _mm256_setzero_si256();
        while i + 32 <= block_end {
            let x: &[u8; 32] = a[i..i + 32].try_into().unwrap();
            let y: &[u8; 32] = b[i..i + 32].try_into().unwrap();
            let x = _mm256_loadu_si256(x);
            let y = _mm256_loadu_si256(y);
            let lo = _mm256_sub_epi16(_mm256_unpacklo_epi8(x, zero), _mm256_unpacklo_epi8(y, zero));
            let hi = _mm256_sub_epi16(_mm256_unpackhi_epi8(x, zero), _mm256_unpackhi_epi8(y, zero));
            acc = _mm256_add_epi32(acc, _mm256_madd_epi16(lo, lo));
            acc = _mm256_add_epi32(acc, _mm256_madd_epi16(hi, hi));
            i += 32;
        }
        let mut lanes = [0u8; 32];
        _mm256_storeu_si256(&mut lanes, acc);
        total += lanes
            .chunks_exact(4)
            .map(|l| u32::from_le_bytes([l[0], l[1], l[2], l[3]]) as u64)
            .sum::<u64>();
    }
    (total, i)
}

// ===========================================================================
// x86-64 arcane wrappers
// ===========================================================================

#[arcane]
pub(super) fn mirror_impl_v3(t: X64V3Token, s: &[u8], d: &mut [u8]) -> usize {
    mirror_row_v3(t, s, d)
}
#[arcane]
pub(super) fn argb_mirror_impl_v3(t: X64V3Token, s: &[u8], d: &mut [u8]) -> usize {
    argb_mirror_row_v3(t, s, d)
}
#[arcane]
pub(super) fn interpolate_impl_v3(t: X64V3Token, d: &mut [u8], s0: &[u8], s1: &[u8], f: u8) -> usize {
    interpolate_row_v3(t, d, s0, s1, f)
}
#[arcane]
pub(super) fn scale_down2_box_impl_v3(t: X64V3Token, s0: &[u8], s1: &[u8], d: &mut [u8]) -> usize {
    scale_down2_box_row_v3(t, s0, s1, d)
}
#[arcane]
pub(super) fn i422_to_argb_impl_v3(
    t: X64V3Token,
    y: &[u8],
    u: &[u8],
    v: &[u8],
    d: &mut [u8],
    c: &YuvConstants,
) -> usize {
    i422_to_argb_row_v3(t, y, u, v, d, c)
}
#[arcane]
pub(super) fn argb_to_y_impl_v3(t: X64V3Token, s: &[u8], d: &mut [u8], m: Matrix) -> usize {
    argb_to_y_row_v3(t, s, d, m)
}
#[arcane]
pub(super) fn argb_to_rgb565_impl_v3(t: X64V3Token, s: &[u8], d: &mut [u8]) -> usize {
    argb_to_rgb565_row_v3(t, s, d)
}
#[arcane]
pub(super) fn transpose_8_impl_v3(t: X64V3Token, rows: &[&[u8]; 8], tile: &mut [u8]) -> usize {
    transpose_8_v3(t, rows, tile)
}
#[arcane]
pub(super) fn sum_square_error_impl_v3(t: X64V3Token, a: &[u8], b: &[u8]) -> (u64, usize) {
    sum_square_error_v3(t, a, b)
}
