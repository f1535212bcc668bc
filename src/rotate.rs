// ---------------------------------------------------------------------------
// Rotation and mirroring.
//
// Quarter turns are transposes: 90 degrees transposes the vertically flipped
// source, 270 transposes into a destination walked bottom-up. Byte planes go
// through the dispatched 8x8 transpose in strips of eight source rows; rows
// left over after the last full strip are transposed one byte at a time.
// Half turns mirror each row into the opposite destination row.
// ---------------------------------------------------------------------------

use alloc::vec;

use crate::Error;
use crate::convert::{frame, src_view};
use crate::dispatch::Geometry;
use crate::plane::{Rows, RowsMut, copy_rows, half, row_bytes};
use crate::row;

/// Clockwise rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RotationMode {
    #[default]
    Rotate0,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl RotationMode {
    /// `0`, `90`, `180` or `270`; anything else is `None`.
    pub const fn from_degrees(degrees: u32) -> Option<Self> {
        match degrees {
            0 => Some(Self::Rotate0),
            90 => Some(Self::Rotate90),
            180 => Some(Self::Rotate180),
            270 => Some(Self::Rotate270),
            _ => None,
        }
    }

    pub const fn degrees(self) -> u32 {
        match self {
            Self::Rotate0 => 0,
            Self::Rotate90 => 90,
            Self::Rotate180 => 180,
            Self::Rotate270 => 270,
        }
    }

    /// Whether the output swaps width and height.
    pub const fn swaps_axes(self) -> bool {
        matches!(self, Self::Rotate90 | Self::Rotate270)
    }

    /// The rotation that undoes this one.
    pub const fn inverse(self) -> Self {
        match self {
            Self::Rotate90 => Self::Rotate270,
            Self::Rotate270 => Self::Rotate90,
            other => other,
        }
    }
}

/// `(columns, rows)` of the rotated image.
fn rotated(width: usize, rows: usize, mode: RotationMode) -> (usize, usize) {
    if mode.swaps_axes() { (rows, width) } else { (width, rows) }
}

/// Run the 8x8 transpose over `src` and hand each transposed column piece to
/// `emit(column, first_row, bytes)`.
fn transpose_strips(src: &Rows<'_>, mut emit: impl FnMut(usize, usize, &[u8])) {
    let w = src.row_bytes();
    let h = src.len();
    let k = row::TRANSPOSE_8.bind(Geometry::new(w, false));
    let mut tile = vec![0u8; w * 8];
    let mut s = 0;
    while s + 8 <= h {
        let strip: [&[u8]; 8] = core::array::from_fn(|j| src.row(s + j));
        row::transpose_8(k, &strip, &mut tile);
        for (x, col) in tile.chunks_exact(8).enumerate() {
            emit(x, s, col);
        }
        s += 8;
    }
    for j in s..h {
        for (x, b) in src.row(j).iter().enumerate() {
            emit(x, j, core::slice::from_ref(b));
        }
    }
}

fn transpose_plane(src: &Rows<'_>, dst: &mut RowsMut<'_>) {
    transpose_strips(src, |x, s, col| {
        dst.row_mut(x)[s..s + col.len()].copy_from_slice(col);
    });
}

/// Transpose interleaved pairs: even bytes to `dst_a`, odd bytes to `dst_b`.
fn transpose_pairs(src: &Rows<'_>, dst_a: &mut RowsMut<'_>, dst_b: &mut RowsMut<'_>) {
    transpose_strips(src, |x, s, col| {
        let dst = if x % 2 == 0 { dst_a.row_mut(x / 2) } else { dst_b.row_mut(x / 2) };
        dst[s..s + col.len()].copy_from_slice(col);
    });
}

fn transpose_pixels(src: &Rows<'_>, dst: &mut RowsMut<'_>) {
    for j in 0..src.len() {
        for (x, px) in src.row(j).chunks_exact(4).enumerate() {
            dst.row_mut(x)[j * 4..j * 4 + 4].copy_from_slice(px);
        }
    }
}

/// Rotate a byte plane (`bpp == 1`) or an ARGB plane (`bpp == 4`) between
/// views already sized for `mode`.
fn rotate_view(src: Rows<'_>, mut dst: RowsMut<'_>, bpp: usize, mode: RotationMode) {
    match mode {
        RotationMode::Rotate0 => copy_rows(&src, &mut dst),
        RotationMode::Rotate180 => mirror_view(&src.flipped(true), &mut dst, bpp),
        RotationMode::Rotate90 | RotationMode::Rotate270 => {
            let (src, mut dst) = if mode == RotationMode::Rotate90 {
                (src.flipped(true), dst)
            } else {
                (src, dst.flipped(true))
            };
            if bpp == 4 {
                transpose_pixels(&src, &mut dst);
            } else {
                transpose_plane(&src, &mut dst);
            }
        }
    }
}

fn dst_view<'a>(
    dst: &'a mut [u8],
    stride: usize,
    width: usize,
    rows: usize,
    bpp: usize,
    mode: RotationMode,
) -> Result<RowsMut<'a>, Error> {
    let (w, h) = rotated(width, rows, mode);
    RowsMut::new(dst, stride, row_bytes(w, bpp)?, h)
}

/// Rotate a byte plane. The destination is `height x width` for quarter
/// turns. A negative height reads the source bottom-up before rotating.
pub fn rotate_plane(
    src: &[u8],
    src_stride: usize,
    dst: &mut [u8],
    dst_stride: usize,
    width: usize,
    height: i32,
    mode: RotationMode,
) -> Result<(), Error> {
    let (rows, flip) = frame(width, height)?;
    let s = src_view(src, src_stride, width, rows, flip)?;
    let d = dst_view(dst, dst_stride, width, rows, 1, mode)?;
    rotate_view(s, d, 1, mode);
    Ok(())
}

/// Rotate an interleaved UV plane into separate U and V planes. `width`
/// counts pairs.
pub fn rotate_uv(
    src_uv: &[u8],
    src_stride_uv: usize,
    dst_u: &mut [u8],
    dst_stride_u: usize,
    dst_v: &mut [u8],
    dst_stride_v: usize,
    width: usize,
    height: i32,
    mode: RotationMode,
) -> Result<(), Error> {
    let (rows, flip) = frame(width, height)?;
    let s = src_view(src_uv, src_stride_uv, row_bytes(width, 2)?, rows, flip)?;
    let du = dst_view(dst_u, dst_stride_u, width, rows, 1, mode)?;
    let dv = dst_view(dst_v, dst_stride_v, width, rows, 1, mode)?;
    rotate_pairs_view(s, du, dv, mode);
    Ok(())
}

fn rotate_pairs_view(src: Rows<'_>, mut du: RowsMut<'_>, mut dv: RowsMut<'_>, mode: RotationMode) {
    match mode {
        RotationMode::Rotate0 | RotationMode::Rotate180 => {
            let src = src.flipped(mode == RotationMode::Rotate180);
            for j in 0..src.len() {
                let (u, v) = (du.row_mut(j), dv.row_mut(j));
                if mode == RotationMode::Rotate0 {
                    row::split_uv_row(src.row(j), u, v);
                } else {
                    let pairs = src.row(j).chunks_exact(2).rev();
                    for ((u, v), p) in u.iter_mut().zip(v.iter_mut()).zip(pairs) {
                        *u = p[0];
                        *v = p[1];
                    }
                }
            }
        }
        RotationMode::Rotate90 => transpose_pairs(&src.flipped(true), &mut du, &mut dv),
        RotationMode::Rotate270 => {
            transpose_pairs(&src, &mut du.flipped(true), &mut dv.flipped(true))
        }
    }
}

/// Rotate all three planes of an I420 image.
pub fn i420_rotate(
    src_y: &[u8],
    src_stride_y: usize,
    src_u: &[u8],
    src_stride_u: usize,
    src_v: &[u8],
    src_stride_v: usize,
    dst_y: &mut [u8],
    dst_stride_y: usize,
    dst_u: &mut [u8],
    dst_stride_u: usize,
    dst_v: &mut [u8],
    dst_stride_v: usize,
    width: usize,
    height: i32,
    mode: RotationMode,
) -> Result<(), Error> {
    let (rows, flip) = frame(width, height)?;
    let (cw, ch) = (half(width), half(rows));
    let sy = src_view(src_y, src_stride_y, width, rows, flip)?;
    let su = src_view(src_u, src_stride_u, cw, ch, flip)?;
    let sv = src_view(src_v, src_stride_v, cw, ch, flip)?;
    let dy = dst_view(dst_y, dst_stride_y, width, rows, 1, mode)?;
    let du = dst_view(dst_u, dst_stride_u, cw, ch, 1, mode)?;
    let dv = dst_view(dst_v, dst_stride_v, cw, ch, 1, mode)?;
    rotate_view(sy, dy, 1, mode);
    rotate_view(su, du, 1, mode);
    rotate_view(sv, dv, 1, mode);
    Ok(())
}

/// Rotate NV12 into I420, deinterleaving the chroma on the way.
pub fn nv12_to_i420_rotate(
    src_y: &[u8],
    src_stride_y: usize,
    src_uv: &[u8],
    src_stride_uv: usize,
    dst_y: &mut [u8],
    dst_stride_y: usize,
    dst_u: &mut [u8],
    dst_stride_u: usize,
    dst_v: &mut [u8],
    dst_stride_v: usize,
    width: usize,
    height: i32,
    mode: RotationMode,
) -> Result<(), Error> {
    let (rows, flip) = frame(width, height)?;
    let (cw, ch) = (half(width), half(rows));
    let sy = src_view(src_y, src_stride_y, width, rows, flip)?;
    let suv = src_view(src_uv, src_stride_uv, cw * 2, ch, flip)?;
    let dy = dst_view(dst_y, dst_stride_y, width, rows, 1, mode)?;
    let du = dst_view(dst_u, dst_stride_u, cw, ch, 1, mode)?;
    let dv = dst_view(dst_v, dst_stride_v, cw, ch, 1, mode)?;
    rotate_view(sy, dy, 1, mode);
    rotate_pairs_view(suv, du, dv, mode);
    Ok(())
}

/// Rotate an ARGB image.
pub fn argb_rotate(
    src_argb: &[u8],
    src_stride_argb: usize,
    dst_argb: &mut [u8],
    dst_stride_argb: usize,
    width: usize,
    height: i32,
    mode: RotationMode,
) -> Result<(), Error> {
    let (rows, flip) = frame(width, height)?;
    let s = src_view(src_argb, src_stride_argb, row_bytes(width, 4)?, rows, flip)?;
    let d = dst_view(dst_argb, dst_stride_argb, width, rows, 4, mode)?;
    rotate_view(s, d, 4, mode);
    Ok(())
}

fn mirror_view(src: &Rows<'_>, dst: &mut RowsMut<'_>, bpp: usize) {
    if bpp == 4 {
        let k = row::ARGB_MIRROR.bind(Geometry::new(src.row_bytes() / 4, false));
        for j in 0..src.len() {
            row::argb_mirror(k, src.row(j), dst.row_mut(j));
        }
    } else {
        let k = row::MIRROR.bind(Geometry::new(src.row_bytes(), false));
        for j in 0..src.len() {
            row::mirror(k, src.row(j), dst.row_mut(j));
        }
    }
}

/// Mirror a byte plane left to right.
pub fn mirror_plane(
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
    mirror_view(&s, &mut d, 1);
    Ok(())
}

/// Mirror an I420 image left to right.
pub fn i420_mirror(
    src_y: &[u8],
    src_stride_y: usize,
    src_u: &[u8],
    src_stride_u: usize,
    src_v: &[u8],
    src_stride_v: usize,
    dst_y: &mut [u8],
    dst_stride_y: usize,
    dst_u: &mut [u8],
    dst_stride_u: usize,
    dst_v: &mut [u8],
    dst_stride_v: usize,
    width: usize,
    height: i32,
) -> Result<(), Error> {
    let (rows, flip) = frame(width, height)?;
    let (cw, ch) = (half(width), half(rows));
    let sy = src_view(src_y, src_stride_y, width, rows, flip)?;
    let su = src_view(src_u, src_stride_u, cw, ch, flip)?;
    let sv = src_view(src_v, src_stride_v, cw, ch, flip)?;
    let mut dy = RowsMut::new(dst_y, dst_stride_y, width, rows)?;
    let mut du = RowsMut::new(dst_u, dst_stride_u, cw, ch)?;
    let mut dv = RowsMut::new(dst_v, dst_stride_v, cw, ch)?;
    mirror_view(&sy, &mut dy, 1);
    mirror_view(&su, &mut du, 1);
    mirror_view(&sv, &mut dv, 1);
    Ok(())
}

/// Mirror an ARGB image left to right.
pub fn argb_mirror(
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
    mirror_view(&s, &mut d, 4);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    const MODES: [RotationMode; 4] = [
        RotationMode::Rotate0,
        RotationMode::Rotate90,
        RotationMode::Rotate180,
        RotationMode::Rotate270,
    ];

    fn rotate(src: &[u8], w: usize, h: usize, mode: RotationMode) -> Vec<u8> {
        let (dw, _) = rotated(w, h, mode);
        let mut dst = vec![0u8; w * h];
        rotate_plane(src, w, &mut dst, dw, w, h as i32, mode).unwrap();
        dst
    }

    #[test]
    fn quarter_turns_move_corners_clockwise() {
        // 3 wide, 2 tall:
        //   0 1 2
        //   3 4 5
        let src = [0u8, 1, 2, 3, 4, 5];
        assert_eq!(rotate(&src, 3, 2, RotationMode::Rotate90), [3, 0, 4, 1, 5, 2]);
        assert_eq!(rotate(&src, 3, 2, RotationMode::Rotate270), [2, 5, 1, 4, 0, 3]);
        assert_eq!(rotate(&src, 3, 2, RotationMode::Rotate180), [5, 4, 3, 2, 1, 0]);
    }

    #[test]
    fn repeated_turns_round_trip() {
        let mut rng = StdRng::seed_from_u64(7);
        for (w, h) in [(8, 8), (19, 11), (40, 17), (9, 33)] {
            let src: Vec<u8> = (0..w * h).map(|_| rng.random()).collect();
            for mode in MODES {
                let turns = match mode {
                    RotationMode::Rotate180 => 2,
                    _ => 4,
                };
                let (mut cur, mut cw, mut ch) = (src.clone(), w, h);
                for _ in 0..turns {
                    cur = rotate(&cur, cw, ch, mode);
                    (cw, ch) = rotated(cw, ch, mode);
                }
                assert_eq!(cur, src, "{w}x{h} {mode:?}");
            }
        }
    }

    #[test]
    fn inverse_undoes_rotation() {
        let src: Vec<u8> = (0..21 * 10).map(|i| (i * 31) as u8).collect();
        for mode in MODES {
            let (dw, dh) = rotated(21, 10, mode);
            let there = rotate(&src, 21, 10, mode);
            assert_eq!(rotate(&there, dw, dh, mode.inverse()), src);
        }
    }

    #[test]
    fn argb_quarter_turn_moves_whole_pixels() {
        let px = |i: u8| [i, i + 100, i + 50, 255];
        let src: Vec<u8> = (0..6u8).flat_map(px).collect();
        let mut dst = vec![0u8; 24];
        argb_rotate(&src, 12, &mut dst, 8, 3, 2, RotationMode::Rotate90).unwrap();
        let want: Vec<u8> = [3u8, 0, 4, 1, 5, 2].into_iter().flat_map(px).collect();
        assert_eq!(dst, want);
    }

    #[test]
    fn uv_rotation_matches_separate_planes() {
        let (w, h) = (11usize, 9usize);
        let uv: Vec<u8> = (0..w * h * 2).map(|i| (i * 7 + 1) as u8).collect();
        let u: Vec<u8> = uv.iter().step_by(2).copied().collect();
        let v: Vec<u8> = uv.iter().skip(1).step_by(2).copied().collect();
        for mode in MODES {
            let (dw, _) = rotated(w, h, mode);
            let (mut du, mut dv) = (vec![0u8; w * h], vec![0u8; w * h]);
            rotate_uv(&uv, w * 2, &mut du, dw, &mut dv, dw, w, h as i32, mode).unwrap();
            assert_eq!(du, rotate(&u, w, h, mode), "{mode:?}");
            assert_eq!(dv, rotate(&v, w, h, mode), "{mode:?}");
        }
    }

    #[test]
    fn i420_rotate_uses_half_size_chroma() {
        let (w, h) = (5usize, 3usize);
        let y: Vec<u8> = (0..15).collect();
        let (u, v) = ([1u8, 2, 3, 4, 5, 6], [7u8, 8, 9, 10, 11, 12]);
        let (mut dy, mut du, mut dv) = (vec![0u8; 15], vec![0u8; 6], vec![0u8; 6]);
        i420_rotate(&y, w, &u, 3, &v, 3, &mut dy, h, &mut du, 2, &mut dv, 2, w, h as i32, RotationMode::Rotate90)
            .unwrap();
        assert_eq!(dy, rotate(&y, 5, 3, RotationMode::Rotate90));
        assert_eq!(du, rotate(&u, 3, 2, RotationMode::Rotate90));
        assert_eq!(dv, rotate(&v, 3, 2, RotationMode::Rotate90));
    }

    #[test]
    fn nv12_rotate_matches_i420_rotate() {
        let (w, h) = (6usize, 4usize);
        let y: Vec<u8> = (0..24).collect();
        let uv: Vec<u8> = (0..12).map(|i| i * 10).collect();
        let u: Vec<u8> = uv.iter().step_by(2).copied().collect();
        let v: Vec<u8> = uv.iter().skip(1).step_by(2).copied().collect();
        let mode = RotationMode::Rotate270;
        let (mut a, mut b) = (vec![0u8; 36], vec![0u8; 36]);
        {
            let (ay, rest) = a.split_at_mut(24);
            let (au, av) = rest.split_at_mut(6);
            nv12_to_i420_rotate(&y, 6, &uv, 6, ay, 4, au, 2, av, 2, w, h as i32, mode).unwrap();
        }
        {
            let (by, rest) = b.split_at_mut(24);
            let (bu, bv) = rest.split_at_mut(6);
            i420_rotate(&y, 6, &u, 3, &v, 3, by, 4, bu, 2, bv, 2, w, h as i32, mode).unwrap();
        }
        assert_eq!(a, b);
    }

    #[test]
    fn negative_height_rotates_the_flipped_source() {
        let src: Vec<u8> = (0..12).collect();
        let flipped: Vec<u8> = src.chunks_exact(4).rev().flatten().copied().collect();
        let (mut a, mut b) = (vec![0u8; 12], vec![0u8; 12]);
        rotate_plane(&src, 4, &mut a, 3, 4, -3, RotationMode::Rotate90).unwrap();
        rotate_plane(&flipped, 4, &mut b, 3, 4, 3, RotationMode::Rotate90).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn mirrors() {
        let src: Vec<u8> = (0..40).collect();
        let mut dst = vec![0u8; 40];
        mirror_plane(&src, 20, &mut dst, 20, 20, 2).unwrap();
        assert_eq!(&dst[..3], [19, 18, 17]);
        assert_eq!(&dst[20..23], [39, 38, 37]);

        let mut out = vec![0u8; 40];
        argb_mirror(&src, 20, &mut out, 20, 5, 2).unwrap();
        assert_eq!(&out[..8], [16, 17, 18, 19, 12, 13, 14, 15]);

        let (mut y, mut u, mut v) = (vec![0u8; 4], [0u8; 1], [0u8; 1]);
        i420_mirror(&[1, 2, 3, 4], 2, &[5], 1, &[6], 1, &mut y, 2, &mut u, 1, &mut v, 1, 2, 2).unwrap();
        assert_eq!((y.as_slice(), u, v), (&[2u8, 1, 4, 3][..], [5], [6]));
    }

    #[test]
    fn short_destination_fails_before_writing() {
        let src = [1u8; 12];
        let mut dst = [0u8; 11];
        assert!(matches!(
            rotate_plane(&src, 4, &mut dst, 3, 4, 3, RotationMode::Rotate90),
            Err(Error::BufferTooSmall { .. })
        ));
        assert!(dst.iter().all(|&b| b == 0));
        assert_eq!(RotationMode::from_degrees(270), Some(RotationMode::Rotate270));
        assert_eq!(RotationMode::from_degrees(45), None);
    }
}
