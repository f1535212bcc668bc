// ---------------------------------------------------------------------------
// I420 -> packed RGB layouts other than ARGB: each row is converted to ARGB
// in scratch by the dispatched I422 kernel, then packed.
// ---------------------------------------------------------------------------

use alloc::vec;

use super::{frame, src_view};
use crate::Error;
use crate::color::BT601;
use crate::dispatch::Geometry;
use crate::plane::{RowsMut, half, row_bytes};
use crate::row;

use super::to_argb::aligned_plane;

/// Drive I420 through a scratch ARGB row into `bpp`-byte pixels. `pack`
/// gets the ARGB row, the output row and the output row's index.
pub(super) fn i420_through_argb(
    planes: [(&[u8], usize); 3],
    dst: &mut [u8],
    dst_stride: usize,
    bpp: usize,
    width: usize,
    height: i32,
    mut pack: impl FnMut(&[u8], &mut [u8], usize),
) -> Result<(), Error> {
    let (rows, flip) = frame(width, height)?;
    let (cw, ch) = (half(width), half(rows));
    let aligned = planes.iter().all(|&(p, s)| aligned_plane(p, s));
    let [(y, ys), (u, us), (v, vs)] = planes;
    let sy = src_view(y, ys, width, rows, flip)?;
    let su = src_view(u, us, cw, ch, flip)?;
    let sv = src_view(v, vs, cw, ch, flip)?;
    let mut d = RowsMut::new(dst, dst_stride, row_bytes(width, bpp)?, rows)?;
    let k = row::I422_TO_ARGB.bind(Geometry::new(width, aligned));
    let mut argb = vec![0u8; width * 4];
    for j in 0..rows {
        row::i422_to_argb(k, sy.row(j), su.row(j / 2), sv.row(j / 2), &mut argb, &BT601);
        pack(&argb, d.row_mut(j), j);
    }
    Ok(())
}

macro_rules! i420_to_packed {
    ($(#[$doc:meta])* $name:ident, $bpp:expr, $pack:expr) => {
        $(#[$doc])*
        pub fn $name(
            src_y: &[u8],
            src_stride_y: usize,
            src_u: &[u8],
            src_stride_u: usize,
            src_v: &[u8],
            src_stride_v: usize,
            dst: &mut [u8],
            dst_stride: usize,
            width: usize,
            height: i32,
        ) -> Result<(), Error> {
            let pack: fn(&[u8], &mut [u8]) = $pack;
            i420_through_argb(
                [(src_y, src_stride_y), (src_u, src_stride_u), (src_v, src_stride_v)],
                dst,
                dst_stride,
                $bpp,
                width,
                height,
                |s, d, _| pack(s, d),
            )
        }
    };
}

i420_to_packed!(
    /// I420 to BGRA (bytes A, R, G, B).
    i420_to_bgra,
    4,
    |s, d| row::shuffle_row(s, d, &[3, 2, 1, 0])
);
i420_to_packed!(
    /// I420 to ABGR (bytes R, G, B, A).
    i420_to_abgr,
    4,
    |s, d| row::shuffle_row(s, d, &[2, 1, 0, 3])
);
i420_to_packed!(
    /// I420 to RGBA (bytes A, B, G, R).
    i420_to_rgba,
    4,
    |s, d| row::shuffle_row(s, d, &[3, 0, 1, 2])
);
i420_to_packed!(
    /// I420 to RGB24.
    i420_to_rgb24,
    3,
    row::argb_to_rgb24_row
);
i420_to_packed!(
    /// I420 to RAW.
    i420_to_raw,
    3,
    row::argb_to_raw_row
);
i420_to_packed!(
    /// I420 to opaque ARGB1555.
    i420_to_argb1555,
    2,
    row::argb_to_argb1555_row
);
i420_to_packed!(
    /// I420 to opaque ARGB4444.
    i420_to_argb4444,
    2,
    row::argb_to_argb4444_row
);

/// I420 to RGB565.
pub fn i420_to_rgb565(
    src_y: &[u8],
    src_stride_y: usize,
    src_u: &[u8],
    src_stride_u: usize,
    src_v: &[u8],
    src_stride_v: usize,
    dst: &mut [u8],
    dst_stride: usize,
    width: usize,
    height: i32,
) -> Result<(), Error> {
    let k = row::ARGB_TO_RGB565.bind(Geometry::new(width, false));
    i420_through_argb(
        [(src_y, src_stride_y), (src_u, src_stride_u), (src_v, src_stride_v)],
        dst,
        dst_stride,
        2,
        width,
        height,
        |s, d, _| row::argb_to_rgb565(k, s, d),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::from_argb::{argb_to_abgr, argb_to_rgb565};
    use crate::convert::to_argb::i420_to_argb;
    use alloc::vec::Vec;

    fn frame_420(w: usize, h: usize) -> (Vec<u8>, Vec<u8>, Vec<u8>) {
        let c = half(w) * half(h);
        (
            (0..w * h).map(|i| (i * 13 + 20) as u8).collect(),
            (0..c).map(|i| (i * 40 + 30) as u8).collect(),
            (0..c).map(|i| 220u32.wrapping_sub(i as u32 * 35) as u8).collect(),
        )
    }

    #[test]
    fn packed_outputs_match_argb_then_pack() {
        let (w, h) = (9usize, 5usize);
        let (y, u, v) = frame_420(w, h);
        let cw = half(w);
        let mut argb = vec![0u8; w * h * 4];
        i420_to_argb(&y, w, &u, cw, &v, cw, &mut argb, w * 4, w, h as i32).unwrap();

        let mut want = vec![0u8; w * h * 4];
        argb_to_abgr(&argb, w * 4, &mut want, w * 4, w, h as i32).unwrap();
        let mut got = vec![0u8; w * h * 4];
        i420_to_abgr(&y, w, &u, cw, &v, cw, &mut got, w * 4, w, h as i32).unwrap();
        assert_eq!(got, want);

        let mut want = vec![0u8; w * h * 2];
        argb_to_rgb565(&argb, w * 4, &mut want, w * 2, w, h as i32).unwrap();
        let mut got = vec![0u8; w * h * 2];
        i420_to_rgb565(&y, w, &u, cw, &v, cw, &mut got, w * 2, w, h as i32).unwrap();
        assert_eq!(got, want);
    }

    #[test]
    fn rgb24_is_argb_without_alpha() {
        let (w, h) = (4usize, 2usize);
        let (y, u, v) = frame_420(w, h);
        let mut argb = vec![0u8; w * h * 4];
        i420_to_argb(&y, w, &u, 2, &v, 2, &mut argb, w * 4, w, h as i32).unwrap();
        let mut rgb = vec![0u8; w * h * 3];
        i420_to_rgb24(&y, w, &u, 2, &v, 2, &mut rgb, w * 3, w, h as i32).unwrap();
        let stripped: Vec<u8> = argb.chunks_exact(4).flat_map(|p| [p[0], p[1], p[2]]).collect();
        assert_eq!(rgb, stripped);
        let mut raw = vec![0u8; w * h * 3];
        i420_to_raw(&y, w, &u, 2, &v, 2, &mut raw, w * 3, w, h as i32).unwrap();
        assert!(raw.chunks_exact(3).zip(rgb.chunks_exact(3)).all(|(a, b)| a == [b[2], b[1], b[0]]));
    }

    #[test]
    fn sixteen_bit_outputs_are_opaque() {
        let (y, u, v) = frame_420(2, 2);
        let mut out = [0u8; 8];
        i420_to_argb1555(&y, 2, &u, 1, &v, 1, &mut out, 4, 2, 2).unwrap();
        assert!(out.chunks_exact(2).all(|p| p[1] & 0x80 != 0));
        i420_to_argb4444(&y, 2, &u, 1, &v, 1, &mut out, 4, 2, 2).unwrap();
        assert!(out.chunks_exact(2).all(|p| p[1] >> 4 == 0xf));
    }
}
