// ---------------------------------------------------------------------------
// Bayer mosaics.
//
// Every site of the 2x2 colour filter carries one channel; the other two come
// from truncated means of the neighbours that exist. Interior sites average
// four neighbours, edges three (or two), corners two (or one), so borders need
// no padding. A green site takes the horizontal mean for the colour sharing
// its row and the vertical mean for the other.
// ---------------------------------------------------------------------------

use alloc::vec;

use crate::Error;
use crate::color::{rgb_to_u, rgb_to_v, rgb_to_y};
use crate::convert::{frame, src_view};
use crate::fourcc::FourCc;
use crate::plane::{Rows, RowsMut, row_bytes};

/// Layout of the 2x2 colour filter, named by its top row then bottom row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BayerOrder {
    Rggb,
    Bggr,
    Grbg,
    Gbrg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Site {
    Red,
    Blue,
    /// Green on a row shared with red.
    GreenRed,
    /// Green on a row shared with blue.
    GreenBlue,
}

impl BayerOrder {
    pub const fn fourcc(self) -> FourCc {
        match self {
            Self::Rggb => FourCc::RGGB,
            Self::Bggr => FourCc::BGGR,
            Self::Grbg => FourCc::GRBG,
            Self::Gbrg => FourCc::GBRG,
        }
    }

    /// Sites of logical row `j`, even column first.
    const fn sites(self, j: usize) -> [Site; 2] {
        use Site::*;
        let [top, bottom] = match self {
            Self::Rggb => [[Red, GreenRed], [GreenBlue, Blue]],
            Self::Bggr => [[Blue, GreenBlue], [GreenRed, Red]],
            Self::Grbg => [[GreenRed, Red], [Blue, GreenBlue]],
            Self::Gbrg => [[GreenBlue, Blue], [Red, GreenRed]],
        };
        if j & 1 == 0 { top } else { bottom }
    }
}

pub(crate) fn check_even(width: usize, rows: usize) -> Result<(), Error> {
    if width % 2 != 0 || rows % 2 != 0 {
        return Err(Error::InvalidArgument("Bayer dimensions must be even"));
    }
    Ok(())
}

#[inline(always)]
fn sample(row: Option<&[u8]>, x: Option<usize>) -> Option<u8> {
    row.zip(x).and_then(|(r, x)| r.get(x).copied())
}

/// Truncated mean of the samples that exist.
#[inline(always)]
fn mean<const N: usize>(samples: [Option<u8>; N]) -> u8 {
    let (sum, n) = samples
        .iter()
        .flatten()
        .fold((0u32, 0u32), |(s, n), &v| (s + v as u32, n + 1));
    (sum / n.max(1)) as u8
}

/// Demosaic logical row `j` of `src` into ARGB.
fn demosaic_row(src: &Rows<'_>, j: usize, order: BayerOrder, out: &mut [u8]) {
    let cur = src.row(j);
    let prev = j.checked_sub(1).map(|i| src.row(i));
    let next = (j + 1 < src.len()).then(|| src.row(j + 1));
    let sites = order.sites(j);
    let row = Some(cur);
    for (x, px) in out.chunks_exact_mut(4).enumerate().take(cur.len()) {
        let (l, r) = (x.checked_sub(1), Some(x + 1));
        let c = cur[x];
        let (red, green, blue) = match sites[x & 1] {
            Site::Red | Site::Blue => {
                let g = mean([sample(row, l), sample(row, r), sample(prev, Some(x)), sample(next, Some(x))]);
                let diag = mean([sample(prev, l), sample(prev, r), sample(next, l), sample(next, r)]);
                if sites[x & 1] == Site::Red { (c, g, diag) } else { (diag, g, c) }
            }
            site => {
                let horiz = mean([sample(row, l), sample(row, r)]);
                let vert = mean([sample(prev, Some(x)), sample(next, Some(x))]);
                if site == Site::GreenRed { (horiz, c, vert) } else { (vert, c, horiz) }
            }
        };
        px.copy_from_slice(&[blue, green, red, 255]);
    }
}

/// Demosaic a Bayer mosaic into ARGB.
///
/// Width and height must be even.
pub fn bayer_to_argb(
    src_bayer: &[u8],
    src_stride_bayer: usize,
    dst_argb: &mut [u8],
    dst_stride_argb: usize,
    width: usize,
    height: i32,
    order: BayerOrder,
) -> Result<(), Error> {
    let (rows, flip) = frame(width, height)?;
    check_even(width, rows)?;
    let src = src_view(src_bayer, src_stride_bayer, width, rows, flip)?;
    let mut dst = RowsMut::new(dst_argb, dst_stride_argb, row_bytes(width, 4)?, rows)?;
    for j in 0..rows {
        demosaic_row(&src, j, order, dst.row_mut(j));
    }
    Ok(())
}

/// Demosaic a Bayer mosaic into I420. Luma is per pixel; each chroma sample
/// is the truncated mean of its 2x2 block's per-pixel chroma.
pub fn bayer_to_i420(
    src_bayer: &[u8],
    src_stride_bayer: usize,
    dst_y: &mut [u8],
    dst_stride_y: usize,
    dst_u: &mut [u8],
    dst_stride_u: usize,
    dst_v: &mut [u8],
    dst_stride_v: usize,
    width: usize,
    height: i32,
    order: BayerOrder,
) -> Result<(), Error> {
    let (rows, flip) = frame(width, height)?;
    check_even(width, rows)?;
    let (cw, ch) = (width / 2, rows / 2);
    let src = src_view(src_bayer, src_stride_bayer, width, rows, flip)?;
    let mut y = RowsMut::new(dst_y, dst_stride_y, width, rows)?;
    let mut u = RowsMut::new(dst_u, dst_stride_u, cw, ch)?;
    let mut v = RowsMut::new(dst_v, dst_stride_v, cw, ch)?;

    let mut top = vec![0u8; width * 4];
    let mut bottom = vec![0u8; width * 4];
    for k in 0..ch {
        demosaic_row(&src, 2 * k, order, &mut top);
        demosaic_row(&src, 2 * k + 1, order, &mut bottom);
        for (argb, j) in [(&top, 2 * k), (&bottom, 2 * k + 1)] {
            for (d, p) in y.row_mut(j).iter_mut().zip(argb.chunks_exact(4)) {
                *d = rgb_to_y(p[2], p[1], p[0]);
            }
        }
        let blocks = top.chunks_exact(8).zip(bottom.chunks_exact(8));
        let (du, dv) = (u.row_mut(k), v.row_mut(k));
        for ((du, dv), (t, b)) in du.iter_mut().zip(dv.iter_mut()).zip(blocks) {
            let (mut su, mut sv) = (0u32, 0u32);
            for p in t.chunks_exact(4).chain(b.chunks_exact(4)) {
                su += rgb_to_u(p[2], p[1], p[0]) as u32;
                sv += rgb_to_v(p[2], p[1], p[0]) as u32;
            }
            *du = (su / 4) as u8;
            *dv = (sv / 4) as u8;
        }
    }
    Ok(())
}

/// Keep the channel each site of `order` samples from an ARGB row.
pub(crate) fn argb_to_bayer_row(src_argb: &[u8], dst: &mut [u8], order: BayerOrder, j: usize) {
    let sites = order.sites(j);
    for (x, (d, p)) in dst.iter_mut().zip(src_argb.chunks_exact(4)).enumerate() {
        *d = match sites[x & 1] {
            Site::Red => p[2],
            Site::Blue => p[0],
            Site::GreenRed | Site::GreenBlue => p[1],
        };
    }
}

/// Sample ARGB through a Bayer colour filter.
///
/// Width and height must be even.
pub fn argb_to_bayer(
    src_argb: &[u8],
    src_stride_argb: usize,
    dst_bayer: &mut [u8],
    dst_stride_bayer: usize,
    width: usize,
    height: i32,
    order: BayerOrder,
) -> Result<(), Error> {
    let (rows, flip) = frame(width, height)?;
    check_even(width, rows)?;
    let src = src_view(src_argb, src_stride_argb, row_bytes(width, 4)?, rows, flip)?;
    let mut dst = RowsMut::new(dst_bayer, dst_stride_bayer, width, rows)?;
    for j in 0..rows {
        argb_to_bayer_row(src.row(j), dst.row_mut(j), order, j);
    }
    Ok(())
}
