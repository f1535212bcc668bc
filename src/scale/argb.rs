// ---------------------------------------------------------------------------
// ARGB resampling.
//
// Coordinates follow the plane rules. Integer ratios short-circuit unless
// area averaging was asked for: even factors average the 2x2 block at each
// sample point when filtering, odd factors land exactly on source pixels so
// they point-sample.
// ---------------------------------------------------------------------------

use super::fixed::Step;
use super::{FilterMode, axis, check_dimension, resample};
use crate::Error;
use crate::plane::{Rows, RowsMut, check_plane, row_bytes, rows_of};

fn even_box(src: &Rows<'_>, dst: &mut RowsMut<'_>, mut x: Step, mut y: Step) {
    let cols: alloc::vec::Vec<usize> = (0..dst.row_bytes() / 4)
        .map(|_| {
            let xi = (x.pos() >> 16) as usize;
            x.advance();
            xi * 4
        })
        .collect();
    for j in 0..dst.len() {
        let yi = (y.pos() >> 16) as usize;
        y.advance();
        let (r0, r1) = (src.row(yi), src.row_clamped(yi + 1));
        for (d, &at) in dst.row_mut(j).chunks_exact_mut(4).zip(&cols) {
            for c in 0..4 {
                let sum = r0[at + c] as u32
                    + r0[at + 4 + c] as u32
                    + r1[at + c] as u32
                    + r1[at + 4 + c] as u32;
                d[c] = ((sum + 2) >> 2) as u8;
            }
        }
    }
}

/// Scale an ARGB image into the `clip_width x clip_height` window at
/// (`clip_x`, `clip_y`) of a `dst_width x dst_height` destination. Pixels
/// outside the window are not touched; pixels inside match what
/// [`argb_scale`] would have written there.
pub fn argb_scale_clip(
    src: &[u8],
    src_stride: usize,
    src_width: usize,
    src_height: i32,
    dst: &mut [u8],
    dst_stride: usize,
    dst_width: usize,
    dst_height: usize,
    clip_x: usize,
    clip_y: usize,
    clip_width: usize,
    clip_height: usize,
    filter: FilterMode,
) -> Result<(), Error> {
    let (src_rows, flip) = rows_of(src_height)?;
    let sw = check_dimension(src_width)?;
    let sh = check_dimension(src_rows)?;
    let dw = check_dimension(dst_width)?;
    let dh = check_dimension(dst_height)?;
    check_dimension(clip_width)?;
    check_dimension(clip_height)?;
    if clip_x.checked_add(clip_width).is_none_or(|r| r > dst_width)
        || clip_y.checked_add(clip_height).is_none_or(|b| b > dst_height)
    {
        return Err(Error::InvalidArgument("clip rectangle exceeds the destination"));
    }

    let src = Rows::new(src, src_stride, row_bytes(src_width, 4)?, src_rows)?.flipped(flip);
    check_plane(dst.len(), row_bytes(dst_width, 4)?, dst_height, dst_stride)?;
    let start = clip_y * dst_stride + clip_x * 4;
    let mut window = RowsMut::new(&mut dst[start..], dst_stride, clip_width * 4, clip_height)?;

    let mut x = axis(sw, dw, filter);
    let mut y = axis(sh, dh, filter);
    let integral = |s: &Step| s.is_exact() && s.whole() & 0xffff == 0;
    if filter != FilterMode::Box && integral(&x) && integral(&y) {
        let (fx, fy) = (x.whole() >> 16, y.whole() >> 16);
        if filter != FilterMode::None && fx > 0 && fy > 0 && fx % 2 == 0 && fy % 2 == 0 {
            log::trace!("tailor: argb_scale even {fx}x{fy} box");
            x.skip(clip_x);
            y.skip(clip_y);
            even_box(&src, &mut window, x, y);
            return Ok(());
        }
        if fx % 2 == 1 && fy % 2 == 1 {
            // Filtered sample points sit on pixel centres already.
            x.skip(clip_x);
            y.skip(clip_y);
            super::generic::point(&src, &mut window, 4, x, y);
            return Ok(());
        }
    }
    resample(&src, &mut window, 4, (dw, dh), (clip_x, clip_y), filter);
    Ok(())
}

/// Scale an ARGB image to `dst_width x dst_height`. A negative
/// `src_height` reads the source bottom-up.
pub fn argb_scale(
    src: &[u8],
    src_stride: usize,
    src_width: usize,
    src_height: i32,
    dst: &mut [u8],
    dst_stride: usize,
    dst_width: usize,
    dst_height: usize,
    filter: FilterMode,
) -> Result<(), Error> {
    argb_scale_clip(
        src, src_stride, src_width, src_height, dst, dst_stride, dst_width, dst_height, 0, 0,
        dst_width, dst_height, filter,
    )
}
