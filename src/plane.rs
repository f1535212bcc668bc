// ---------------------------------------------------------------------------
// Row views over caller-owned planes.
//
// A view pins down everything a driver needs to walk a plane: the slice, the
// stride, how many rows and bytes per row are in play, and whether rows are
// visited bottom-up. Geometry is validated once at construction, so drivers
// index rows afterwards without re-checking and never reason about stride
// signs.
// ---------------------------------------------------------------------------

use crate::Error;

/// Resolve a signed height into `(rows, bottom_up)`.
#[inline]
pub(crate) fn rows_of(height: i32) -> Result<(usize, bool), Error> {
    if height == 0 {
        return Err(Error::InvalidArgument("height must be non-zero"));
    }
    Ok((height.unsigned_abs() as usize, height < 0))
}

#[inline]
pub(crate) fn check_width(width: usize) -> Result<(), Error> {
    if width == 0 {
        Err(Error::InvalidArgument("width must be non-zero"))
    } else {
        Ok(())
    }
}

/// Validate that `len` bytes hold `rows` rows of `row_bytes` spaced `stride`
/// apart.
#[inline]
pub(crate) fn check_plane(
    len: usize,
    row_bytes: usize,
    rows: usize,
    stride: usize,
) -> Result<(), Error> {
    if len == 0 {
        return Err(Error::InvalidArgument("plane is empty"));
    }
    if row_bytes == 0 || rows == 0 {
        return Err(Error::InvalidArgument("plane has no pixels"));
    }
    if rows > 1 && stride < row_bytes {
        return Err(Error::StrideTooSmall { stride, row_bytes });
    }
    let needed = (rows - 1)
        .checked_mul(stride)
        .and_then(|n| n.checked_add(row_bytes))
        .ok_or(Error::BufferTooSmall {
            needed: usize::MAX,
            len,
        })?;
    if len < needed {
        return Err(Error::BufferTooSmall { needed, len });
    }
    Ok(())
}

/// Bytes per row for `width` pixels of `bpp` bytes, with overflow reported
/// as an invalid argument.
#[inline]
pub(crate) fn row_bytes(width: usize, bpp: usize) -> Result<usize, Error> {
    width
        .checked_mul(bpp)
        .ok_or(Error::InvalidArgument("row size overflows usize"))
}

/// `(n + 1) / 2`, the chroma extent of a 2:1 subsampled dimension.
#[inline]
pub(crate) const fn half(n: usize) -> usize {
    n.div_ceil(2)
}

/// `(n + 3) / 4`, the chroma width of 4:1:1.
#[inline]
pub(crate) const fn quarter(n: usize) -> usize {
    n.div_ceil(4)
}

#[inline]
fn is_aligned(ptr: usize, stride: usize, rows: usize, align: usize) -> bool {
    ptr.is_multiple_of(align) && (rows == 1 || stride.is_multiple_of(align))
}

// ===========================================================================
// Read-only view
// ===========================================================================

#[derive(Clone, Copy, Debug)]
pub(crate) struct Rows<'a> {
    data: &'a [u8],
    stride: usize,
    rows: usize,
    row_bytes: usize,
    backward: bool,
}

impl<'a> Rows<'a> {
    pub(crate) fn new(
        data: &'a [u8],
        stride: usize,
        row_bytes: usize,
        rows: usize,
    ) -> Result<Self, Error> {
        check_plane(data.len(), row_bytes, rows, stride)?;
        Ok(Self {
            data,
            stride,
            rows,
            row_bytes,
            backward: false,
        })
    }

    /// Visit rows in the opposite order when `flip` is set.
    #[must_use]
    pub(crate) fn flipped(mut self, flip: bool) -> Self {
        self.backward ^= flip;
        self
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.rows
    }

    #[inline]
    pub(crate) fn row_bytes(&self) -> usize {
        self.row_bytes
    }

    #[inline]
    fn physical(&self, i: usize) -> usize {
        debug_assert!(i < self.rows);
        if self.backward { self.rows - 1 - i } else { i }
    }

    #[inline]
    pub(crate) fn row(&self, i: usize) -> &'a [u8] {
        let p = self.physical(i);
        &self.data[p * self.stride..][..self.row_bytes]
    }

    /// Row `i`, or the last row when `i` runs past the bottom.
    #[inline]
    pub(crate) fn row_clamped(&self, i: usize) -> &'a [u8] {
        self.row(i.min(self.rows - 1))
    }

    pub(crate) fn aligned(&self, align: usize) -> bool {
        is_aligned(self.data.as_ptr() as usize, self.stride, self.rows, align)
    }
}

// ===========================================================================
// Mutable view
// ===========================================================================

#[derive(Debug)]
pub(crate) struct RowsMut<'a> {
    data: &'a mut [u8],
    stride: usize,
    rows: usize,
    row_bytes: usize,
    backward: bool,
}

impl<'a> RowsMut<'a> {
    pub(crate) fn new(
        data: &'a mut [u8],
        stride: usize,
        row_bytes: usize,
        rows: usize,
    ) -> Result<Self, Error> {
        check_plane(data.len(), row_bytes, rows, stride)?;
        Ok(Self {
            data,
            stride,
            rows,
            row_bytes,
            backward: false,
        })
    }

    #[must_use]
    pub(crate) fn flipped(mut self, flip: bool) -> Self {
        self.backward ^= flip;
        self
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.rows
    }

    #[inline]
    pub(crate) fn row_bytes(&self) -> usize {
        self.row_bytes
    }

    #[inline]
    fn physical(&self, i: usize) -> usize {
        debug_assert!(i < self.rows);
        if self.backward { self.rows - 1 - i } else { i }
    }

    #[inline]
    pub(crate) fn row(&self, i: usize) -> &[u8] {
        let p = self.physical(i);
        &self.data[p * self.stride..][..self.row_bytes]
    }

    #[inline]
    pub(crate) fn row_mut(&mut self, i: usize) -> &mut [u8] {
        let p = self.physical(i);
        &mut self.data[p * self.stride..][..self.row_bytes]
    }

    pub(crate) fn aligned(&self, align: usize) -> bool {
        is_aligned(self.data.as_ptr() as usize, self.stride, self.rows, align)
    }

    /// Reborrow as a read-only view of the same rows.
    pub(crate) fn as_rows(&self) -> Rows<'_> {
        Rows {
            data: &*self.data,
            stride: self.stride,
            rows: self.rows,
            row_bytes: self.row_bytes,
            backward: self.backward,
        }
    }
}

/// Row-by-row copy; both views must describe the same row count and width.
pub(crate) fn copy_rows(src: &Rows<'_>, dst: &mut RowsMut<'_>) {
    debug_assert_eq!(src.len(), dst.len());
    debug_assert_eq!(src.row_bytes(), dst.row_bytes());
    for y in 0..src.len() {
        dst.row_mut(y).copy_from_slice(src.row(y));
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;
    use super::*;
    use alloc::vec;

    #[test]
    fn plane_geometry_is_checked() {
        assert_eq!(check_plane(10, 4, 3, 3), Err(Error::StrideTooSmall { stride: 3, row_bytes: 4 }));
        assert_eq!(check_plane(10, 4, 3, 4), Err(Error::BufferTooSmall { needed: 12, len: 10 }));
        assert_eq!(check_plane(12, 4, 3, 4), Ok(()));
        // A single row ignores the stride entirely.
        assert_eq!(check_plane(4, 4, 1, 0), Ok(()));
        assert!(matches!(check_plane(0, 4, 1, 4), Err(Error::InvalidArgument(_))));
        assert!(matches!(
            check_plane(16, usize::MAX, 2, usize::MAX),
            Err(Error::BufferTooSmall { .. })
        ));
    }

    #[test]
    fn signed_height() {
        assert_eq!(rows_of(5), Ok((5, false)));
        assert_eq!(rows_of(-5), Ok((5, true)));
        assert!(rows_of(0).is_err());
        assert_eq!(rows_of(i32::MIN), Ok((1usize << 31, true)));
    }

    #[test]
    fn flipped_view_walks_bottom_up() {
        let data: alloc::vec::Vec<u8> = (0..12).collect();
        let rows = Rows::new(&data, 4, 3, 3).unwrap();
        assert_eq!(rows.row(0), &[0, 1, 2]);
        let up = rows.flipped(true);
        assert_eq!(up.row(0), &[8, 9, 10]);
        assert_eq!(up.row(2), &[0, 1, 2]);
        assert_eq!(up.flipped(true).row(0), &[0, 1, 2]);
        assert_eq!(rows.row_clamped(7), &[8, 9, 10]);
    }

    #[test]
    fn mutable_view_writes_through() {
        let mut data = vec![0u8; 8];
        {
            let mut rows = RowsMut::new(&mut data, 4, 2, 2).unwrap().flipped(true);
            rows.row_mut(0).copy_from_slice(&[7, 8]);
            assert_eq!(rows.as_rows().row(0), &[7, 8]);
        }
        assert_eq!(data, [0, 0, 0, 0, 7, 8, 0, 0]);
    }
}
