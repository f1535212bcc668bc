/// Why a conversion, scale, rotation or demosaic call was rejected.
///
/// Every entry point validates its arguments before touching the destination,
/// so an `Err` always means nothing was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A zero dimension, an empty slice, odd Bayer dimensions, or a
    /// parameter outside its domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// Rows would overlap: the stride is shorter than one row of pixels.
    #[error("stride {stride} is smaller than the {row_bytes} bytes of one row")]
    StrideTooSmall { stride: usize, row_bytes: usize },
    /// The slice ends before the last row does.
    #[error("buffer holds {len} bytes but the geometry needs {needed}")]
    BufferTooSmall { needed: usize, len: usize },
    /// A well-formed request for something this crate does not do.
    #[error("unsupported: {0}")]
    Unsupported(&'static str),
}
