//! FourCC codes and the pixel formats they name.

use crate::bayer::BayerOrder;

/// A four-character code, packed little-endian (`b"I420"` has `'I'` in the
/// low byte).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCc(pub u32);

impl FourCc {
    pub const fn new(code: [u8; 4]) -> Self {
        Self(u32::from_le_bytes(code))
    }

    pub const fn bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    // Planar and biplanar YUV.
    pub const I420: Self = Self::new(*b"I420");
    pub const I422: Self = Self::new(*b"I422");
    pub const I444: Self = Self::new(*b"I444");
    pub const I411: Self = Self::new(*b"I411");
    pub const I400: Self = Self::new(*b"I400");
    pub const YV12: Self = Self::new(*b"YV12");
    pub const YV16: Self = Self::new(*b"YV16");
    pub const YV24: Self = Self::new(*b"YV24");
    pub const NV12: Self = Self::new(*b"NV12");
    pub const NV21: Self = Self::new(*b"NV21");
    pub const M420: Self = Self::new(*b"M420");
    // Packed YUV.
    pub const YUY2: Self = Self::new(*b"YUY2");
    pub const UYVY: Self = Self::new(*b"UYVY");
    // Packed RGB.
    pub const ARGB: Self = Self::new(*b"ARGB");
    pub const BGRA: Self = Self::new(*b"BGRA");
    pub const ABGR: Self = Self::new(*b"ABGR");
    pub const RGBA: Self = Self::new(*b"RGBA");
    pub const RGB24: Self = Self::new(*b"24BG");
    pub const RAW: Self = Self::new(*b"raw ");
    pub const RGB565: Self = Self::new(*b"RGBP");
    pub const ARGB1555: Self = Self::new(*b"RGBO");
    pub const ARGB4444: Self = Self::new(*b"R444");
    // Bayer mosaics.
    pub const RGGB: Self = Self::new(*b"RGGB");
    pub const BGGR: Self = Self::new(*b"BGGR");
    pub const GRBG: Self = Self::new(*b"GRBG");
    pub const GBRG: Self = Self::new(*b"GBRG");
    // Compressed.
    pub const MJPG: Self = Self::new(*b"MJPG");

    // Aliases.
    pub const IYUV: Self = Self::new(*b"IYUV");
    pub const YU12: Self = Self::new(*b"YU12");
    pub const YU16: Self = Self::new(*b"YU16");
    pub const YU24: Self = Self::new(*b"YU24");
    pub const YUYV: Self = Self::new(*b"YUYV");
    pub const YUVS: Self = Self::new(*b"yuvs");
    pub const HDYC: Self = Self::new(*b"HDYC");
    pub const UYVY_2VUY: Self = Self::new(*b"2vuy");
    pub const BA81: Self = Self::new(*b"BA81");
    pub const JPEG: Self = Self::new(*b"JPEG");
    pub const DMB1: Self = Self::new(*b"dmb1");
    pub const RGB3: Self = Self::new(*b"RGB3");
    pub const BGR3: Self = Self::new(*b"BGR3");
    pub const CM32: Self = Self::new(*b"\0\0\0\x20");
    pub const CM24: Self = Self::new(*b"\0\0\0\x18");
    pub const L555: Self = Self::new(*b"L555");
    pub const L565: Self = Self::new(*b"L565");
    pub const RGB5551: Self = Self::new(*b"5551");

    /// Resolve an alias to the code this crate dispatches on. Codes that are
    /// not aliases come back unchanged.
    pub const fn canonical(self) -> Self {
        const ALIASES: [(FourCc, FourCc); 18] = [
            (FourCc::IYUV, FourCc::I420),
            (FourCc::YU12, FourCc::I420),
            (FourCc::YU16, FourCc::I422),
            (FourCc::YU24, FourCc::I444),
            (FourCc::YUYV, FourCc::YUY2),
            (FourCc::YUVS, FourCc::YUY2),
            (FourCc::HDYC, FourCc::UYVY),
            (FourCc::UYVY_2VUY, FourCc::UYVY),
            (FourCc::BA81, FourCc::BGGR),
            (FourCc::JPEG, FourCc::MJPG),
            (FourCc::DMB1, FourCc::MJPG),
            (FourCc::RGB3, FourCc::RAW),
            (FourCc::BGR3, FourCc::RGB24),
            (FourCc::CM32, FourCc::BGRA),
            (FourCc::CM24, FourCc::RAW),
            (FourCc::L555, FourCc::ARGB1555),
            (FourCc::L565, FourCc::RGB565),
            (FourCc::RGB5551, FourCc::ARGB1555),
        ];
        let mut i = 0;
        while i < ALIASES.len() {
            if ALIASES[i].0.0 == self.0 {
                return ALIASES[i].1;
            }
            i += 1;
        }
        self
    }

    /// YV12, YV16 and YV24 store V before U.
    pub(crate) fn swaps_uv(self) -> bool {
        matches!(self, Self::YV12 | Self::YV16 | Self::YV24)
    }
}

impl core::fmt::Debug for FourCc {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let b = self.bytes();
        if b.iter().all(|c| c.is_ascii_graphic() || *c == b' ') {
            write!(f, "FourCc(\"{}{}{}{}\")", b[0] as char, b[1] as char, b[2] as char, b[3] as char)
        } else {
            write!(f, "FourCc({:#010x})", self.0)
        }
    }
}

/// The memory layouts this crate converts between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PixelFormat {
    I420,
    I422,
    I444,
    I411,
    I400,
    Nv12,
    Nv21,
    M420,
    Yuy2,
    Uyvy,
    Argb,
    Bgra,
    Abgr,
    Rgba,
    Rgb24,
    Raw,
    Rgb565,
    Argb1555,
    Argb4444,
    Bayer(BayerOrder),
}

impl PixelFormat {
    /// The format a code describes, after alias resolution. The YV variants
    /// map to their I counterparts; MJPG and unknown codes have no layout.
    pub fn from_fourcc(code: FourCc) -> Option<Self> {
        Some(match code.canonical() {
            FourCc::I420 | FourCc::YV12 => Self::I420,
            FourCc::I422 | FourCc::YV16 => Self::I422,
            FourCc::I444 | FourCc::YV24 => Self::I444,
            FourCc::I411 => Self::I411,
            FourCc::I400 => Self::I400,
            FourCc::NV12 => Self::Nv12,
            FourCc::NV21 => Self::Nv21,
            FourCc::M420 => Self::M420,
            FourCc::YUY2 => Self::Yuy2,
            FourCc::UYVY => Self::Uyvy,
            FourCc::ARGB => Self::Argb,
            FourCc::BGRA => Self::Bgra,
            FourCc::ABGR => Self::Abgr,
            FourCc::RGBA => Self::Rgba,
            FourCc::RGB24 => Self::Rgb24,
            FourCc::RAW => Self::Raw,
            FourCc::RGB565 => Self::Rgb565,
            FourCc::ARGB1555 => Self::Argb1555,
            FourCc::ARGB4444 => Self::Argb4444,
            FourCc::RGGB => Self::Bayer(BayerOrder::Rggb),
            FourCc::BGGR => Self::Bayer(BayerOrder::Bggr),
            FourCc::GRBG => Self::Bayer(BayerOrder::Grbg),
            FourCc::GBRG => Self::Bayer(BayerOrder::Gbrg),
            _ => return None,
        })
    }

    pub fn fourcc(self) -> FourCc {
        match self {
            Self::I420 => FourCc::I420,
            Self::I422 => FourCc::I422,
            Self::I444 => FourCc::I444,
            Self::I411 => FourCc::I411,
            Self::I400 => FourCc::I400,
            Self::Nv12 => FourCc::NV12,
            Self::Nv21 => FourCc::NV21,
            Self::M420 => FourCc::M420,
            Self::Yuy2 => FourCc::YUY2,
            Self::Uyvy => FourCc::UYVY,
            Self::Argb => FourCc::ARGB,
            Self::Bgra => FourCc::BGRA,
            Self::Abgr => FourCc::ABGR,
            Self::Rgba => FourCc::RGBA,
            Self::Rgb24 => FourCc::RGB24,
            Self::Raw => FourCc::RAW,
            Self::Rgb565 => FourCc::RGB565,
            Self::Argb1555 => FourCc::ARGB1555,
            Self::Argb4444 => FourCc::ARGB4444,
            Self::Bayer(order) => order.fourcc(),
        }
    }

    /// Bytes per pixel of the first (or only) plane.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::I420
            | Self::I422
            | Self::I444
            | Self::I411
            | Self::I400
            | Self::Nv12
            | Self::Nv21
            | Self::M420
            | Self::Bayer(_) => 1,
            Self::Yuy2 | Self::Uyvy | Self::Rgb565 | Self::Argb1555 | Self::Argb4444 => 2,
            Self::Rgb24 | Self::Raw => 3,
            Self::Argb | Self::Bgra | Self::Abgr | Self::Rgba => 4,
        }
    }
}

/// Cheap well-formedness check on a JPEG buffer: at least 64 bytes, a
/// start-of-image marker up front and an end-of-image marker after it.
pub fn validate_jpeg(sample: &[u8]) -> bool {
    if sample.len() < 64 || sample[..2] != [0xff, 0xd8] {
        return false;
    }
    sample[2..].windows(2).any(|w| w == [0xff, 0xd9])
}
