// ---------------------------------------------------------------------------
// Fixed-point color math shared by the scalar kernels and the SIMD ones.
//
// YUV -> RGB uses 14-bit coefficients: each channel is
// `(y_term + chroma_terms + 8192) >> 14`, clamped to 0..=255. RGB -> YUV uses
// the 8-bit BT.601 studio-swing matrix and the 7/8-bit full-range ("J")
// matrix with the rounding bias folded into the constant term. The SIMD
// kernels reproduce these exactly, so these functions are the reference.
// ---------------------------------------------------------------------------

/// Coefficients for one YUV -> RGB matrix, scaled by 2^14.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct YuvConstants {
    /// Luma gain.
    pub yg: i32,
    /// Black level subtracted from Y before the gain.
    pub y_bias: i32,
    pub ub: i32,
    pub ug: i32,
    pub vg: i32,
    pub vr: i32,
}

/// BT.601, Y in 16..=235 and chroma in 16..=240.
pub(crate) const BT601: YuvConstants = YuvConstants {
    yg: 19077,
    y_bias: 16,
    ub: 33050,
    ug: 6419,
    vg: 13320,
    vr: 26149,
};

/// BT.601 full range, as used by JPEG.
pub(crate) const JPEG: YuvConstants = YuvConstants {
    yg: 16384,
    y_bias: 0,
    ub: 29032,
    ug: 5638,
    vg: 11700,
    vr: 22970,
};

#[inline(always)]
pub(crate) fn clamp255(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// One YUV sample to `[b, g, r]`.
#[inline(always)]
pub(crate) fn yuv_to_bgr(y: u8, u: u8, v: u8, c: &YuvConstants) -> [u8; 3] {
    let y1 = (y as i32 - c.y_bias) * c.yg;
    let u = u as i32 - 128;
    let v = v as i32 - 128;
    [
        clamp255((y1 + c.ub * u + 8192) >> 14),
        clamp255((y1 - c.ug * u - c.vg * v + 8192) >> 14),
        clamp255((y1 + c.vr * v + 8192) >> 14),
    ]
}

// ===========================================================================
// RGB -> YUV
// ===========================================================================

#[inline(always)]
pub(crate) fn rgb_to_y(r: u8, g: u8, b: u8) -> u8 {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    (((66 * r + 129 * g + 25 * b + 128) >> 8) + 16) as u8
}

#[inline(always)]
pub(crate) fn rgb_to_u(r: u8, g: u8, b: u8) -> u8 {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    (((-38 * r - 74 * g + 112 * b + 128) >> 8) + 128) as u8
}

#[inline(always)]
pub(crate) fn rgb_to_v(r: u8, g: u8, b: u8) -> u8 {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    (((112 * r - 94 * g - 18 * b + 128) >> 8) + 128) as u8
}

#[inline(always)]
pub(crate) fn rgb_to_yj(r: u8, g: u8, b: u8) -> u8 {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    ((38 * r + 75 * g + 15 * b + 64) >> 7) as u8
}

#[inline(always)]
pub(crate) fn rgb_to_uj(r: u8, g: u8, b: u8) -> u8 {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    ((127 * b - 84 * g - 43 * r + 0x8080) >> 8) as u8
}

#[inline(always)]
pub(crate) fn rgb_to_vj(r: u8, g: u8, b: u8) -> u8 {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    ((127 * r - 107 * g - 20 * b + 0x8080) >> 8) as u8
}

/// Which RGB -> YUV matrix a from-ARGB conversion applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Matrix {
    Bt601,
    Jpeg,
}

impl Matrix {
    #[inline(always)]
    pub(crate) fn y(self, r: u8, g: u8, b: u8) -> u8 {
        match self {
            Matrix::Bt601 => rgb_to_y(r, g, b),
            Matrix::Jpeg => rgb_to_yj(r, g, b),
        }
    }

    #[inline(always)]
    pub(crate) fn uv(self, r: u8, g: u8, b: u8) -> (u8, u8) {
        match self {
            Matrix::Bt601 => (rgb_to_u(r, g, b), rgb_to_v(r, g, b)),
            Matrix::Jpeg => (rgb_to_uj(r, g, b), rgb_to_vj(r, g, b)),
        }
    }

    pub(crate) fn constants(self) -> &'static YuvConstants {
        match self {
            Matrix::Bt601 => &BT601,
            Matrix::Jpeg => &JPEG,
        }
    }
}

// ===========================================================================
// 16-bit packed RGB
// ===========================================================================

#[inline(always)]
pub(crate) fn pack_rgb565(b: u8, g: u8, r: u8) -> u16 {
    (b as u16 >> 3) | ((g as u16 >> 2) << 5) | ((r as u16 >> 3) << 11)
}

#[inline(always)]
pub(crate) fn pack_argb1555(b: u8, g: u8, r: u8, a: u8) -> u16 {
    (b as u16 >> 3) | ((g as u16 >> 3) << 5) | ((r as u16 >> 3) << 10) | ((a as u16 >> 7) << 15)
}

#[inline(always)]
pub(crate) fn pack_argb4444(b: u8, g: u8, r: u8, a: u8) -> u16 {
    (b as u16 >> 4) | ((g as u16 >> 4) << 4) | ((r as u16 >> 4) << 8) | ((a as u16 >> 4) << 12)
}

#[inline(always)]
fn expand5(v: u16) -> u8 {
    let v = (v & 0x1f) as u8;
    (v << 3) | (v >> 2)
}

#[inline(always)]
fn expand6(v: u16) -> u8 {
    let v = (v & 0x3f) as u8;
    (v << 2) | (v >> 4)
}

#[inline(always)]
fn expand4(v: u16) -> u8 {
    let v = (v & 0xf) as u8;
    (v << 4) | v
}

/// `[b, g, r, a]` from an RGB565 word.
#[inline(always)]
pub(crate) fn unpack_rgb565(p: u16) -> [u8; 4] {
    [expand5(p), expand6(p >> 5), expand5(p >> 11), 255]
}

#[inline(always)]
pub(crate) fn unpack_argb1555(p: u16) -> [u8; 4] {
    let a = if p & 0x8000 != 0 { 255 } else { 0 };
    [expand5(p), expand5(p >> 5), expand5(p >> 10), a]
}

#[inline(always)]
pub(crate) fn unpack_argb4444(p: u16) -> [u8; 4] {
    [expand4(p), expand4(p >> 4), expand4(p >> 8), expand4(p >> 12)]
}
