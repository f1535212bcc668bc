use archmage::prelude::*;

// ===========================================================================
// ARM NEON: rite row implementations
//
// Same contract as the AVX2 kernels: return the units handled, leave the
// tail to the scalar kernel.
// ===========================================================================

#[rite]
pub(super) fn mirror_row_arm_v2(_token: Arm64V2Token, src: &[u8], dst: &mut [u8]) -> usize {
    let n = dst.len();
    let mut i = 0;
    while i + 16 <= n {
        let s: &[u8; 16] = src[n - i - 16..n - i].try_into().unwrap();
        let v = vrev64q_u8(vld1q_u8(s));
        let d: &mut [u8; 16] = (&mut dst[i..i + 16]).try_into().unwrap();
        vst1q_u8(d, vextq_u8::<8>(v, v));
        i += 16;
    }
    i
}

#[rite]
pub(super) fn argb_mirror_row_arm_v2(_token: Arm64V2Token, src: &[u8], dst: &mut [u8]) -> usize {
    let n = dst.len() / 4;
    let mut i = 0;
    while i + 4 <= n {
        let at = (n - i - 4) * 4;
        let s: &[u8; 16] = src[at..at + 16].try_into().unwrap();
        let v = vrev64q_u32(vreinterpretq_u32_u8(vld1q_u8(s)));
        let v = vreinterpretq_u8_u32(vextq_u32::<2>(v, v));
        let d: &mut [u8; 16] = (&mut dst[i * 4..i * 4 + 16]).try_into().unwrap();
        vst1q_u8(d, v);
        i += 4;
    }
    i
}

#[rite]
pub(super) fn interpolate_row_arm_v2(
    _token: Arm64V2Token,
    dst: &mut [u8],
    src0: &[u8],
    src1: &[u8],
    fraction: u8,
) -> usize {
    let f1 = vdupq_n_u16(fraction as u16);
    let f0 = vdupq_n_u16(256 - fraction as u16);
    let round = vdupq_n_u16(128);
    let n = dst.len();
    let mut i = 0;
    while i + 16 <= n {
        let a: &[u8; 16] = src0[i..i + 16].try_into().unwrap();
        let b: &[u8; 16] = src1[i..i + 16].try_into().unwrap();
        let a = vld1q_u8(a);
        let b = vld1q_u8(b);
        let lo = vmlaq_u16(vmulq_u16(vmovl_u8(vget_low_u8(a)), f0), vmovl_u8(vget_low_u8(b)), f1);
        let hi = vmlaq_u16(vmulq_u16(vmovl_u8(vget_high_u8(a)), f0), vmovl_u8(vget_high_u8(b)), f1);
        let out = vcombine_u8(
            vshrn_n_u16::<8>(vaddq_u16(lo, round)),
            vshrn_n_u16::<8>(vaddq_u16(hi, round)),
        );
        let d: &mut [u8; 16] = (&mut dst[i..i + 16]).try_into().unwrap();
        vst1q_u8(d, out);
        i += 16;
    }
    i
}

#[rite]
pub(super) fn scale_down2_box_row_arm_v2(
    _token: Arm64V2Token,
    src0: &[u8],
    src1: &[u8],
    dst: &mut [u8],
) -> usize {
    let n = dst.len();
    let mut i = 0;
    while i + 16 <= n {
        let s = 2 * i;
        let a0: &[u8; 16] = src0[s..s + 16].try_into().unwrap();
        let a1: &[u8; 16] = src0[s + 16..s + 32].try_into().unwrap();
        let b0: &[u8; 16] = src1[s..s + 16].try_into().unwrap();
        let b1: &[u8; 16] = src1[s + 16..s + 32].try_into().unwrap();
        let lo = vaddq_u16(
            vpaddlq_u8(vld1q_u8(a0)),
            vpaddlq_u8(vld1q_u8(b0)),
        );
        let hi = vaddq_u16(
            vpaddlq_u8(vld1q_u8(a1)),
            vpaddlq_u8(vld1q_u8(b1)),
        );
        // Rounding narrow: (sum + 2) >> 2.
        let out = vcombine_u8(vrshrn_n_u16::<2>(lo), vrshrn_n_u16::<2>(hi));
        let d: &mut [u8; 16] = (&mut dst[i..i + 16]).try_into().unwrap();
        vst1q_u8(d, out);
        i += 16;
    }
    i
}

#[rite]
pub(super) fn argb_to_rgb565_row_arm_v2(_token: Arm64V2Token, src: &[u8], dst: &mut [u8]) -> usize {
    let mask_b = vdupq_n_u32(0x001f);
    let mask_g = vdupq_n_u32(0x07e0);
    let mask_r = vdupq_n_u32(0xf800);
    let n = src.len() / 4;
    let mut i = 0;
    while i + 8 <= n {
        let a: &[u8; 16] = src[i * 4..i * 4 + 16].try_into().unwrap();
        let b: &[u8; 16] = src[i * 4 + 16..i * 4 + 32].try_into().unwrap();
        let mut words = [vdupq_n_u32(0); 2];
        for (w, s) in words.iter_mut().zip([a, b]) {
            let v: uint32x4_t = vreinterpretq_u32_u8(vld1q_u8(s));
            *w = vorrq_u32(
                vorrq_u32(
                    vandq_u32(vshrq_n_u32::<3>(v), mask_b),
                    vandq_u32(vshrq_n_u32::<5>(v), mask_g),
                ),
                vandq_u32(vshrq_n_u32::<8>(v), mask_r),
            );
        }
        let out = vreinterpretq_u8_u16(vcombine_u16(vmovn_u32(words[0]), vmovn_u32(words[1])));
        let d: &mut [u8; 16] = (&mut dst[i * 2..i * 2 + 16]).try_into().unwrap();
        vst1q_u8(d, out);
        i += 8;
    }
    i
}

// ===========================================================================
// ARM arcane wrappers
// ===========================================================================

#[arcane]
pub(super) fn mirror_impl_arm_v2(t: Arm64V2Token, s: &[u8], d: &mut [u8]) -> usize {
    mirror_row_arm_v2(t, s, d)
}
#[arcane]
pub(super) fn argb_mirror_impl_arm_v2(t: Arm64V2Token, s: &[u8], d: &mut [u8]) -> usize {
    argb_mirror_row_arm_v2(t, s, d)
}
#[arcane]
pub(super) fn interpolate_impl_arm_v2(
    t: Arm64V2Token,
    d: &mut [u8],
    s0: &[u8],
    s1: &[u8],
    f: u8,
) -> usize {
    interpolate_row_arm_v2(t, d, s0, s1, f)
}
#[arcane]
pub(super) fn scale_down2_box_impl_arm_v2(
    t: Arm64V2Token,
    s0: &[u8],
    s1: &[u8],
    d: &mut [u8],
) -> usize {
    scale_down2_box_row_arm_v2(t, s0, s1, d)
}
#[arcane]
pub(super) fn argb_to_rgb565_impl_arm_v2(t: Arm64V2Token, s: &[u8], d: &mut [u8]) -> usize {
    argb_to_rgb565_row_arm_v2(t, s, d)
}
