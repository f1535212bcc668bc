//! Validates the code examples from README.md compile and behave correctly.

#[test]
fn readme_converting() {
    use tailor::{argb_to_i420, i420_to_argb};

    let (w, h) = (64usize, 48usize);
    let argb = vec![0x80u8; w * h * 4];
    let (mut y, mut u, mut v) = (vec![0u8; w * h], vec![0u8; 32 * 24], vec![0u8; 32 * 24]);
    argb_to_i420(&argb, w * 4, &mut y, w, &mut u, 32, &mut v, 32, w, h as i32).unwrap();

    let mut back = vec![0u8; w * h * 4];
    i420_to_argb(&y, w, &u, 32, &v, 32, &mut back, w * 4, w, h as i32).unwrap();
    for px in back.chunks_exact(4) {
        assert!(px[0].abs_diff(0x80) <= 3, "{px:?}");
        assert_eq!((px[0], px[1], px[3]), (px[2], px[2], 255));
    }
}

#[test]
fn readme_fourcc() {
    use tailor::{FourCc, convert_to_argb};

    let yuy2 = vec![128u8; 8 * 2 * 2];
    let mut argb = vec![0u8; 8 * 2 * 4];
    convert_to_argb(&yuy2, 0, FourCc::YUY2, &mut argb, 0, 8, 2).unwrap();
    assert!(argb.chunks_exact(4).all(|p| p == &argb[..4] && p[3] == 255));
}

#[test]
fn readme_scale_and_rotate() {
    use tailor::{FilterMode, RotationMode, i420_scale, rotate_plane};

    let src = vec![16u8; 640 * 480 + 2 * 320 * 240];
    let (sy, rest) = src.split_at(640 * 480);
    let (su, sv) = rest.split_at(320 * 240);
    let (mut y, mut u, mut v) = (vec![0u8; 320 * 240], vec![0u8; 160 * 120], vec![0u8; 160 * 120]);
    i420_scale(
        sy, 640, su, 320, sv, 320, 640, 480,
        &mut y, 320, &mut u, 160, &mut v, 160, 320, 240,
        FilterMode::Box,
    )
    .unwrap();
    assert!(y.iter().chain(&u).chain(&v).all(|&b| b == 16));

    let mut turned = vec![0u8; 320 * 240];
    rotate_plane(&y, 320, &mut turned, 240, 320, 240, RotationMode::Rotate90).unwrap();
    assert!(turned.iter().all(|&b| b == 16));
}

#[test]
fn rgb565_golden_checksum() {
    let mut argb = [0u8; 256 * 4];
    for (i, px) in argb.chunks_exact_mut(4).enumerate() {
        px.fill(i as u8);
    }
    let mut rgb565 = [0u8; 256 * 2];
    tailor::argb_to_rgb565(&argb, 256 * 4, &mut rgb565, 256 * 2, 256, 1).unwrap();
    assert_eq!(tailor::hash_djb2(&rgb565, 5381), 610_919_429);
}

#[test]
fn describe_acceleration_names_an_instruction_set() {
    let s = tailor::cpu::describe_acceleration();
    assert!(s.contains("instruction-set:"), "{s}");
    assert!(s.ends_with('}'));
}

#[cfg(feature = "rgb")]
#[test]
fn readme_typed() {
    use rgb::{Bgra, Rgb};
    use tailor::typed;

    let src = vec![Rgb::new(255u8, 0, 128); 4 * 2];
    let mut dst = vec![Bgra::default(); 4 * 2];
    typed::rgb_to_bgra(&src, &mut dst, 4, 2).unwrap();
    assert_eq!(dst[0], Bgra { b: 128, g: 0, r: 255, a: 255 });
}

#[cfg(feature = "imgref")]
#[test]
fn readme_imgref() {
    use ::imgref::ImgVec;
    use rgb::Bgra;
    use tailor::{FilterMode, RotationMode, img};

    let frame = ImgVec::new(vec![Bgra { b: 10u8, g: 20, r: 30, a: 255 }; 640 * 480], 640, 480);
    let thumb = img::scale(frame.as_ref(), 160, 120, FilterMode::Bilinear).unwrap();
    let portrait = img::rotate(thumb.as_ref(), RotationMode::Rotate270).unwrap();
    assert_eq!((portrait.width(), portrait.height()), (120, 160));
    assert!(portrait.pixels().all(|p| p == Bgra { b: 10, g: 20, r: 30, a: 255 }));
}
