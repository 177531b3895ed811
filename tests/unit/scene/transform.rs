use super::*;
use crate::foundation::core::Point;

fn solid(w: u32, h: u32, px: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(w, h, image::Rgba(px))
}

#[test]
fn fit_to_height_preserves_aspect() {
    let img = solid(400, 300, [255, 0, 0, 255]);
    let out = fit_to_height(&img, 720);
    assert_eq!(out.dimensions(), (960, 720));

    let tall = solid(100, 400, [0, 0, 255, 255]);
    assert_eq!(fit_to_height(&tall, 720).dimensions(), (180, 720));
}

#[test]
fn cover_crops_wide_images_from_the_center() {
    let mut img = solid(1600, 720, [0, 0, 0, 255]);
    // Mark the column that should land at the left edge after a centered crop.
    for y in 0..720 {
        img.put_pixel(160, y, image::Rgba([255, 255, 255, 255]));
    }
    let out = cover_to_canvas(&img, Canvas::HD_720);
    assert_eq!(out.dimensions(), (1280, 720));
    assert_eq!(out.get_pixel(0, 10).0, [255, 255, 255, 255]);
    assert_eq!(out.get_pixel(1, 10).0, [0, 0, 0, 255]);
}

#[test]
fn cover_pads_narrow_images_with_transparency() {
    let img = solid(960, 720, [10, 20, 30, 255]);
    let out = cover_to_canvas(&img, Canvas::HD_720);
    assert_eq!(out.dimensions(), (1280, 720));
    assert_eq!(out.get_pixel(0, 0).0[3], 0);
    assert_eq!(out.get_pixel(159, 0).0[3], 0);
    assert_eq!(out.get_pixel(160, 0).0, [10, 20, 30, 255]);
    assert_eq!(out.get_pixel(1119, 719).0, [10, 20, 30, 255]);
    assert_eq!(out.get_pixel(1120, 0).0[3], 0);
}

#[test]
fn zoom_scale_is_continuous_and_clamped() {
    let z = ZoomRange::default();
    assert_eq!(z.scale_at(0.0), 1.0);
    assert!((z.scale_at(0.5) - 1.05).abs() < 1e-12);
    assert!((z.scale_at(1.0) - 1.1).abs() < 1e-12);
    assert!((z.scale_at(3.0) - 1.1).abs() < 1e-12);
    assert_eq!(z.scale_at(f64::NAN), 1.0);

    let mut prev = z.scale_at(0.0);
    for i in 1..=100 {
        let s = z.scale_at(f64::from(i) / 100.0);
        assert!(s > prev);
        prev = s;
    }
}

#[test]
fn ken_burns_keeps_center_fixed_and_scales_corners() {
    let canvas = Canvas::HD_720;
    let a = ken_burns_transform(0.0, canvas, ZoomRange::default());
    assert_eq!(a * Point::new(0.0, 0.0), Point::new(0.0, 0.0));

    let b = ken_burns_transform(1.0, canvas, ZoomRange::default());
    let center = b * canvas.center();
    assert!((center.x - 640.0).abs() < 1e-9 && (center.y - 360.0).abs() < 1e-9);
    let corner = b * Point::new(0.0, 0.0);
    assert!((corner.x + 64.0).abs() < 1e-9);
    assert!((corner.y + 36.0).abs() < 1e-9);
}

#[test]
fn prepare_background_outputs_canvas_sized_premul() {
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(solid(64, 48, [200, 100, 50, 255]))
        .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    let prepared = prepare_background(&buf, Canvas::HD_720).unwrap();
    assert_eq!((prepared.width, prepared.height), (1280, 720));
    assert_eq!(prepared.rgba8_premul.len(), Canvas::HD_720.rgba8_len());
    // 64x48 -> 960x720, padded by 160px on each side.
    assert_eq!(&prepared.rgba8_premul[..4], &[0, 0, 0, 0]);
    let mid = (360 * 1280 + 640) * 4;
    assert_eq!(&prepared.rgba8_premul[mid..mid + 4], &[200, 100, 50, 255]);
}
