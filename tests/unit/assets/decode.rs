use std::io::Cursor;

use super::*;

fn png_bytes(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_png_dimensions_and_premul() {
    let decoded = decode_image(&png_bytes(2, 1, [100, 50, 200, 128])).unwrap();
    assert_eq!((decoded.width, decoded.height), (2, 1));
    let expected = [
        ((100u16 * 128 + 127) / 255) as u8,
        ((50u16 * 128 + 127) / 255) as u8,
        ((200u16 * 128 + 127) / 255) as u8,
        128u8,
    ];
    assert_eq!(&decoded.rgba8_premul[..4], &expected);
    assert_eq!(&decoded.rgba8_premul[4..], &expected);
}

#[test]
fn fully_transparent_pixels_drop_color() {
    let decoded = decode_image(&png_bytes(1, 1, [255, 255, 255, 0])).unwrap();
    assert_eq!(decoded.rgba8_premul.as_slice(), &[0, 0, 0, 0]);
}

#[test]
fn garbage_bytes_fail() {
    assert!(decode_image(b"not an image").is_err());
}
