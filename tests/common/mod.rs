//! Shared helpers for building synthetic images in integration tests.

#![allow(dead_code)]

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};

/// Solid-color RGB image encoded as PNG.
pub fn solid_png(w: u32, h: u32, rgb: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(w, h, image::Rgb(rgb));
    encode_png(&DynamicImage::ImageRgb8(img))
}

/// RGBA PNG that is fully transparent except for an opaque center block.
pub fn transparent_border_png(w: u32, h: u32, rgb: [u8; 3]) -> Vec<u8> {
    let mut img = RgbaImage::from_pixel(w, h, image::Rgba([0, 0, 0, 0]));
    for y in h / 4..h * 3 / 4 {
        for x in w / 4..w * 3 / 4 {
            img.put_pixel(x, y, image::Rgba([rgb[0], rgb[1], rgb[2], 255]));
        }
    }
    encode_png(&DynamicImage::ImageRgba8(img))
}

/// Pseudo-random noise PNG; noise is effectively incompressible, so the
/// encoded size tracks the pixel count no matter the JPEG quality.
pub fn noise_png(w: u32, h: u32) -> Vec<u8> {
    let mut state = 0x2545f491u32;
    let mut img = RgbImage::new(w, h);
    for px in img.pixels_mut() {
        for c in 0..3 {
            // xorshift32, deterministic across runs
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            px[c] = (state >> 24) as u8;
        }
    }
    encode_png(&DynamicImage::ImageRgb8(img))
}

pub fn encode_png(img: &DynamicImage) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("png encode");
    buf
}

pub fn decode_jpeg(bytes: &[u8]) -> RgbImage {
    image::load_from_memory(bytes).expect("jpeg decode").to_rgb8()
}

/// JPEG start-of-image marker.
pub fn is_jpeg(bytes: &[u8]) -> bool {
    bytes.starts_with(&[0xff, 0xd8])
}
