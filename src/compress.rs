//! # Single-Image Adaptive Compressor
//!
//! Normalizes an [`ImageSource`] into raster bytes, fits it within the
//! configured pixel box (never upscaling), flattens any transparency onto an
//! opaque white background, and re-encodes as JPEG. If a size budget is set,
//! the encode quality is reduced multiplicatively (×0.8 per attempt, floor
//! 0.1) for at most [`MAX_QUALITY_ATTEMPTS`] re-encodes.
//!
//! The size budget is best effort by contract: when the attempt cap is
//! reached the last encode is returned even if it is still over budget, so
//! the loop terminates in finite time regardless of whether the target is
//! reachable. Size is measured through the same data-URI length proxy the
//! storage layer sees (`len * 0.75 / 1024`), not the raw byte count.

use fast_image_resize as fir;
use fir::images::{TypedImage, TypedImageRef};
use fir::pixels::U8x3;
use fir::{ResizeOptions, Resizer};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, GenericImageView, RgbImage};
use log::{debug, info};

use crate::config::{CompressionOptions, MAX_QUALITY_ATTEMPTS, QUALITY_FLOOR, QUALITY_STEP};
use crate::error::{MediaError, MediaResult};
use crate::source::{self, DataUriPayload, ImageSource};

/// MIME type every re-encoded image carries, regardless of input format.
pub const OUTPUT_MIME: &str = "image/jpeg";

/// A re-encoded raster ready for upload.
#[derive(Debug, Clone)]
pub struct CompressedImage {
    /// JPEG bytes.
    pub bytes: Vec<u8>,
    /// Always [`OUTPUT_MIME`].
    pub mime: &'static str,
    /// Output width in pixels (within the configured bound).
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Quality the final encode ran at, in `[0, 1]`.
    pub quality: f32,
    /// Re-encode attempts the reduction loop spent (0 if the first encode
    /// already met the budget or no budget was set).
    pub attempts: u32,
}

impl CompressedImage {
    /// Inline data-URI form, as handed onward to the remote store.
    pub fn to_data_uri(&self) -> String {
        source::to_data_uri(self.mime, &self.bytes)
    }

    /// Size through the data-URI proxy the budget loop measures with.
    pub fn estimated_size_kb(&self) -> f64 {
        source::estimated_size_kb(&self.to_data_uri())
    }
}

/// Compressor output.
#[derive(Debug, Clone)]
pub enum ImageResult {
    /// The image was decoded, resized, and re-encoded as JPEG.
    Jpeg(CompressedImage),
    /// The source was an inline encoding this pipeline does not recognize as
    /// a redecodable raster (e.g. percent-encoded SVG); returned verbatim
    /// rather than double-processed.
    Passthrough(String),
}

impl ImageResult {
    /// Inline data-URI form of the result.
    pub fn to_data_uri(&self) -> String {
        match self {
            ImageResult::Jpeg(img) => img.to_data_uri(),
            ImageResult::Passthrough(uri) => uri.clone(),
        }
    }
}

/// Compress one image source under the given options.
///
/// # Errors
///
/// - [`MediaError::InvalidOptions`] before any decode work if the options
///   are rejected.
/// - [`MediaError::Decode`] if the bytes cannot be interpreted as a raster
///   image.
/// - [`MediaError::Fetch`] / [`MediaError::Timeout`] if a remote source
///   cannot be retrieved.
pub async fn compress(
    source: ImageSource,
    options: &CompressionOptions,
) -> MediaResult<ImageResult> {
    options.validate()?;

    let bytes = match source {
        ImageSource::Bytes { data, .. } => data,
        ImageSource::RemoteUri(url) => source::fetch_remote(&url, options.fetch_timeout).await?,
        ImageSource::DataUri(uri) => match source::parse_data_uri(&uri)? {
            DataUriPayload::Base64 { data, .. } => data,
            DataUriPayload::Opaque => {
                debug!("opaque inline encoding, passing through unchanged");
                return Ok(ImageResult::Passthrough(uri));
            }
        },
    };

    let decoded = image::load_from_memory(&bytes).map_err(|e| MediaError::decode(e.to_string()))?;
    let (src_w, src_h) = decoded.dimensions();
    let (out_w, out_h) = fit_within(src_w, src_h, options.max_width, options.max_height);
    debug!("decoded {src_w}x{src_h}, target {out_w}x{out_h}");

    // Flatten first so the resample runs on opaque RGB; transparency must not
    // bleed artifacts into a format without alpha support.
    let flat = flatten_onto_white(&decoded);
    let raster = if (out_w, out_h) == (src_w, src_h) {
        flat
    } else {
        resize_rgb(&flat, out_w, out_h)?
    };

    let mut quality = options.quality;
    let mut encoded = encode_jpeg(&raster, quality)?;
    let mut attempts = 0u32;

    if let Some(max_kb) = options.max_size_kb {
        let budget = max_kb as f64;
        while attempts < MAX_QUALITY_ATTEMPTS && measured_kb(&encoded) > budget {
            quality = (quality * QUALITY_STEP).max(QUALITY_FLOOR);
            encoded = encode_jpeg(&raster, quality)?;
            attempts += 1;
            debug!(
                "attempt {attempts}: quality {quality:.3}, {:.1} KB",
                measured_kb(&encoded)
            );
        }
        if measured_kb(&encoded) > budget {
            info!(
                "size budget of {max_kb} KB not reachable, returning last encode \
                 ({:.1} KB at quality {quality:.2})",
                measured_kb(&encoded)
            );
        }
    }

    Ok(ImageResult::Jpeg(CompressedImage {
        bytes: encoded,
        mime: OUTPUT_MIME,
        width: out_w,
        height: out_h,
        quality,
        attempts,
    }))
}

/// Size of the encoded bytes through the data-URI length proxy.
fn measured_kb(encoded: &[u8]) -> f64 {
    source::estimated_size_kb(&source::to_data_uri(OUTPUT_MIME, encoded))
}

/// Fit `(w, h)` within `(max_w, max_h)` preserving aspect ratio.
///
/// The larger relative dimension lands exactly on its bound; dimensions
/// already within bounds are returned unchanged (no upscaling, ever).
pub fn fit_within(w: u32, h: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    let (wf, hf) = (w as f64, h as f64);
    let s = (max_w as f64 / wf).min(max_h as f64 / hf).min(1.0);
    if s >= 1.0 {
        return (w, h);
    }
    (
        ((wf * s).round() as u32).max(1),
        ((hf * s).round() as u32).max(1),
    )
}

/// Composite the image over an opaque white background, yielding RGB8.
///
/// Already-opaque images convert without blending; anything carrying alpha
/// is blended per channel against white.
fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    let rgba = img.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (dst, src) in out.pixels_mut().zip(rgba.pixels()) {
        let a = src[3] as u16;
        for c in 0..3 {
            // src * a + white * (1 - a), rounded.
            let v = (src[c] as u16 * a + 255 * (255 - a) + 127) / 255;
            dst[c] = v as u8;
        }
    }
    out
}

/// Lanczos3 resample of a tightly-packed RGB8 raster.
fn resize_rgb(src: &RgbImage, out_w: u32, out_h: u32) -> MediaResult<RgbImage> {
    let src_view = TypedImageRef::<U8x3>::from_buffer(src.width(), src.height(), src.as_raw())
        .map_err(|e| MediaError::Resize {
            reason: e.to_string(),
        })?;

    let mut dst_buf = vec![0u8; out_w as usize * out_h as usize * 3];
    let mut dst_view =
        TypedImage::<U8x3>::from_buffer(out_w, out_h, &mut dst_buf).map_err(|e| {
            MediaError::Resize {
                reason: e.to_string(),
            }
        })?;

    let opts = ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::Lanczos3))
        .use_alpha(false);

    let mut resizer = Resizer::new();
    resizer
        .resize_typed(&src_view, &mut dst_view, &opts)
        .map_err(|e| MediaError::Resize {
            reason: e.to_string(),
        })?;

    RgbImage::from_raw(out_w, out_h, dst_buf).ok_or_else(|| MediaError::Resize {
        reason: "resized buffer has unexpected length".to_string(),
    })
}

/// Encode RGB8 as baseline JPEG at a `[0, 1]` quality.
fn encode_jpeg(raster: &RgbImage, quality: f32) -> MediaResult<Vec<u8>> {
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, jpeg_quality(quality));
    encoder
        .encode(
            raster.as_raw(),
            raster.width(),
            raster.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(MediaError::Encode)?;
    Ok(buf)
}

/// Map a `[0, 1]` quality onto the encoder's 1–100 scale.
fn jpeg_quality(quality: f32) -> u8 {
    ((quality * 100.0).round() as i32).clamp(1, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_within_keeps_small_images_unchanged() {
        assert_eq!(fit_within(640, 480, 800, 600), (640, 480));
        assert_eq!(fit_within(800, 600, 800, 600), (800, 600));
        assert_eq!(fit_within(1, 1, 800, 600), (1, 1));
    }

    #[test]
    fn test_fit_within_lands_exactly_on_the_binding_dimension() {
        // 4000x3000 with an 800x600 box: scale = min(0.2, 0.2) = 0.2.
        assert_eq!(fit_within(4000, 3000, 800, 600), (800, 600));
        // Width-bound landscape.
        assert_eq!(fit_within(1600, 600, 800, 600), (800, 300));
        // Height-bound portrait.
        assert_eq!(fit_within(600, 1200, 800, 600), (300, 600));
    }

    #[test]
    fn test_fit_within_never_upscales() {
        for &(w, h) in &[(10u32, 10u32), (799, 599), (800, 1), (1, 600)] {
            let (ow, oh) = fit_within(w, h, 800, 600);
            assert!(ow as u64 * oh as u64 <= w as u64 * h as u64);
        }
    }

    #[test]
    fn test_fit_within_preserves_aspect_ratio_within_rounding() {
        let (ow, oh) = fit_within(3008, 2000, 800, 600);
        let src_ratio = 3008.0 / 2000.0;
        let out_ratio = ow as f64 / oh as f64;
        assert!((src_ratio - out_ratio).abs() < 0.01);
    }

    #[test]
    fn test_flatten_blends_alpha_over_white() {
        let mut rgba = image::RgbaImage::new(2, 1);
        rgba.put_pixel(0, 0, image::Rgba([0, 0, 0, 0])); // fully transparent
        rgba.put_pixel(1, 0, image::Rgba([100, 50, 200, 255])); // opaque
        let flat = flatten_onto_white(&DynamicImage::ImageRgba8(rgba));
        assert_eq!(flat.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(flat.get_pixel(1, 0).0, [100, 50, 200]);
    }

    #[test]
    fn test_flatten_half_alpha_rounds_against_white() {
        let mut rgba = image::RgbaImage::new(1, 1);
        rgba.put_pixel(0, 0, image::Rgba([0, 0, 0, 128]));
        let flat = flatten_onto_white(&DynamicImage::ImageRgba8(rgba));
        // 0 * 128/255 + 255 * 127/255 = 127.0 → 127
        assert_eq!(flat.get_pixel(0, 0).0, [127, 127, 127]);
    }

    #[test]
    fn test_flatten_covers_every_alpha_carrying_variant() {
        // Grayscale-with-alpha must blend like RGBA does.
        let la = image::GrayAlphaImage::from_pixel(1, 1, image::LumaA([0, 0]));
        let flat = flatten_onto_white(&DynamicImage::ImageLumaA8(la));
        assert_eq!(flat.get_pixel(0, 0).0, [255, 255, 255]);

        // Alpha-free variants convert directly, no blending against white.
        let gray = image::GrayImage::from_pixel(1, 1, image::Luma([7]));
        let flat = flatten_onto_white(&DynamicImage::ImageLuma8(gray));
        assert_eq!(flat.get_pixel(0, 0).0, [7, 7, 7]);

        let gray16 = image::ImageBuffer::from_pixel(1, 1, image::Luma([0u16]));
        let flat = flatten_onto_white(&DynamicImage::ImageLuma16(gray16));
        assert_eq!(flat.get_pixel(0, 0).0, [0, 0, 0]);
    }

    #[test]
    fn test_jpeg_quality_mapping() {
        assert_eq!(jpeg_quality(0.7), 70);
        assert_eq!(jpeg_quality(1.0), 100);
        assert_eq!(jpeg_quality(0.1), 10);
        // Floor of the encoder scale, never 0.
        assert_eq!(jpeg_quality(0.0), 1);
    }

    #[test]
    fn test_quality_ladder_compounds_and_floors() {
        let mut q = 0.7f32;
        let mut ladder = Vec::new();
        for _ in 0..MAX_QUALITY_ATTEMPTS {
            q = (q * QUALITY_STEP).max(QUALITY_FLOOR);
            ladder.push(q);
        }
        // q0 * 0.8^n, compounding, not restarting from q0.
        assert!((ladder[0] - 0.56).abs() < 1e-6);
        assert!((ladder[1] - 0.448).abs() < 1e-6);
        assert!((ladder[4] - 0.7 * 0.8f32.powi(5)).abs() < 1e-6);
        for w in ladder.windows(2) {
            assert!(w[1] < w[0] || w[0] == QUALITY_FLOOR);
        }
    }
}
