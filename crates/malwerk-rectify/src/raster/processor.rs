// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster processor — power-of-two downscaling and encoding of rectified pages
// and diagnostic images. Operates on in-memory images using the `image` crate.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageBuffer, ImageFormat, Pixel, RgbaImage};
use malwerk_core::error::MalwerkError;
use malwerk_core::types::EncodedTexture;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

/// Raster pipeline operating on a single in-memory image.
///
/// Each transformation consumes `self` and returns a new `RasterProcessor`,
/// enabling method chaining.
///
/// ```ignore
/// let jpeg = RasterProcessor::from_dynamic(page)
///     .fit_pow2(1024)
///     .to_jpeg_bytes(95)?;
/// ```
pub struct RasterProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl RasterProcessor {
    // -- Construction ---------------------------------------------------------

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    // -- Transformations ------------------------------------------------------

    /// Halve the image until its longer side is at most `max_dimension`.
    #[instrument(skip(self), fields(max_dimension))]
    pub fn fit_pow2(self, max_dimension: u32) -> Self {
        let divisor = pow2_divisor(self.image.width(), self.image.height(), max_dimension);
        if divisor == 1 {
            return self;
        }
        let (w, h) = scaled_dimensions(self.image.width(), self.image.height(), divisor);
        info!(
            from_w = self.image.width(),
            from_h = self.image.height(),
            to_w = w,
            to_h = h,
            "Downscaling by power of two"
        );
        Self {
            image: self.image.resize_exact(w, h, FilterType::Triangle),
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, MalwerkError> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| MalwerkError::ImageError(format!("PNG encoding failed: {}", err)))?;
        Ok(buffer)
    }

    /// Encode the current image as JPEG bytes with the given quality (1-100).
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>, MalwerkError> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
        rgb.write_with_encoder(encoder)
            .map_err(|err| MalwerkError::ImageError(format!("JPEG encoding failed: {}", err)))?;
        Ok(buffer)
    }
}

/// Smallest power of two that brings the longer side of a `width` x `height`
/// image down to `max_dimension` or below.
pub fn pow2_divisor(width: u32, height: u32, max_dimension: u32) -> u32 {
    let mut longer = width.max(height);
    let mut divisor = 1u32;
    while longer > max_dimension.max(1) {
        longer /= 2;
        divisor = divisor.saturating_mul(2);
    }
    divisor
}

fn scaled_dimensions(width: u32, height: u32, divisor: u32) -> (u32, u32) {
    ((width / divisor).max(1), (height / divisor).max(1))
}

/// Downscale any image buffer by the power of two chosen by [`pow2_divisor`],
/// using a triangle filter so every output pixel averages its source area.
pub fn fit_pow2<I>(
    image: &I,
    max_dimension: u32,
) -> ImageBuffer<I::Pixel, Vec<<I::Pixel as Pixel>::Subpixel>>
where
    I: GenericImageView,
    I::Pixel: 'static,
    <I::Pixel as Pixel>::Subpixel: 'static,
{
    let (width, height) = image.dimensions();
    let divisor = pow2_divisor(width, height, max_dimension);
    let (w, h) = scaled_dimensions(width, height, divisor);
    image::imageops::resize(image, w, h, FilterType::Triangle)
}

/// Prepare a rectified page for texture upload: fit it within
/// `max_dimension` by power-of-two halving, then JPEG-encode it.
#[instrument(skip(page), fields(width = page.width(), height = page.height()))]
pub fn encode_texture(
    page: &RgbaImage,
    max_dimension: u32,
    quality: u8,
) -> Result<EncodedTexture, MalwerkError> {
    let processor = RasterProcessor::from_dynamic(DynamicImage::ImageRgba8(page.clone()))
        .fit_pow2(max_dimension);
    let (width, height) = (processor.width(), processor.height());
    let bytes = processor.to_jpeg_bytes(quality)?;
    let digest = hex::encode(Sha256::digest(&bytes));
    debug!(width, height, bytes = bytes.len(), %digest, "Texture encoded");
    Ok(EncodedTexture {
        bytes,
        mime_type: "image/jpeg",
        width,
        height,
        digest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgba};

    #[test]
    fn divisor_halves_until_within_bound() {
        assert_eq!(pow2_divisor(640, 480, 640), 1);
        assert_eq!(pow2_divisor(1280, 720, 640), 2);
        assert_eq!(pow2_divisor(1920, 1080, 640), 4);
        assert_eq!(pow2_divisor(4032, 3024, 1024), 4);
    }

    #[test]
    fn fit_pow2_floors_dimensions() {
        let img = GrayImage::from_pixel(1921, 1081, Luma([7u8]));
        let fitted = fit_pow2(&img, 640);
        assert_eq!(fitted.dimensions(), (480, 270));
        assert_eq!(fitted.get_pixel(10, 10).0[0], 7);
    }

    #[test]
    fn fit_pow2_averages_fine_detail() {
        // A one-pixel checkerboard must not alias into solid black or white.
        let img = GrayImage::from_fn(64, 64, |x, y| {
            if (x + y) % 2 == 0 { Luma([0u8]) } else { Luma([255u8]) }
        });
        let fitted = fit_pow2(&img, 16);
        let centre = fitted.get_pixel(8, 8).0[0];
        assert!(
            (64..=192).contains(&centre),
            "expected a mid-grey average, got {centre}"
        );
    }

    #[test]
    fn encode_texture_produces_jpeg_with_digest() {
        let page = RgbaImage::from_pixel(300, 200, Rgba([200, 30, 30, 255]));
        let texture = encode_texture(&page, 1024, 95).expect("encode");
        assert_eq!((texture.width, texture.height), (300, 200));
        assert_eq!(texture.mime_type, "image/jpeg");
        assert_eq!(&texture.bytes[..2], &[0xFF, 0xD8], "JPEG SOI marker");
        assert_eq!(texture.digest.len(), 64);

        let decoded = image::load_from_memory(&texture.bytes).expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (300, 200));
    }

    #[test]
    fn encode_texture_respects_max_dimension() {
        let page = RgbaImage::from_pixel(2500, 1000, Rgba([10, 10, 10, 255]));
        let texture = encode_texture(&page, 1024, 90).expect("encode");
        assert_eq!((texture.width, texture.height), (625, 250));
    }

    #[test]
    fn processor_fit_pow2_chain() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(800, 600));
        let out = RasterProcessor::from_dynamic(img).fit_pow2(640);
        assert_eq!((out.width(), out.height()), (400, 300));
        assert!(!out.to_png_bytes().expect("png").is_empty());
    }
}
