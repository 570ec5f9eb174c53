//! Loading and saving pixel buffers via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::image::{OwnedImage, PixelBuffer};
use crate::util::{VisionError, VisionResult};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Output encodings supported by [`save_pixels`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveFormat {
    Png,
    /// JPEG with a quality in `1..=100`.
    Jpeg { quality: u8 },
}

impl SaveFormat {
    /// Picks a format from a file extension, defaulting to PNG.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("jpg") | Some("jpeg") => SaveFormat::Jpeg { quality: 90 },
            _ => SaveFormat::Png,
        }
    }
}

fn io_error(err: impl std::fmt::Display) -> VisionError {
    VisionError::ImageIo {
        reason: err.to_string(),
    }
}

/// Converts a decoded image into an RGBA pixel buffer.
pub fn pixels_from_dynamic(img: &DynamicImage) -> VisionResult<PixelBuffer> {
    let rgba = img.to_rgba8();
    let (width, height) = (rgba.width() as usize, rgba.height() as usize);
    PixelBuffer::from_rgba(rgba.into_raw(), width, height)
}

/// Converts a pixel buffer into an `image` RGBA buffer.
pub fn pixels_to_rgba_image(pixels: &PixelBuffer) -> VisionResult<RgbaImage> {
    RgbaImage::from_raw(
        pixels.width() as u32,
        pixels.height() as u32,
        pixels.as_rgba().to_vec(),
    )
    .ok_or(VisionError::InvalidDimensions {
        width: pixels.width(),
        height: pixels.height(),
    })
}

/// Loads an image file into an RGBA pixel buffer.
pub fn load_pixels<P: AsRef<Path>>(path: P) -> VisionResult<PixelBuffer> {
    let img = image::open(path).map_err(io_error)?;
    pixels_from_dynamic(&img)
}

/// Decodes an in-memory encoded image into an RGBA pixel buffer.
pub fn decode_pixels(bytes: &[u8]) -> VisionResult<PixelBuffer> {
    let img = image::load_from_memory(bytes).map_err(io_error)?;
    pixels_from_dynamic(&img)
}

/// Loads an image file and converts it to grayscale.
pub fn load_gray_image<P: AsRef<Path>>(path: P) -> VisionResult<OwnedImage> {
    Ok(load_pixels(path)?.to_luma())
}

/// Encodes a pixel buffer to disk.
///
/// JPEG has no alpha channel, so alpha is dropped for that format.
pub fn save_pixels<P: AsRef<Path>>(
    pixels: &PixelBuffer,
    path: P,
    format: SaveFormat,
) -> VisionResult<()> {
    let rgba = pixels_to_rgba_image(pixels)?;
    match format {
        SaveFormat::Png => rgba
            .save_with_format(path, ImageFormat::Png)
            .map_err(io_error),
        SaveFormat::Jpeg { quality } => {
            let quality = quality.clamp(1, 100);
            let rgb = DynamicImage::ImageRgba8(rgba).to_rgb8();
            let file = File::create(path).map_err(io_error)?;
            let mut encoder = JpegEncoder::new_with_quality(BufWriter::new(file), quality);
            encoder.encode_image(&rgb).map_err(io_error)
        }
    }
}

/// Resizes a pixel buffer with triangle (bilinear) filtering.
pub fn resize_pixels(pixels: &PixelBuffer, width: usize, height: usize) -> VisionResult<PixelBuffer> {
    if width == 0 || height == 0 {
        return Err(VisionError::InvalidDimensions { width, height });
    }
    if width == pixels.width() && height == pixels.height() {
        return Ok(pixels.clone());
    }
    let rgba = pixels_to_rgba_image(pixels)?;
    let resized = image::imageops::resize(
        &rgba,
        width as u32,
        height as u32,
        image::imageops::FilterType::Triangle,
    );
    PixelBuffer::from_rgba(resized.into_raw(), width, height)
}

#[cfg(test)]
mod tests {
    use super::{decode_pixels, save_pixels, SaveFormat};
    use crate::image::PixelBuffer;

    #[test]
    fn format_follows_extension() {
        assert_eq!(SaveFormat::from_path("shot.PNG"), SaveFormat::Png);
        assert_eq!(
            SaveFormat::from_path("shot.jpeg"),
            SaveFormat::Jpeg { quality: 90 }
        );
        assert_eq!(SaveFormat::from_path("shot"), SaveFormat::Png);
    }

    #[test]
    fn png_save_preserves_pixels() {
        let mut data = Vec::new();
        for i in 0..(6 * 4) {
            data.extend_from_slice(&[(i * 10) as u8, 50, 200, 255]);
        }
        let pixels = PixelBuffer::from_rgba(data, 6, 4).unwrap();
        let path = std::env::temp_dir().join(format!("gamevision-io-{}.png", std::process::id()));
        save_pixels(&pixels, &path, SaveFormat::Png).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(decode_pixels(&bytes).unwrap(), pixels);
    }
}
