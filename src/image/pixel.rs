//! Owned RGBA pixel buffers produced by capture and image loading.

use crate::image::OwnedImage;
use crate::util::{VisionError, VisionResult};

/// Bytes per RGBA pixel.
pub const CHANNELS: usize = 4;

/// Owned 8-bit RGBA image with tightly packed rows.
///
/// Width and height are always positive; an empty capture is unrepresentable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl PixelBuffer {
    /// Wraps RGBA bytes whose length is exactly `width * height * 4`.
    pub fn from_rgba(data: Vec<u8>, width: usize, height: usize) -> VisionResult<Self> {
        let needed = packed_len(width, height)?;
        if data.len() != needed {
            return Err(VisionError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Converts BGRA rows (as returned by GDI and CoreGraphics) into RGBA.
    ///
    /// `row_bytes` may exceed `width * 4` when the source pads its rows.
    pub fn from_bgra_rows(
        bgra: &[u8],
        width: usize,
        height: usize,
        row_bytes: usize,
    ) -> VisionResult<Self> {
        let needed = packed_len(width, height)?;
        let row_len = width * CHANNELS;
        if row_bytes < row_len {
            return Err(VisionError::InvalidStride {
                width: row_len,
                stride: row_bytes,
            });
        }
        let available = (height - 1) * row_bytes + row_len;
        if bgra.len() < available {
            return Err(VisionError::BufferTooSmall {
                needed: available,
                got: bgra.len(),
            });
        }

        let mut data = Vec::with_capacity(needed);
        for y in 0..height {
            let row = &bgra[y * row_bytes..y * row_bytes + row_len];
            for px in row.chunks_exact(CHANNELS) {
                data.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
            }
        }
        Self::from_rgba(data, width, height)
    }

    /// Creates a buffer filled with a single RGBA color.
    pub fn filled(width: usize, height: usize, rgba: [u8; 4]) -> VisionResult<Self> {
        let needed = packed_len(width, height)?;
        let data = rgba.iter().copied().cycle().take(needed).collect();
        Self::from_rgba(data, width, height)
    }

    /// Builds an opaque RGBA buffer from a grayscale image.
    pub fn from_luma(gray: &OwnedImage) -> Self {
        let mut data = Vec::with_capacity(gray.data().len() * CHANNELS);
        for &v in gray.data() {
            data.extend_from_slice(&[v, v, v, 255]);
        }
        Self {
            data,
            width: gray.width(),
            height: gray.height(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the packed RGBA bytes.
    pub fn as_rgba(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the buffer and returns the packed RGBA bytes.
    pub fn into_rgba(self) -> Vec<u8> {
        self.data
    }

    /// Returns the RGBA value at `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y * self.width + x) * CHANNELS;
        let px = self.data.get(idx..idx + CHANNELS)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Converts to grayscale with integer BT.601 luma weights; alpha is ignored.
    pub fn to_luma(&self) -> OwnedImage {
        let gray = self
            .data
            .chunks_exact(CHANNELS)
            .map(|px| {
                let luma = 299 * u32::from(px[0]) + 587 * u32::from(px[1]) + 114 * u32::from(px[2]);
                ((luma + 500) / 1000) as u8
            })
            .collect();
        OwnedImage::from_parts(gray, self.width, self.height)
    }
}

fn packed_len(width: usize, height: usize) -> VisionResult<usize> {
    if width == 0 || height == 0 {
        return Err(VisionError::InvalidDimensions { width, height });
    }
    width
        .checked_mul(height)
        .and_then(|v| v.checked_mul(CHANNELS))
        .ok_or(VisionError::InvalidDimensions { width, height })
}

#[cfg(test)]
mod tests {
    use super::PixelBuffer;
    use crate::util::VisionError;

    #[test]
    fn rejects_empty_and_short_buffers() {
        let err = PixelBuffer::from_rgba(Vec::new(), 0, 4).unwrap_err();
        assert_eq!(
            err,
            VisionError::InvalidDimensions {
                width: 0,
                height: 4
            }
        );
        let err = PixelBuffer::from_rgba(vec![0; 15], 2, 2).unwrap_err();
        assert_eq!(err, VisionError::BufferTooSmall { needed: 16, got: 15 });
    }

    #[test]
    fn bgra_rows_swap_channels_and_drop_padding() {
        // Two pixels per row, row pitch of 12 bytes.
        let bgra = [
            1, 2, 3, 4, 5, 6, 7, 8, 0, 0, 0, 0, //
            9, 10, 11, 12, 13, 14, 15, 16, 0, 0, 0, 0,
        ];
        let buf = PixelBuffer::from_bgra_rows(&bgra, 2, 2, 12).unwrap();
        assert_eq!(buf.pixel(0, 0), Some([3, 2, 1, 4]));
        assert_eq!(buf.pixel(1, 1), Some([15, 14, 13, 16]));
        assert_eq!(buf.pixel(2, 0), None);
    }

    #[test]
    fn luma_uses_bt601_weights() {
        let buf = PixelBuffer::from_rgba(
            vec![255, 0, 0, 255, 0, 255, 0, 255, 0, 0, 255, 255, 200, 200, 200, 0],
            4,
            1,
        )
        .unwrap();
        let gray = buf.to_luma();
        assert_eq!(gray.data(), &[76, 150, 29, 200]);
    }
}
