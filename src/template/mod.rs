//! Template storage, scaling and planning utilities.

use crate::image::resize::resize_u8_bilinear;
use crate::image::{ImageView, OwnedImage, PixelBuffer};
use crate::util::math::scaled_len;
use crate::util::VisionResult;

mod plan;

pub use plan::TemplatePlan;

/// Owned template image in contiguous grayscale format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    img: OwnedImage,
}

impl Template {
    /// Creates a template from a contiguous grayscale buffer.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> VisionResult<Self> {
        let img = OwnedImage::new(data, width, height)?;
        Ok(Self { img })
    }

    /// Converts an RGBA template to grayscale.
    pub fn from_pixels(pixels: &PixelBuffer) -> Self {
        Self {
            img: pixels.to_luma(),
        }
    }

    /// Copies a grayscale view into a template.
    pub fn from_view(view: ImageView<'_, u8>) -> VisionResult<Self> {
        Ok(Self {
            img: OwnedImage::from_view(view)?,
        })
    }

    pub fn width(&self) -> usize {
        self.img.width()
    }

    pub fn height(&self) -> usize {
        self.img.height()
    }

    /// Returns a borrowed view of the template data.
    pub fn view(&self) -> ImageView<'_, u8> {
        self.img.view()
    }

    /// Dimensions of the template at `scale`, rounded to the nearest pixel.
    ///
    /// `None` when either side would collapse to zero.
    pub fn scaled_dims(&self, scale: f32) -> Option<(usize, usize)> {
        Some((
            scaled_len(self.width(), scale)?,
            scaled_len(self.height(), scale)?,
        ))
    }

    /// Resamples the template to exactly `width`x`height`.
    pub fn resized(&self, width: usize, height: usize) -> VisionResult<OwnedImage> {
        resize_u8_bilinear(self.view(), width, height)
    }
}

impl From<OwnedImage> for Template {
    fn from(img: OwnedImage) -> Self {
        Self { img }
    }
}
