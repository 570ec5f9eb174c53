//! Correlation primitives.
//!
//! A [`Correlator`] slides a grayscale template over a grayscale source and
//! reports the best-scoring top-left placement. Scores live in `[0, 1]`
//! where higher is better; a score of zero means "nothing usable found".

use crate::image::ImageView;
use crate::util::{VisionError, VisionResult};

pub mod scalar;

#[cfg(feature = "rayon")]
pub mod rayon;

pub use scalar::{Ssd, Zncc};

#[cfg(feature = "rayon")]
pub use self::rayon::ZnccParallel;

/// Best placement reported by a correlator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Correlation {
    /// Similarity in `[0, 1]`.
    pub score: f32,
    /// Column of the template's top-left corner.
    pub x: usize,
    /// Row of the template's top-left corner.
    pub y: usize,
}

impl Correlation {
    /// Result for a search that found no informative placement.
    pub const NONE: Correlation = Correlation {
        score: 0.0,
        x: 0,
        y: 0,
    };
}

/// Similarity primitive used by the multi-scale search.
///
/// Implementations must be deterministic: the same inputs give the same
/// result, and ties between placements resolve to the first one in
/// row-major order.
pub trait Correlator: Send + Sync {
    /// Finds the best placement of `template` inside `source`.
    fn correlate(
        &self,
        source: ImageView<'_, u8>,
        template: ImageView<'_, u8>,
    ) -> VisionResult<Correlation>;
}

impl<C: Correlator + ?Sized> Correlator for &C {
    fn correlate(
        &self,
        source: ImageView<'_, u8>,
        template: ImageView<'_, u8>,
    ) -> VisionResult<Correlation> {
        (**self).correlate(source, template)
    }
}

impl<C: Correlator + ?Sized> Correlator for Box<C> {
    fn correlate(
        &self,
        source: ImageView<'_, u8>,
        template: ImageView<'_, u8>,
    ) -> VisionResult<Correlation> {
        (**self).correlate(source, template)
    }
}

/// Scoring metric for the built-in correlators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Metric {
    /// Zero-mean normalized cross-correlation.
    #[default]
    Zncc,
    /// Squared difference normalized to `[0, 1]`.
    Ssd,
}

impl Metric {
    /// Returns the scalar correlator for this metric.
    pub fn correlator(self) -> Box<dyn Correlator> {
        match self {
            Metric::Zncc => Box::new(Zncc),
            Metric::Ssd => Box::new(Ssd),
        }
    }
}

/// Validates that `template` fits inside `source` and returns the last
/// valid top-left placement.
pub(crate) fn placement_range(
    source: ImageView<'_, u8>,
    template: ImageView<'_, u8>,
) -> VisionResult<(usize, usize)> {
    if template.width() > source.width() || template.height() > source.height() {
        return Err(VisionError::RoiOutOfBounds {
            x: 0,
            y: 0,
            width: template.width(),
            height: template.height(),
            img_width: source.width(),
            img_height: source.height(),
        });
    }
    Ok((
        source.width() - template.width(),
        source.height() - template.height(),
    ))
}

/// Summed-area tables of intensity and squared intensity.
///
/// Lets every placement read its window sum and energy in O(1).
pub(crate) struct WindowStats {
    width: usize,
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
}

impl WindowStats {
    pub(crate) fn new(image: ImageView<'_, u8>) -> Self {
        let width = image.width() + 1;
        let height = image.height() + 1;
        let mut sum = vec![0.0f64; width * height];
        let mut sum_sq = vec![0.0f64; width * height];
        for (y, row) in (0..image.height()).filter_map(|y| image.row(y)).enumerate() {
            let mut row_sum = 0.0f64;
            let mut row_sq = 0.0f64;
            for (x, &value) in row.iter().enumerate() {
                let v = value as f64;
                row_sum += v;
                row_sq += v * v;
                let idx = (y + 1) * width + x + 1;
                sum[idx] = sum[idx - width] + row_sum;
                sum_sq[idx] = sum_sq[idx - width] + row_sq;
            }
        }
        Self { width, sum, sum_sq }
    }

    /// Returns `(sum, sum of squares)` of the `w`x`h` window at `(x, y)`.
    #[inline]
    pub(crate) fn window(&self, x: usize, y: usize, w: usize, h: usize) -> (f64, f64) {
        let stride = self.width;
        let a = y * stride + x;
        let b = a + w;
        let c = (y + h) * stride + x;
        let d = c + w;
        (
            self.sum[d] - self.sum[b] - self.sum[c] + self.sum[a],
            self.sum_sq[d] - self.sum_sq[b] - self.sum_sq[c] + self.sum_sq[a],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::WindowStats;
    use crate::image::ImageView;

    #[test]
    fn window_stats_match_direct_sums() {
        let data: Vec<u8> = (0..30).map(|v| (v * 7 % 23) as u8).collect();
        let view = ImageView::from_slice(&data, 6, 5).unwrap();
        let stats = WindowStats::new(view);
        let (sum, sum_sq) = stats.window(2, 1, 3, 3);

        let mut expect = (0.0, 0.0);
        for y in 1..4 {
            for x in 2..5 {
                let v = data[y * 6 + x] as f64;
                expect.0 += v;
                expect.1 += v * v;
            }
        }
        assert_eq!((sum, sum_sq), expect);
    }
}
