//! Multi-scale template search.
//!
//! The template is resampled to every scale in `[min_scale, max_scale]`
//! (stepping by `scale_step`) and each resampled copy is correlated against
//! the source. Scales whose template would not fit strictly inside the
//! source are skipped.

use crate::candidate::ScaleHit;
use crate::geometry::{to_screen_rect, Point, Rect, ScreenRect, WindowRect};
use crate::util::{VisionError, VisionResult};

mod multiscale;
pub mod scales;

pub use multiscale::MultiScaleMatcher;
pub use scales::{ScaleSteps, MAX_SCALES, SCALE_EPSILON};

/// Parameters of a multi-scale search.
///
/// Construct with [`MultiScaleConfig::new`], which enforces
/// `0 < min_scale <= max_scale`, `scale_step > 0`, `threshold` in `[0, 1]`,
/// `max_results >= 1` and at most [`MAX_SCALES`] scales.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MultiScaleConfig {
    min_scale: f32,
    max_scale: f32,
    scale_step: f32,
    threshold: f32,
    max_results: usize,
}

impl Default for MultiScaleConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.8,
            max_scale: 1.2,
            scale_step: 0.05,
            threshold: 0.8,
            max_results: 5,
        }
    }
}

impl MultiScaleConfig {
    /// Creates a validated configuration.
    pub fn new(
        min_scale: f32,
        max_scale: f32,
        scale_step: f32,
        threshold: f32,
        max_results: usize,
    ) -> VisionResult<Self> {
        let cfg = Self {
            min_scale,
            max_scale,
            scale_step,
            threshold,
            max_results,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Configuration that only tries the template at its native size.
    pub fn single_scale(threshold: f32) -> VisionResult<Self> {
        Self::new(1.0, 1.0, 1.0, threshold, 1)
    }

    /// Checks every invariant; NaN values are rejected.
    pub fn validate(&self) -> VisionResult<()> {
        let reason = if !(self.min_scale > 0.0) || !self.min_scale.is_finite() {
            "min_scale must be a positive finite number"
        } else if !(self.max_scale >= self.min_scale) || !self.max_scale.is_finite() {
            "max_scale must be finite and not below min_scale"
        } else if !(self.scale_step > 0.0) || !self.scale_step.is_finite() {
            "scale_step must be a positive finite number"
        } else if !(0.0..=1.0).contains(&self.threshold) {
            "threshold must lie in [0, 1]"
        } else if self.max_results == 0 {
            "max_results must be at least 1"
        } else if ScaleSteps::count(self.min_scale, self.max_scale, self.scale_step)
            .map_or(true, |n| n > MAX_SCALES)
        {
            "scale range visits more than MAX_SCALES scales"
        } else {
            return Ok(());
        };
        Err(VisionError::InvalidConfig { reason })
    }

    pub fn min_scale(&self) -> f32 {
        self.min_scale
    }

    pub fn max_scale(&self) -> f32 {
        self.max_scale
    }

    pub fn scale_step(&self) -> f32 {
        self.scale_step
    }

    /// Minimum similarity a match must reach to be reported.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Upper bound on the length of `match_all_scales` output.
    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Scales visited by the search, in ascending order.
    pub fn scales(&self) -> ScaleSteps {
        ScaleSteps::new(self.min_scale, self.max_scale, self.scale_step)
    }
}

/// Outcome of a template search, in source-image pixel coordinates.
///
/// The default value (similarity 0, empty box) means "not found".
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MatchResult {
    /// Similarity in `[0, 1]`.
    pub similarity: f32,
    /// Top-left corner of the match.
    pub location: Point,
    /// Matched region; its size is the template size at `scale`.
    pub bounding_box: Rect,
    /// Scale factor applied to the template.
    pub scale: f32,
    /// Equal to `similarity` for correlation-based matching.
    pub confidence: f32,
}

impl MatchResult {
    /// Returns `false` for the zero-similarity "not found" result.
    pub fn is_found(&self) -> bool {
        self.similarity > 0.0
    }

    /// Center of the matched box.
    pub fn center(&self) -> Point {
        self.bounding_box.center()
    }

    /// Bounding box in screen coordinates of the captured window.
    pub fn screen_rect(&self, window: &WindowRect) -> ScreenRect {
        to_screen_rect(self.bounding_box, window)
    }
}

impl From<ScaleHit> for MatchResult {
    fn from(hit: ScaleHit) -> Self {
        let location = Point::new(saturating_i32(hit.x), saturating_i32(hit.y));
        Self {
            similarity: hit.score,
            location,
            bounding_box: Rect::from_origin_size(
                location,
                saturating_i32(hit.width),
                saturating_i32(hit.height),
            ),
            scale: hit.scale,
            confidence: hit.score,
        }
    }
}

fn saturating_i32(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::{MatchResult, MultiScaleConfig};
    use crate::candidate::ScaleHit;
    use crate::util::VisionError;

    #[test]
    fn tiny_steps_are_rejected_instead_of_enumerated() {
        for step in [1e-30, 1e-12, 1e-5] {
            let err = MultiScaleConfig::new(1.0, 2.0, step, 0.5, 1).unwrap_err();
            assert!(matches!(err, VisionError::InvalidConfig { .. }), "{err:?}");
        }
        assert!(MultiScaleConfig::new(1.0, 2.0, 1e-3, 0.5, 1).is_ok());
    }

    #[test]
    fn oversized_hits_saturate_coordinates() {
        let hit = ScaleHit {
            score: 0.9,
            scale_idx: 0,
            scale: 1.0,
            x: usize::MAX,
            y: 3,
            width: usize::MAX / 2,
            height: 10,
        };
        let m = MatchResult::from(hit);
        assert_eq!(m.location.x, i32::MAX);
        assert_eq!(m.location.y, 3);
        assert_eq!(m.bounding_box.height(), 10);
    }

    #[test]
    fn config_rejects_each_invariant() {
        let cases = [
            (0.0, 1.0, 0.1, 0.5, 1),
            (1.2, 1.0, 0.1, 0.5, 1),
            (0.8, 1.0, 0.0, 0.5, 1),
            (0.8, 1.0, f32::NAN, 0.5, 1),
            (0.8, 1.0, 0.1, 1.5, 1),
            (0.8, 1.0, 0.1, 0.5, 0),
        ];
        for (min, max, step, threshold, max_results) in cases {
            let err = MultiScaleConfig::new(min, max, step, threshold, max_results).unwrap_err();
            assert!(matches!(err, VisionError::InvalidConfig { .. }), "{err:?}");
        }
    }

    #[test]
    fn default_and_single_scale_are_valid() {
        MultiScaleConfig::default().validate().unwrap();
        let single = MultiScaleConfig::single_scale(0.9).unwrap();
        assert_eq!(single.scales().collect::<Vec<_>>(), vec![1.0]);
    }
}
