//! Enumeration of the scales visited by a multi-scale search.

/// Tolerance added to the upper bound so accumulated floating-point error
/// in `min + i * step` never drops the last requested scale.
pub const SCALE_EPSILON: f64 = 1e-6;

/// Largest number of scales a single search may visit.
pub const MAX_SCALES: usize = 10_000;

/// Iterator over `min, min + step, ..., <= max + SCALE_EPSILON` in ascending
/// order.
///
/// Each value is computed from its index rather than by repeated addition,
/// and values that land within the tolerance above `max` are clamped to it.
#[derive(Clone, Debug)]
pub struct ScaleSteps {
    min: f64,
    max: f64,
    step: f64,
    count: usize,
    next: usize,
}

impl ScaleSteps {
    /// Number of scales in `min..=max` by `step`.
    ///
    /// `None` when the inputs are not finite, the range is inverted, or the
    /// count does not fit in `usize`.
    pub fn count(min: f32, max: f32, step: f32) -> Option<usize> {
        let (min, max, step) = (min as f64, max as f64, step as f64);
        let span = ((max - min + SCALE_EPSILON) / step).floor();
        if !span.is_finite() || span < 0.0 || span >= usize::MAX as f64 {
            return None;
        }
        (span as usize).checked_add(1)
    }

    /// Creates the sequence; callers validate the range with
    /// [`ScaleSteps::count`]. An unrepresentable range yields no scales.
    pub fn new(min: f32, max: f32, step: f32) -> Self {
        let count = Self::count(min, max, step).unwrap_or(0);
        let (min, max, step) = (min as f64, max as f64, step as f64);
        Self {
            min,
            max,
            step,
            count,
            next: 0,
        }
    }

    /// Scale at position `idx` of the sequence.
    pub fn scale_at(&self, idx: usize) -> Option<f32> {
        (idx < self.count).then(|| (self.min + idx as f64 * self.step).min(self.max) as f32)
    }
}

impl Iterator for ScaleSteps {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let value = self.scale_at(self.next)?;
        self.next += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.count.saturating_sub(self.next);
        (left, Some(left))
    }
}

impl ExactSizeIterator for ScaleSteps {}
