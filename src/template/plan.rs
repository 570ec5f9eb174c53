//! Zero-mean template statistics shared by the correlation kernels.

use crate::image::ImageView;

/// Below this sum of squared deviations a template carries no contrast.
pub(crate) const MIN_TEMPLATE_ENERGY: f64 = 1e-8;

/// Precomputed statistics and zero-mean buffer for ZNCC scoring.
pub struct TemplatePlan {
    width: usize,
    height: usize,
    mean: f32,
    var_t: f32,
    t_prime: Vec<f32>,
}

impl TemplatePlan {
    /// Builds a plan from a template view.
    ///
    /// A flat template produces a plan with `var_t == 0`, which kernels treat
    /// as "cannot match" rather than an error.
    pub fn from_view(tpl: ImageView<'_, u8>) -> Self {
        let width = tpl.width();
        let height = tpl.height();

        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;
        for row in (0..height).filter_map(|y| tpl.row(y)) {
            for &value in row {
                let v = value as f64;
                sum += v;
                sum_sq += v * v;
            }
        }

        let n = (width * height) as f64;
        let mean = sum / n;
        let energy = (sum_sq - sum * sum / n).max(0.0);
        let var_t = if energy <= MIN_TEMPLATE_ENERGY {
            0.0
        } else {
            energy as f32
        };

        let mut t_prime = Vec::with_capacity(width * height);
        for row in (0..height).filter_map(|y| tpl.row(y)) {
            t_prime.extend(row.iter().map(|&v| (v as f64 - mean) as f32));
        }

        Self {
            width,
            height,
            mean: mean as f32,
            var_t,
            t_prime,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Mean intensity of the template.
    pub fn mean(&self) -> f32 {
        self.mean
    }

    /// Sum of squared deviations from the mean (zero for flat templates).
    pub fn var_t(&self) -> f32 {
        self.var_t
    }

    /// Returns `true` when the template has no intensity variation.
    pub fn is_flat(&self) -> bool {
        self.var_t == 0.0
    }

    /// Zero-mean template values in row-major order.
    pub fn t_prime(&self) -> &[f32] {
        &self.t_prime
    }
}

#[cfg(test)]
mod tests {
    use super::TemplatePlan;
    use crate::image::ImageView;

    #[test]
    fn plan_centers_values() {
        let data = [10u8, 20, 30, 40];
        let plan = TemplatePlan::from_view(ImageView::from_slice(&data, 2, 2).unwrap());
        assert!((plan.mean() - 25.0).abs() < 1e-6);
        assert_eq!(plan.t_prime(), &[-15.0, -5.0, 5.0, 15.0]);
        assert!((plan.var_t() - 500.0).abs() < 1e-3);
        assert!(!plan.is_flat());
    }

    #[test]
    fn flat_template_is_flagged() {
        let data = [9u8; 12];
        let plan = TemplatePlan::from_view(ImageView::from_slice(&data, 4, 3).unwrap());
        assert!(plan.is_flat());
    }
}
