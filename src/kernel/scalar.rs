//! Scalar reference kernels.

use crate::image::ImageView;
use crate::kernel::{placement_range, Correlation, Correlator, WindowStats};
use crate::template::TemplatePlan;
use crate::trace::trace_span;
use crate::util::VisionResult;

/// Window energies at or below this value are treated as flat.
pub const MIN_WINDOW_ENERGY: f64 = 1e-6;

/// Zero-mean normalized cross-correlation, clamped to `[0, 1]`.
///
/// Anti-correlated placements score zero. Flat templates and flat source
/// windows carry no signal and never produce a positive score.
#[derive(Clone, Copy, Debug, Default)]
pub struct Zncc;

/// Squared difference mapped to a similarity: `1 - SSE / (N * 255^2)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ssd;

/// Scores one row of placements and returns its best `(score, x)`.
///
/// Only strictly greater scores replace the running best, so the leftmost
/// placement wins ties.
pub(crate) fn zncc_best_in_row(
    image: ImageView<'_, u8>,
    plan: &TemplatePlan,
    stats: &WindowStats,
    y: usize,
    max_x: usize,
) -> Option<(f32, usize)> {
    let tpl_width = plan.width();
    let tpl_height = plan.height();
    let n = (tpl_width * tpl_height) as f64;
    let var_t = plan.var_t() as f64;
    let t_prime = plan.t_prime();
    let data = image.as_slice();
    let stride = image.stride();

    let mut best: Option<(f32, usize)> = None;
    for x in 0..=max_x {
        let (sum_i, sum_i2) = stats.window(x, y, tpl_width, tpl_height);
        let var_i = sum_i2 - sum_i * sum_i / n;
        if var_i <= MIN_WINDOW_ENERGY {
            continue;
        }

        let mut dot = 0.0f32;
        for ty in 0..tpl_height {
            let start = (y + ty) * stride + x;
            let img_row = &data[start..start + tpl_width];
            let tpl_row = &t_prime[ty * tpl_width..(ty + 1) * tpl_width];
            for (&t, &v) in tpl_row.iter().zip(img_row) {
                dot += t * v as f32;
            }
        }

        let score = (dot as f64 / (var_t * var_i).sqrt()) as f32;
        if !score.is_finite() {
            continue;
        }
        let score = score.clamp(0.0, 1.0);
        if best.map_or(true, |(s, _)| score > s) {
            best = Some((score, x));
        }
    }
    best
}

/// Folds per-row winners into the overall best, first row wins ties.
pub(crate) fn pick_best_row<I>(rows: I) -> Correlation
where
    I: IntoIterator<Item = (usize, Option<(f32, usize)>)>,
{
    let mut best = Correlation::NONE;
    for (y, row) in rows {
        if let Some((score, x)) = row {
            if score > best.score {
                best = Correlation { score, x, y };
            }
        }
    }
    best
}

impl Correlator for Zncc {
    fn correlate(
        &self,
        source: ImageView<'_, u8>,
        template: ImageView<'_, u8>,
    ) -> VisionResult<Correlation> {
        let (max_x, max_y) = placement_range(source, template)?;
        let plan = TemplatePlan::from_view(template);
        if plan.is_flat() {
            return Ok(Correlation::NONE);
        }

        let _span = trace_span!(
            "zncc_scan",
            tpl_w = template.width(),
            tpl_h = template.height()
        )
        .entered();
        let stats = WindowStats::new(source);
        Ok(pick_best_row(
            (0..=max_y).map(|y| (y, zncc_best_in_row(source, &plan, &stats, y, max_x))),
        ))
    }
}

impl Correlator for Ssd {
    fn correlate(
        &self,
        source: ImageView<'_, u8>,
        template: ImageView<'_, u8>,
    ) -> VisionResult<Correlation> {
        let (max_x, max_y) = placement_range(source, template)?;
        let tpl_width = template.width();
        let tpl_height = template.height();
        let norm = (tpl_width * tpl_height) as f64 * 255.0 * 255.0;

        let mut best = Correlation::NONE;
        let mut best_sse = f64::INFINITY;
        for y in 0..=max_y {
            for x in 0..=max_x {
                let mut sse = 0u64;
                for ty in 0..tpl_height {
                    let (Some(img_row), Some(tpl_row)) = (source.row(y + ty), template.row(ty))
                    else {
                        continue;
                    };
                    for (&a, &b) in img_row[x..x + tpl_width].iter().zip(tpl_row) {
                        let d = i32::from(a) - i32::from(b);
                        sse += (d * d) as u64;
                    }
                }
                let sse = sse as f64;
                if sse < best_sse {
                    best_sse = sse;
                    best = Correlation {
                        score: (1.0 - sse / norm).clamp(0.0, 1.0) as f32,
                        x,
                        y,
                    };
                }
            }
        }
        Ok(best)
    }
}
