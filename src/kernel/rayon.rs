//! Rayon-parallel kernels (feature-gated).
//!
//! Rows of placements are scored in parallel; the per-row winners are then
//! folded in row order so the result is identical to the scalar kernel.

use crate::image::ImageView;
use crate::kernel::scalar::{pick_best_row, zncc_best_in_row};
use crate::kernel::{placement_range, Correlation, Correlator, WindowStats};
use crate::template::TemplatePlan;
use crate::trace::trace_span;
use crate::util::VisionResult;
use rayon::prelude::*;

/// Row-parallel ZNCC producing the same results as [`crate::kernel::Zncc`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ZnccParallel;

impl Correlator for ZnccParallel {
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

        let _span = trace_span!("zncc_scan_par", rows = max_y + 1).entered();
        let stats = WindowStats::new(source);
        let rows: Vec<(usize, Option<(f32, usize)>)> = (0..=max_y)
            .into_par_iter()
            .map(|y| (y, zncc_best_in_row(source, &plan, &stats, y, max_x)))
            .collect();
        Ok(pick_best_row(rows))
    }
}
