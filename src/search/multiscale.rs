use crate::candidate::{rank_and_truncate, BestHit, ScaleHit};
use crate::image::resize::resize_u8_bilinear;
use crate::image::ImageView;
use crate::kernel::{Correlator, Zncc};
use crate::search::{MatchResult, MultiScaleConfig};
use crate::trace::{trace_debug, trace_event, trace_span};
use crate::util::math::scaled_len;
use crate::util::VisionResult;

/// Multi-scale matcher over a pluggable correlation primitive.
///
/// The matcher holds no per-search state and can be shared across threads.
#[derive(Clone, Debug, Default)]
pub struct MultiScaleMatcher<C = Zncc> {
    correlator: C,
    #[cfg_attr(not(feature = "rayon"), allow(dead_code))]
    parallel: bool,
}

impl MultiScaleMatcher<Zncc> {
    /// Creates a sequential matcher using ZNCC.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: Correlator> MultiScaleMatcher<C> {
    /// Creates a matcher around a custom correlator.
    pub fn with_correlator(correlator: C) -> Self {
        Self {
            correlator,
            parallel: false,
        }
    }

    /// Evaluates scales concurrently when the `rayon` feature is enabled.
    ///
    /// Results are reduced in ascending scale order, so they are identical to
    /// the sequential search. Without `rayon` the flag is ignored.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn correlator(&self) -> &C {
        &self.correlator
    }

    /// Returns the single best match across all scales.
    ///
    /// A scale replaces the current best only when its similarity is strictly
    /// higher and reaches the threshold; equal scores keep the smaller scale.
    /// When nothing qualifies the default "not found" result is returned.
    /// An error from the correlator aborts the whole search.
    pub fn match_best_scale(
        &self,
        source: ImageView<'_, u8>,
        template: ImageView<'_, u8>,
        config: &MultiScaleConfig,
    ) -> VisionResult<MatchResult> {
        config.validate()?;
        let _span = trace_span!("match_best_scale", scales = config.scales().len()).entered();

        let mut best = BestHit::new(config.threshold());
        for hit in self.scan_scales(source, template, config)? {
            best.offer(hit);
        }
        let result = best.into_inner().map(MatchResult::from).unwrap_or_default();
        trace_event!(
            "best_scale",
            similarity = result.similarity,
            scale = result.scale
        );
        Ok(result)
    }

    /// Returns every scale's best placement that reaches the threshold.
    ///
    /// Results are sorted by descending similarity (ties by ascending scale)
    /// and then truncated to `max_results`.
    pub fn match_all_scales(
        &self,
        source: ImageView<'_, u8>,
        template: ImageView<'_, u8>,
        config: &MultiScaleConfig,
    ) -> VisionResult<Vec<MatchResult>> {
        config.validate()?;
        let _span = trace_span!("match_all_scales", scales = config.scales().len()).entered();

        let threshold = config.threshold();
        let mut hits: Vec<ScaleHit> = self
            .scan_scales(source, template, config)?
            .into_iter()
            .filter(|hit| hit.score > 0.0 && hit.score >= threshold)
            .collect();
        rank_and_truncate(&mut hits, config.max_results());
        trace_event!("all_scales", matches = hits.len());
        Ok(hits.into_iter().map(MatchResult::from).collect())
    }

    /// Scores every fitting scale and returns the hits in scale order.
    fn scan_scales(
        &self,
        source: ImageView<'_, u8>,
        template: ImageView<'_, u8>,
        config: &MultiScaleConfig,
    ) -> VisionResult<Vec<ScaleHit>> {
        let scales: Vec<f32> = config.scales().collect();

        #[cfg(feature = "rayon")]
        {
            if self.parallel {
                use rayon::prelude::*;
                let evaluated: Vec<VisionResult<Option<ScaleHit>>> = scales
                    .par_iter()
                    .enumerate()
                    .map(|(idx, &scale)| self.evaluate_scale(source, template, idx, scale))
                    .collect();
                // Reduce in scale order so the first failing scale is the one reported.
                let mut hits = Vec::with_capacity(evaluated.len());
                for outcome in evaluated {
                    hits.extend(outcome?);
                }
                return Ok(hits);
            }
        }

        let mut hits = Vec::with_capacity(scales.len());
        for (idx, &scale) in scales.iter().enumerate() {
            hits.extend(self.evaluate_scale(source, template, idx, scale)?);
        }
        Ok(hits)
    }

    /// Resamples the template to `scale` and correlates it, or returns
    /// `None` when the scaled template does not fit strictly inside the source.
    fn evaluate_scale(
        &self,
        source: ImageView<'_, u8>,
        template: ImageView<'_, u8>,
        scale_idx: usize,
        scale: f32,
    ) -> VisionResult<Option<ScaleHit>> {
        let dims = scaled_len(template.width(), scale).zip(scaled_len(template.height(), scale));
        let Some((width, height)) = dims else {
            return Ok(None);
        };
        if width >= source.width() || height >= source.height() {
            trace_debug!("scale skipped", scale = scale, width = width, height = height);
            return Ok(None);
        }

        let scaled = resize_u8_bilinear(template, width, height)?;
        let corr = self.correlator.correlate(source, scaled.view())?;
        trace_debug!("scale scored", scale = scale, score = corr.score);
        Ok(Some(ScaleHit {
            score: corr.score,
            scale_idx,
            scale,
            x: corr.x,
            y: corr.y,
            width,
            height,
        }))
    }
}
