//! Per-scale match candidates and their deterministic ranking.

use std::cmp::Ordering;

/// Best placement found at one scale of the search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ScaleHit {
    /// Similarity in `[0, 1]`.
    pub score: f32,
    /// Index into the scale sequence; smaller means smaller scale.
    pub scale_idx: usize,
    pub scale: f32,
    /// Top-left corner in source pixels.
    pub x: usize,
    pub y: usize,
    /// Scaled template size in pixels.
    pub width: usize,
    pub height: usize,
}

/// Orders hits by descending score, then ascending scale, then position.
pub(crate) fn hit_cmp_desc(a: &ScaleHit, b: &ScaleHit) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.scale_idx.cmp(&b.scale_idx))
        .then_with(|| a.y.cmp(&b.y))
        .then_with(|| a.x.cmp(&b.x))
}

/// Sorts hits best-first and keeps at most `limit` of them.
pub(crate) fn rank_and_truncate(hits: &mut Vec<ScaleHit>, limit: usize) {
    hits.sort_by(hit_cmp_desc);
    hits.truncate(limit);
}

/// Tracks the single best hit across scales visited in ascending order.
///
/// A hit replaces the current best only when its score is strictly greater
/// and reaches `threshold`, so among equal scores the smallest scale wins.
pub(crate) struct BestHit {
    threshold: f32,
    best: Option<ScaleHit>,
}

impl BestHit {
    pub(crate) fn new(threshold: f32) -> Self {
        Self {
            threshold,
            best: None,
        }
    }

    pub(crate) fn offer(&mut self, hit: ScaleHit) {
        let current = self.best.map_or(0.0, |b| b.score);
        if hit.score > current && hit.score >= self.threshold {
            self.best = Some(hit);
        }
    }

    pub(crate) fn into_inner(self) -> Option<ScaleHit> {
        self.best
    }
}
