//! Whole-image similarity between two pixel buffers.

use crate::geometry::Point;
use crate::image::resize::resize_u8_bilinear;
use crate::image::PixelBuffer;
use crate::kernel::{Correlator, Zncc};
use crate::trace::trace_event;
use crate::util::VisionResult;

/// Hue bins of the hue/saturation histogram (hue spans `0..180`).
const HUE_BINS: usize = 50;
/// Saturation bins of the hue/saturation histogram (saturation spans `0..256`).
const SAT_BINS: usize = 60;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CompareMethod {
    /// Single-scale ZNCC search of the second image inside the first.
    #[default]
    Template,
    /// Correlation of hue/saturation histograms; ignores layout.
    Histogram,
    /// `1 - mean(|a - b|) / 255` on grayscale after resizing `b` to `a`.
    MeanAbsolute,
}

/// Outcome of [`compare_images`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Comparison {
    /// Similarity in `[0, 1]`.
    pub similarity: f32,
    /// Top-left of the best placement; only `Template` reports one.
    pub location: Option<Point>,
    pub method: CompareMethod,
}

/// Scores how similar `second` is to `first`.
///
/// `Template` requires `second` to fit inside `first`.
pub fn compare_images(
    first: &PixelBuffer,
    second: &PixelBuffer,
    method: CompareMethod,
) -> VisionResult<Comparison> {
    let (similarity, location) = match method {
        CompareMethod::Template => {
            let a = first.to_luma();
            let b = second.to_luma();
            let found = Zncc.correlate(a.view(), b.view())?;
            (
                found.score,
                Some(Point::new(found.x as i32, found.y as i32)),
            )
        }
        CompareMethod::Histogram => (histogram_similarity(first, second), None),
        CompareMethod::MeanAbsolute => (mean_absolute_similarity(first, second)?, None),
    };
    trace_event!("compare", similarity = similarity);
    Ok(Comparison {
        similarity,
        location,
        method,
    })
}

/// Converts RGB to hue in `0..180` and saturation in `0..=255`.
fn hue_saturation(r: u8, g: u8, b: u8) -> (f32, f32) {
    let (r, g, b) = (r as f32, g as f32, b as f32);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let sat = if max > 0.0 { delta / max * 255.0 } else { 0.0 };
    if delta == 0.0 {
        return (0.0, sat);
    }
    let mut hue = if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    if hue < 0.0 {
        hue += 360.0;
    }
    (hue / 2.0, sat)
}

fn hs_histogram(pixels: &PixelBuffer) -> Vec<f64> {
    let mut hist = vec![0.0f64; HUE_BINS * SAT_BINS];
    for px in pixels.as_rgba().chunks_exact(4) {
        let (h, s) = hue_saturation(px[0], px[1], px[2]);
        let hb = ((h / 180.0 * HUE_BINS as f32) as usize).min(HUE_BINS - 1);
        let sb = ((s / 256.0 * SAT_BINS as f32) as usize).min(SAT_BINS - 1);
        hist[hb * SAT_BINS + sb] += 1.0;
    }
    hist
}

fn histogram_similarity(first: &PixelBuffer, second: &PixelBuffer) -> f32 {
    let h1 = hs_histogram(first);
    let h2 = hs_histogram(second);
    // Normalize to frequencies so image size does not matter.
    let n1 = (first.width() * first.height()) as f64;
    let n2 = (second.width() * second.height()) as f64;
    // Frequencies sum to one, so both histograms share the same mean.
    let mean = 1.0 / h1.len() as f64;

    let (mut num, mut d1, mut d2) = (0.0f64, 0.0f64, 0.0f64);
    for (a, b) in h1.iter().zip(&h2) {
        let da = a / n1 - mean;
        let db = b / n2 - mean;
        num += da * db;
        d1 += da * da;
        d2 += db * db;
    }
    let denom = (d1 * d2).sqrt();
    if denom <= f64::EPSILON {
        return 0.0;
    }
    (num / denom).clamp(0.0, 1.0) as f32
}

fn mean_absolute_similarity(first: &PixelBuffer, second: &PixelBuffer) -> VisionResult<f32> {
    let a = first.to_luma();
    let b = resize_u8_bilinear(second.to_luma().view(), a.width(), a.height())?;
    let total: u64 = a
        .data()
        .iter()
        .zip(b.data())
        .map(|(&x, &y)| u64::from(x.abs_diff(y)))
        .sum();
    let mean = total as f64 / a.data().len() as f64;
    Ok((1.0 - mean / 255.0).clamp(0.0, 1.0) as f32)
}
