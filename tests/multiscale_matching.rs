use gamevision::kernel::{Correlation, Correlator};
use gamevision::lowlevel::resize_u8_bilinear;
use gamevision::search::ScaleSteps;
use gamevision::{ImageView, MultiScaleConfig, MultiScaleMatcher, Point, Template, VisionResult};

fn make_template(width: usize, height: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let value = ((x * 11) ^ (y * 3) ^ (x * y)) & 0xFF;
            data.push(value as u8);
        }
    }
    data
}

fn make_background(width: usize, height: usize) -> Vec<u8> {
    let mut state = 0x2545_f491u32;
    (0..width * height)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        })
        .collect()
}

fn paste(dst: &mut [u8], dst_width: usize, src: &[u8], src_width: usize, x0: usize, y0: usize) {
    for (row, chunk) in src.chunks_exact(src_width).enumerate() {
        let start = (y0 + row) * dst_width + x0;
        dst[start..start + src_width].copy_from_slice(chunk);
    }
}

/// 200x200 scene holding the 50x50 template enlarged to 60x60 at (70, 80).
fn scene() -> (Vec<u8>, Template) {
    let template = Template::new(make_template(50, 50), 50, 50).unwrap();
    let enlarged = resize_u8_bilinear(template.view(), 60, 60).unwrap();
    let mut source = make_background(200, 200);
    paste(&mut source, 200, enlarged.data(), 60, 70, 80);
    (source, template)
}

#[test]
fn finds_enlarged_template_at_its_scale() {
    let (source, template) = scene();
    let cfg = MultiScaleConfig::new(0.8, 1.3, 0.05, 0.9, 3).unwrap();
    let found = MultiScaleMatcher::new()
        .match_best_scale(
            ImageView::from_slice(&source, 200, 200).unwrap(),
            template.view(),
            &cfg,
        )
        .unwrap();

    assert!(found.similarity > 0.99, "similarity {}", found.similarity);
    assert_eq!(found.confidence, found.similarity);
    assert!((found.scale - 1.2).abs() < 1e-3, "scale {}", found.scale);
    assert_eq!(found.location, Point::new(70, 80));
    assert_eq!(found.bounding_box.min, Point::new(70, 80));
    assert_eq!(found.bounding_box.max, Point::new(130, 140));
}

#[test]
fn match_all_is_sorted_and_limited() {
    let (source, template) = scene();
    let cfg = MultiScaleConfig::new(0.8, 1.3, 0.05, 0.0, 3).unwrap();
    let all = MultiScaleMatcher::new()
        .match_all_scales(
            ImageView::from_slice(&source, 200, 200).unwrap(),
            template.view(),
            &cfg,
        )
        .unwrap();

    assert!(!all.is_empty() && all.len() <= 3);
    assert!((all[0].scale - 1.2).abs() < 1e-3);
    for pair in all.windows(2) {
        assert!(pair[0].similarity >= pair[1].similarity);
    }
    for hit in &all {
        let w = (50.0 * hit.scale as f64).round() as i32;
        assert_eq!(hit.bounding_box.width(), w);
        assert_eq!(hit.bounding_box.height(), w);
    }
}

#[test]
fn scale_range_includes_both_ends() {
    let scales: Vec<f32> = ScaleSteps::new(0.5, 1.0, 0.25).collect();
    assert_eq!(scales, vec![0.5, 0.75, 1.0]);

    let scales: Vec<f32> = ScaleSteps::new(1.0, 1.1, 0.05).collect();
    assert_eq!(scales.len(), 3);
    assert!((scales[2] - 1.1).abs() < 1e-6);

    assert_eq!(ScaleSteps::new(1.0, 1.0, 0.1).len(), 1);
}

#[test]
fn solid_source_reports_not_found() {
    let source = vec![128u8; 120 * 120];
    let template = Template::new(make_template(20, 20), 20, 20).unwrap();
    let view = ImageView::from_slice(&source, 120, 120).unwrap();
    let cfg = MultiScaleConfig::new(0.8, 1.2, 0.1, 0.0, 5).unwrap();
    let matcher = MultiScaleMatcher::new();

    let best = matcher.match_best_scale(view, template.view(), &cfg).unwrap();
    assert!(!best.is_found());
    assert_eq!(best, Default::default());

    let all = matcher.match_all_scales(view, template.view(), &cfg).unwrap();
    assert!(all.is_empty());
}

#[test]
fn template_larger_than_source_reports_not_found() {
    let source = make_background(30, 30);
    let template = Template::new(make_template(40, 40), 40, 40).unwrap();
    let best = MultiScaleMatcher::new()
        .match_best_scale(
            ImageView::from_slice(&source, 30, 30).unwrap(),
            template.view(),
            &MultiScaleConfig::default(),
        )
        .unwrap();
    assert!(!best.is_found());
}

#[test]
fn repeated_searches_are_identical() {
    let (source, template) = scene();
    let view = ImageView::from_slice(&source, 200, 200).unwrap();
    let cfg = MultiScaleConfig::new(0.8, 1.3, 0.05, 0.5, 4).unwrap();
    let matcher = MultiScaleMatcher::new();
    let first = matcher.match_all_scales(view, template.view(), &cfg).unwrap();
    let second = matcher.match_all_scales(view, template.view(), &cfg).unwrap();
    assert_eq!(first, second);
}

/// Scores grow with template width, so the best scales come last.
struct GrowingWithWidth;

impl Correlator for GrowingWithWidth {
    fn correlate(
        &self,
        _source: ImageView<'_, u8>,
        template: ImageView<'_, u8>,
    ) -> VisionResult<Correlation> {
        Ok(Correlation {
            score: template.width() as f32 / 100.0,
            x: 0,
            y: 0,
        })
    }
}

#[test]
fn results_are_sorted_before_truncation() {
    let source = vec![0u8; 100 * 100];
    let template = Template::new(vec![0u8; 40 * 40], 40, 40).unwrap();
    let cfg = MultiScaleConfig::new(0.5, 1.0, 0.1, 0.0, 2).unwrap();
    let all = MultiScaleMatcher::with_correlator(GrowingWithWidth)
        .match_all_scales(
            ImageView::from_slice(&source, 100, 100).unwrap(),
            template.view(),
            &cfg,
        )
        .unwrap();

    assert_eq!(all.len(), 2);
    assert_eq!(all[0].bounding_box.width(), 40);
    assert_eq!(all[1].bounding_box.width(), 36);
}

#[test]
fn threshold_filters_best_match() {
    let source = vec![0u8; 100 * 100];
    let template = Template::new(vec![0u8; 40 * 40], 40, 40).unwrap();
    let cfg = MultiScaleConfig::new(0.5, 1.0, 0.1, 0.35, 5).unwrap();
    let matcher = MultiScaleMatcher::with_correlator(GrowingWithWidth);
    let view = ImageView::from_slice(&source, 100, 100).unwrap();

    let all = matcher.match_all_scales(view, template.view(), &cfg).unwrap();
    assert!(all.iter().all(|m| m.similarity >= 0.35));
    assert_eq!(all.len(), 2);

    let strict = MultiScaleConfig::new(0.5, 1.0, 0.1, 0.9, 5).unwrap();
    let best = matcher.match_best_scale(view, template.view(), &strict).unwrap();
    assert!(!best.is_found());
}

#[test]
fn solid_template_never_matches_solid_source() {
    let source = vec![40u8; 100 * 100];
    let template = Template::new(vec![200u8; 20 * 20], 20, 20).unwrap();
    let cfg = MultiScaleConfig::new(0.8, 1.2, 0.1, 0.9, 5).unwrap();
    let best = MultiScaleMatcher::new()
        .match_best_scale(
            ImageView::from_slice(&source, 100, 100).unwrap(),
            template.view(),
            &cfg,
        )
        .unwrap();
    assert_eq!(best.similarity, 0.0);
}

#[test]
fn ssd_metric_drives_the_search() {
    let (source, template) = scene();
    let cfg = MultiScaleConfig::new(0.8, 1.3, 0.05, 0.9, 3).unwrap();
    let found = MultiScaleMatcher::with_correlator(gamevision::Metric::Ssd.correlator())
        .match_best_scale(
            ImageView::from_slice(&source, 200, 200).unwrap(),
            template.view(),
            &cfg,
        )
        .unwrap();
    assert!(found.similarity > 0.999, "similarity {}", found.similarity);
    assert_eq!(found.location, Point::new(70, 80));
    assert!((found.scale - 1.2).abs() < 1e-3);
}
