#![cfg(feature = "rayon")]

use gamevision::kernel::{Correlation, Correlator, Zncc, ZnccParallel};
use gamevision::lowlevel::resize_u8_bilinear;
use gamevision::{ImageView, MultiScaleConfig, MultiScaleMatcher, Template, VisionResult};

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

fn make_scene() -> (Vec<u8>, usize, usize, Template) {
    let (img_width, img_height) = (180, 140);
    let template = Template::new(make_template(40, 30), 40, 30).unwrap();
    let shrunk = resize_u8_bilinear(template.view(), 36, 27).unwrap();
    let mut image: Vec<u8> = (0..img_width * img_height)
        .map(|i| ((i * 37) % 97) as u8)
        .collect();
    for (row, chunk) in shrunk.data().chunks_exact(36).enumerate() {
        let start = (55 + row) * img_width + 90;
        image[start..start + 36].copy_from_slice(chunk);
    }
    (image, img_width, img_height, template)
}

#[test]
fn parallel_scales_match_sequential() {
    let (image, width, height, template) = make_scene();
    let view = ImageView::from_slice(&image, width, height).unwrap();
    let cfg = MultiScaleConfig::new(0.7, 1.3, 0.05, 0.2, 8).unwrap();

    let seq = MultiScaleMatcher::new();
    let par = MultiScaleMatcher::new().with_parallel(true);

    let seq_best = seq.match_best_scale(view, template.view(), &cfg).unwrap();
    let par_best = par.match_best_scale(view, template.view(), &cfg).unwrap();
    assert_eq!(seq_best, par_best);
    assert!((seq_best.scale - 0.9).abs() < 1e-3);

    let seq_all = seq.match_all_scales(view, template.view(), &cfg).unwrap();
    let par_all = par.match_all_scales(view, template.view(), &cfg).unwrap();
    assert_eq!(seq_all, par_all);
}

#[test]
fn parallel_kernel_matches_scalar_kernel() {
    let (image, width, height, template) = make_scene();
    let view = ImageView::from_slice(&image, width, height).unwrap();
    let tpl = template.resized(36, 27).unwrap();

    let scalar = Zncc.correlate(view, tpl.view()).unwrap();
    let parallel = ZnccParallel.correlate(view, tpl.view()).unwrap();
    assert_eq!(scalar, parallel);
    assert_eq!((scalar.x, scalar.y), (90, 55));
}

/// Every scale scores the same, so only the tie-break decides.
struct Constant;

impl Correlator for Constant {
    fn correlate(
        &self,
        _source: ImageView<'_, u8>,
        _template: ImageView<'_, u8>,
    ) -> VisionResult<Correlation> {
        Ok(Correlation {
            score: 0.9,
            x: 1,
            y: 2,
        })
    }
}

#[test]
fn parallel_ties_resolve_to_the_smallest_scale() {
    let source = vec![0u8; 100 * 100];
    let view = ImageView::from_slice(&source, 100, 100).unwrap();
    let template = Template::new(vec![0u8; 20 * 20], 20, 20).unwrap();
    let cfg = MultiScaleConfig::new(0.5, 1.5, 0.25, 0.5, 5).unwrap();

    let seq = MultiScaleMatcher::with_correlator(Constant);
    let par = MultiScaleMatcher::with_correlator(Constant).with_parallel(true);

    let best = par.match_best_scale(view, template.view(), &cfg).unwrap();
    assert!((best.scale - 0.5).abs() < 1e-6, "scale {}", best.scale);
    assert_eq!(best, seq.match_best_scale(view, template.view(), &cfg).unwrap());

    let all = par.match_all_scales(view, template.view(), &cfg).unwrap();
    let scales: Vec<f32> = all.iter().map(|m| m.scale).collect();
    assert_eq!(scales, vec![0.5, 0.75, 1.0, 1.25, 1.5]);
    assert_eq!(all, seq.match_all_scales(view, template.view(), &cfg).unwrap());
}
