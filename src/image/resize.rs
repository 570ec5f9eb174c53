//! Bilinear resampling of grayscale images.

use crate::image::{ImageView, OwnedImage};
use crate::util::math::round_u8;
use crate::util::{VisionError, VisionResult};

/// Resizes a grayscale image to `width`x`height` with bilinear interpolation.
///
/// Pixel centers are aligned, so the destination pixel `(x, y)` samples the
/// source at `((x + 0.5) * sx - 0.5, (y + 0.5) * sy - 0.5)` where `sx` and
/// `sy` are the source-to-destination size ratios. Source coordinates are
/// clamped to the image, so edges replicate. Results are rounded to the
/// nearest integer. Resizing to the source size returns an identical copy.
pub fn resize_u8_bilinear(
    src: ImageView<'_, u8>,
    width: usize,
    height: usize,
) -> VisionResult<OwnedImage> {
    if width == 0 || height == 0 {
        return Err(VisionError::InvalidDimensions { width, height });
    }
    if width == src.width() && height == src.height() {
        return OwnedImage::from_view(src);
    }

    let xs = axis_taps(src.width(), width);
    let ys = axis_taps(src.height(), height);
    let data = src.as_slice();
    let stride = src.stride();

    let mut out = Vec::with_capacity(width * height);
    for &(y0, y1, fy) in &ys {
        let row0 = &data[y0 * stride..];
        let row1 = &data[y1 * stride..];
        for &(x0, x1, fx) in &xs {
            let a = row0[x0] as f32;
            let b = row0[x1] as f32;
            let c = row1[x0] as f32;
            let d = row1[x1] as f32;
            let top = a + (b - a) * fx;
            let bottom = c + (d - c) * fx;
            out.push(round_u8(top + (bottom - top) * fy));
        }
    }

    Ok(OwnedImage::from_parts(out, width, height))
}

/// Precomputes the two source taps and blend weight for each output index.
fn axis_taps(src_len: usize, dst_len: usize) -> Vec<(usize, usize, f32)> {
    let ratio = src_len as f64 / dst_len as f64;
    let max = (src_len - 1) as f64;
    (0..dst_len)
        .map(|i| {
            let pos = ((i as f64 + 0.5) * ratio - 0.5).clamp(0.0, max);
            let i0 = pos.floor() as usize;
            let i1 = (i0 + 1).min(src_len - 1);
            (i0, i1, (pos - i0 as f64) as f32)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::resize_u8_bilinear;
    use crate::image::ImageView;

    #[test]
    fn same_size_is_identity() {
        let data: Vec<u8> = (0u8..12).collect();
        let view = ImageView::from_slice(&data, 4, 3).unwrap();
        let out = resize_u8_bilinear(view, 4, 3).unwrap();
        assert_eq!(out.data(), data.as_slice());
    }

    #[test]
    fn upscale_interpolates_between_neighbors() {
        let data = [0u8, 100];
        let view = ImageView::from_slice(&data, 2, 1).unwrap();
        let out = resize_u8_bilinear(view, 4, 1).unwrap();
        // Taps land at -0.25 (clamped), 0.25, 0.75 and 1.25 (clamped).
        assert_eq!(out.data(), &[0, 25, 75, 100]);
    }

    #[test]
    fn downscale_of_constant_stays_constant() {
        let data = vec![77u8; 30 * 20];
        let view = ImageView::from_slice(&data, 30, 20).unwrap();
        let out = resize_u8_bilinear(view, 13, 7).unwrap();
        assert!(out.data().iter().all(|&v| v == 77));
        assert_eq!((out.width(), out.height()), (13, 7));
    }

    #[test]
    fn respects_source_stride() {
        let data = [10u8, 20, 255, 30, 40, 255];
        let view = ImageView::new(&data, 2, 2, 3).unwrap();
        let out = resize_u8_bilinear(view, 1, 1).unwrap();
        assert_eq!(out.data(), &[25]);
    }
}
