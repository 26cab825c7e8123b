//! Colour-mapped image synthesis from a raster.
//!
//! 1. Scale the whole raster by one scalar, `1 / max|v|` (skipped for an
//!    all-zero raster).
//! 2. Sample it with integer strides `max(1, floor(raster / image))` per axis.
//!    Indices past the raster edge are clamped to the last row / column.
//! 3. Colour each pixel with `palette(|v|)`.
//! 4. Flip vertically: raster row 0 is the bottom image row.
use image::{Rgb, RgbImage};
use log::debug;
use ndarray::Array2;

use crate::palette::Palette;

/// Largest absolute value of `raster`, ignoring NaN.  0 for an empty raster.
pub fn max_abs(raster: &Array2<f64>) -> f64 {
    raster
        .iter()
        .filter(|v| !v.is_nan())
        .fold(0.0_f64, |m, &v| m.max(v.abs()))
}

/// Render `raster` ([H, W]) into an `image_size = (width, height)` RGB image.
pub fn render_image(raster: &Array2<f64>, image_size: (u32, u32), palette: Palette) -> RgbImage {
    let (img_w, img_h) = image_size;
    let (n_rows, n_cols) = raster.dim();
    let mut img = RgbImage::from_pixel(img_w, img_h, Rgb(palette.rgb(0.0)));
    if n_rows == 0 || n_cols == 0 {
        return img;
    }

    let peak = max_abs(raster);
    let scale = if peak > 0.0 && peak.is_finite() { 1.0 / peak } else { 1.0 };

    let stride_x = (n_cols / img_w.max(1) as usize).max(1);
    let stride_y = (n_rows / img_h.max(1) as usize).max(1);
    debug!(
        "render {n_rows}x{n_cols} raster → {img_w}x{img_h} image, stride ({stride_x}, {stride_y}), peak {peak:.4e}"
    );

    for py in 0..img_h {
        let row = (py as usize * stride_y).min(n_rows - 1);
        let out_y = img_h - 1 - py;
        for px in 0..img_w {
            let col = (px as usize * stride_x).min(n_cols - 1);
            let v = (raster[[row, col]] * scale).abs();
            img.put_pixel(px, out_y, Rgb(palette.rgb(v)));
        }
    }
    img
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn zero_raster_is_palette_zero() {
        for p in Palette::ALL {
            let img = render_image(&Array2::zeros((16, 16)), (8, 8), p);
            assert!(img.pixels().all(|px| px.0 == p.rgb(0.0)), "{p}");
        }
    }

    #[test]
    fn global_scaling_uses_max_abs() {
        let raster = array![[0.0, -4.0], [2.0, 1.0]];
        let img = render_image(&raster, (2, 2), Palette::Hot);
        // raster row 0 → bottom image row (y = 1)
        assert_eq!(img.get_pixel(1, 1).0, Palette::Hot.rgb(1.0));
        assert_eq!(img.get_pixel(0, 0).0, Palette::Hot.rgb(0.5));
        assert_eq!(img.get_pixel(1, 0).0, Palette::Hot.rgb(0.25));
        assert_eq!(img.get_pixel(0, 1).0, Palette::Hot.rgb(0.0));
    }

    #[test]
    fn downsampling_uses_integer_stride() {
        // 8 columns onto 4 pixels: stride 2 → columns 0, 2, 4, 6.
        let raster = Array2::from_shape_fn((1, 8), |(_, c)| c as f64 + 1.0);
        let img = render_image(&raster, (4, 1), Palette::Bone);
        for px in 0..4u32 {
            let expect = Palette::Bone.rgb((2 * px + 1) as f64 / 8.0);
            assert_eq!(img.get_pixel(px, 0).0, expect);
        }
    }

    #[test]
    fn image_larger_than_raster_clamps_to_edge() {
        let raster = array![[1.0, 0.5]];
        let img = render_image(&raster, (4, 3), Palette::Jet);
        assert_eq!(img.dimensions(), (4, 3));
        assert_eq!(img.get_pixel(3, 0).0, Palette::Jet.rgb(0.5));
        assert_eq!(img.get_pixel(0, 2).0, Palette::Jet.rgb(1.0));
    }

    #[test]
    fn max_abs_skips_nan() {
        assert_eq!(max_abs(&array![[f64::NAN, -3.0], [2.0, 0.0]]), 3.0);
        assert_eq!(max_abs(&Array2::zeros((0, 0))), 0.0);
    }
}
