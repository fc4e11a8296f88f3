//! Per-pixel arithmetic shared by the effects.
//!
//! Blend weights are deliberately not required to sum to one. Every result is
//! clamped into `[0, 255]` so nothing wraps around.

use image::{Rgb, Rgb32FImage, RgbImage};

/// Round half to even and clamp into the 8-bit range.
#[inline]
pub fn saturate(value: f32) -> u8 {
    value.round_ties_even().clamp(0.0, 255.0) as u8
}

/// `image * alpha + fill * beta + gamma` for every channel of every pixel.
pub fn add_weighted_fill(
    image: &RgbImage,
    alpha: f32,
    fill: Rgb<u8>,
    beta: f32,
    gamma: f32,
) -> RgbImage {
    let mut output = image.clone();

    for pixel in output.pixels_mut() {
        for i in 0..3 {
            pixel[i] = saturate(pixel[i] as f32 * alpha + fill[i] as f32 * beta + gamma);
        }
    }

    output
}

/// Linear brightness/contrast adjustment: `image * alpha + beta`.
pub fn convert_scale(image: &RgbImage, alpha: f32, beta: f32) -> RgbImage {
    add_weighted_fill(image, alpha, Rgb([0, 0, 0]), 0.0, beta)
}

/// Float variant of [`add_weighted_fill`] used while an effect still works on
/// an unquantized layer. Values are clamped but not rounded.
pub fn add_weighted_fill_f32(image: &mut Rgb32FImage, alpha: f32, fill: Rgb<u8>, beta: f32) {
    for pixel in image.pixels_mut() {
        for i in 0..3 {
            pixel[i] = (pixel[i] * alpha + fill[i] as f32 * beta).clamp(0.0, 255.0);
        }
    }
}

/// `base * alpha + overlay * beta`, clamped, written back into `base`.
pub fn add_weighted_layer_f32(
    base: &mut Rgb32FImage,
    alpha: f32,
    overlay: &Rgb32FImage,
    beta: f32,
) {
    for (pixel, layer) in base.pixels_mut().zip(overlay.pixels()) {
        for i in 0..3 {
            pixel[i] = (pixel[i] * alpha + layer[i] * beta).clamp(0.0, 255.0);
        }
    }
}

/// Quantize a float layer with a final `* alpha + beta` adjustment.
pub fn quantize_scaled(image: &Rgb32FImage, alpha: f32, beta: f32) -> RgbImage {
    let (width, height) = image.dimensions();
    let mut output = RgbImage::new(width, height);

    for (dst, src) in output.pixels_mut().zip(image.pixels()) {
        for i in 0..3 {
            dst[i] = saturate(src[i] * alpha + beta);
        }
    }

    output
}

pub fn to_f32(image: &RgbImage) -> Rgb32FImage {
    let (width, height) = image.dimensions();
    let mut output = Rgb32FImage::new(width, height);

    for (dst, src) in output.pixels_mut().zip(image.pixels()) {
        *dst = Rgb([src[0] as f32, src[1] as f32, src[2] as f32]);
    }

    output
}

/// Mirror an out-of-range index back into `0..len` without repeating the
/// edge sample (`-1 -> 1`, `len -> len - 2`).
pub fn reflect_101(index: i64, len: usize) -> usize {
    if len <= 1 {
        return 0;
    }

    let last = len as i64 - 1;
    let period = 2 * last;
    let mut index = index.rem_euclid(period);
    if index > last {
        index = period - index;
    }

    index as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturate() {
        assert_eq!(saturate(-3.0), 0);
        assert_eq!(saturate(300.0), 255);
        assert_eq!(saturate(29.4), 29);
        assert_eq!(saturate(2.5), 2);
        assert_eq!(saturate(3.5), 4);
    }

    #[test]
    fn test_add_weighted_fill_does_not_wrap() {
        let image = RgbImage::from_pixel(2, 2, Rgb([250, 10, 128]));
        let output = add_weighted_fill(&image, 1.0, Rgb([100, 0, 0]), 1.0, -20.0);

        assert_eq!(output.get_pixel(0, 0), &Rgb([255, 0, 108]));
    }

    #[test]
    fn test_convert_scale() {
        let image = RgbImage::from_pixel(1, 1, Rgb([100, 4, 255]));
        let output = convert_scale(&image, 0.95, -5.0);

        assert_eq!(output.get_pixel(0, 0), &Rgb([90, 0, 237]));
    }

    #[test]
    fn test_reflect_101() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(-2, 5), 2);
        assert_eq!(reflect_101(0, 5), 0);
        assert_eq!(reflect_101(4, 5), 4);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(6, 5), 2);
        assert_eq!(reflect_101(-9, 5), 1);
        assert_eq!(reflect_101(-3, 1), 0);
    }
}
