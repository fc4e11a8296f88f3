use crate::{
    Effect, ImageEffectResult,
    blend::{add_weighted_fill, convert_scale},
    colour_space::scale_value,
};
use derivative::Derivative;
use derive_setters::Setters;
use image::{Rgb, RgbImage};

/// Night conversion: darken in HSV, tint towards dark blue, then drop the
/// contrast. The defaults are hand-tuned and should not need changing.
#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct NightConfig {
    #[derivative(Default(value = "0.2"))]
    brightness: f32,

    #[derivative(Default(value = "Rgb([90, 30, 30])"))]
    tint: Rgb<u8>,

    #[derivative(Default(value = "0.4"))]
    image_weight: f32,

    #[derivative(Default(value = "0.1"))]
    tint_weight: f32,

    #[derivative(Default(value = "0.7"))]
    contrast: f32,
}

impl NightConfig {
    pub fn new() -> Self {
        Self::default()
    }

    fn render(&self, image: &RgbImage) -> RgbImage {
        let mut darkened = image.clone();
        for pixel in darkened.pixels_mut() {
            pixel.0 = scale_value(pixel.0, self.brightness);
        }

        // The weights sum to 0.5 on purpose, the tint also dims the frame.
        let tinted =
            add_weighted_fill(&darkened, self.image_weight, self.tint, self.tint_weight, 0.0);

        convert_scale(&tinted, self.contrast, 0.0)
    }
}

impl Effect for NightConfig {
    fn apply(&self, image: &RgbImage) -> ImageEffectResult<RgbImage> {
        Ok(self.render(image))
    }
}

/// Night conversion with the default constants.
pub fn night(image: &RgbImage) -> RgbImage {
    NightConfig::new().render(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mean_brightness(image: &RgbImage) -> f64 {
        let sum: u64 = image.as_raw().iter().map(|&v| v as u64).sum();
        sum as f64 / image.as_raw().len() as f64
    }

    #[test]
    fn test_white_image_becomes_dark() {
        let image = RgbImage::from_pixel(100, 100, Rgb([255, 255, 255]));
        let output = night(&image);

        assert_eq!(output.dimensions(), (100, 100));
        assert!(mean_brightness(&output) < 50.0);

        // v: 255 * 0.2 = 51, tint: 51 * 0.4 + (90|30) * 0.1, contrast: * 0.7
        assert_eq!(output.get_pixel(0, 0), &Rgb([20, 16, 16]));
        assert_eq!(output.get_pixel(99, 99), &Rgb([20, 16, 16]));
    }

    #[test]
    fn test_black_image_only_gets_tint() {
        let image = RgbImage::new(4, 3);
        let output = night(&image);

        // 90 * 0.1 * 0.7 = 6.3, 30 * 0.1 * 0.7 = 2.1
        assert!(output.pixels().all(|p| *p == Rgb([6, 2, 2])));
    }

    #[test]
    fn test_effect_matches_free_function() -> anyhow::Result<()> {
        let image = RgbImage::from_fn(16, 9, |x, y| Rgb([(x * 15) as u8, (y * 28) as u8, 200]));
        assert_eq!(NightConfig::new().apply(&image)?, night(&image));
        Ok(())
    }

    #[test]
    fn test_custom_brightness() -> anyhow::Result<()> {
        let image = RgbImage::from_pixel(2, 2, Rgb([255, 255, 255]));
        let bright = NightConfig::new().with_brightness(1.0).apply(&image)?;

        // 255 * 0.4 + 9 = 111 -> * 0.7 = 77.7
        assert_eq!(bright.get_pixel(1, 1)[0], 78);
        Ok(())
    }
}
