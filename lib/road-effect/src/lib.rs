pub mod blend;
pub mod colour_space;
pub mod motion_blur_effect;
pub mod night_effect;
pub mod rain_effect;

pub use motion_blur_effect::{MotionBlurConfig, SpeedBucket, motion_blur};
pub use night_effect::{NightConfig, night};
pub use rain_effect::{RainFogConfig, rain_and_fog};

use image::RgbImage;

pub type ImageEffectResult<T> = Result<T, ImageEffectError>;

#[derive(thiserror::Error, Debug)]
pub enum ImageEffectError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Image processing error: {0}")]
    ImageProc(String),
}

/// A fixed pixel-level transform. The input is never modified and the output
/// always has the same dimensions as the input.
pub trait Effect {
    fn apply(&self, image: &RgbImage) -> ImageEffectResult<RgbImage>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_effects_preserve_dimensions() -> anyhow::Result<()> {
        let image = RgbImage::from_fn(37, 23, |x, y| Rgb([(x * 7) as u8, (y * 11) as u8, 90]));

        let night = NightConfig::new();
        let rain = RainFogConfig::new().with_seed(Some(7));
        let blur = MotionBlurConfig::new().with_degree(5).with_angle(30.0);
        let effects: [(&str, &dyn Effect); 3] =
            [("night", &night), ("rain", &rain), ("motion blur", &blur)];

        for (name, effect) in effects {
            let output = effect.apply(&image)?;
            assert_eq!(output.dimensions(), image.dimensions(), "{name}");
            assert_eq!(output.as_raw().len(), image.as_raw().len(), "{name}");
        }

        Ok(())
    }
}
