use anyhow::{Context, Result};
use derivative::Derivative;
use image::Rgb;
use road_effect::{MotionBlurConfig, NightConfig, RainFogConfig, SpeedBucket};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Effect parameters and output folders. Every section may be left out of
/// the file, missing keys keep their defaults.
#[derive(Serialize, Deserialize, Default, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub night: Night,
    pub rain: Rain,
    pub motion_blur: MotionBlur,
    pub output: Output,
}

#[derive(Serialize, Deserialize, Debug, Clone, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct Night {
    #[derivative(Default(value = "0.2"))]
    pub brightness: f32,

    // RGB
    #[derivative(Default(value = "[90, 30, 30]"))]
    pub tint: [u8; 3],

    #[derivative(Default(value = "0.4"))]
    pub image_weight: f32,

    #[derivative(Default(value = "0.1"))]
    pub tint_weight: f32,

    #[derivative(Default(value = "0.7"))]
    pub contrast: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct Rain {
    #[derivative(Default(value = "0.5"))]
    pub intensity: f32,

    // degrees
    #[derivative(Default(value = "5.0"))]
    pub angle: f32,

    #[derivative(Default(value = "15"))]
    pub drop_length: u32,

    #[derivative(Default(value = "1"))]
    pub drop_width: u32,

    #[derivative(Default(value = "0.8"))]
    pub fog_intensity: f32,

    pub seed: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct MotionBlur {
    // degrees, counter-clockwise from horizontal
    #[derivative(Default(value = "0.0"))]
    pub angle: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct Output {
    #[derivative(Default(value = "PathBuf::from(\"Night/night_darker\")"))]
    pub night_dir: PathBuf,

    #[derivative(Default(value = "PathBuf::from(\"rainy_potholes\")"))]
    pub rain_dir: PathBuf,

    #[derivative(Default(value = "PathBuf::from(\"blurred_images\")"))]
    pub motion_blur_dir: PathBuf,
}

impl Config {
    /// Read `path`, or fall back to the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            log::debug!("No config file, using defaults");
            return Ok(Self::default());
        };

        let text = fs::read_to_string(path)
            .with_context(|| format!("read config file {} failed", path.display()))?;

        let config = toml::from_str::<Config>(&text)
            .with_context(|| format!("parse config file {} failed", path.display()))?;

        log::debug!("{config:?}");
        Ok(config)
    }
}

impl Night {
    pub fn effect(&self) -> NightConfig {
        NightConfig::new()
            .with_brightness(self.brightness)
            .with_tint(Rgb(self.tint))
            .with_image_weight(self.image_weight)
            .with_tint_weight(self.tint_weight)
            .with_contrast(self.contrast)
    }
}

impl Rain {
    pub fn effect(&self) -> RainFogConfig {
        RainFogConfig::new()
            .with_intensity(self.intensity)
            .with_angle(self.angle)
            .with_drop_length(self.drop_length)
            .with_drop_width(self.drop_width)
            .with_fog_intensity(self.fog_intensity)
            .with_seed(self.seed)
    }
}

impl MotionBlur {
    pub fn effect(&self, bucket: SpeedBucket) -> MotionBlurConfig {
        MotionBlurConfig::from_bucket(bucket).with_angle(self.angle)
    }
}
