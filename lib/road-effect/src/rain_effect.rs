use crate::{
    Effect, ImageEffectError, ImageEffectResult,
    blend::{
        add_weighted_fill, add_weighted_fill_f32, add_weighted_layer_f32, quantize_scaled,
        reflect_101, to_f32,
    },
};
use derivative::Derivative;
use derive_setters::Setters;
use image::{Rgb, Rgb32FImage, RgbImage};
use imageproc::drawing::draw_antialiased_line_segment_mut;
use rand::{Rng, SeedableRng, rngs::StdRng};

const FOG_COLOR: Rgb<u8> = Rgb([170, 170, 170]);
const STREAK_COLOR: Rgb<f32> = Rgb([200.0, 200.0, 200.0]);
const MIN_DROP_LENGTH: u32 = 5;
const MIN_VISIBLE_LENGTH: i32 = 2;
const RAIN_WEIGHT: f32 = 0.7;

const WET_COLOR: Rgb<u8> = Rgb([30, 10, 10]);
const WET_BASE_WEIGHT: f32 = 0.9;
const WET_WEIGHT: f32 = 0.1;

const FINAL_CONTRAST: f32 = 0.95;
const FINAL_BRIGHTNESS: f32 = -5.0;

// 3x3 Gaussian with sigma derived from the kernel size
const SMOOTHING_KERNEL: [f32; 3] = [0.25, 0.5, 0.25];

/// Rain and fog configuration
#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct RainFogConfig {
    /// Rain strength, one streak per `100 / intensity` pixels
    #[derivative(Default(value = "0.5"))]
    intensity: f32,

    /// Falling angle in degrees from vertical
    #[derivative(Default(value = "5.0"))]
    angle: f32,

    #[derivative(Default(value = "15"))]
    drop_length: u32,

    #[derivative(Default(value = "1"))]
    drop_width: u32,

    /// Independent of `intensity`
    #[derivative(Default(value = "0.8"))]
    fog_intensity: f32,

    /// Fixed seed for reproducible streak placement
    #[derivative(Default(value = "None"))]
    seed: Option<u64>,
}

impl RainFogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drop_count(&self, width: u32, height: u32) -> usize {
        (self.intensity as f64 * width as f64 * height as f64 / 100.0).floor() as usize
    }

    fn validate(&self) -> ImageEffectResult<()> {
        if !self.intensity.is_finite() || self.intensity < 0.0 {
            return Err(ImageEffectError::InvalidParameter(format!(
                "rain intensity must be a non-negative number, got {}",
                self.intensity
            )));
        }

        if !(0.0..=1.0).contains(&self.fog_intensity) {
            return Err(ImageEffectError::InvalidParameter(format!(
                "fog intensity must be within [0, 1], got {}",
                self.fog_intensity
            )));
        }

        if self.drop_length < MIN_DROP_LENGTH {
            return Err(ImageEffectError::InvalidParameter(format!(
                "drop length must be at least {MIN_DROP_LENGTH}, got {}",
                self.drop_length
            )));
        }

        if self.drop_width == 0 {
            return Err(ImageEffectError::InvalidParameter(
                "drop width must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

impl Effect for RainFogConfig {
    fn apply(&self, image: &RgbImage) -> ImageEffectResult<RgbImage> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        rain_and_fog(image, self, &mut rng)
    }
}

impl RainFogConfig {
    /// Rain for one image of a batch. With a seed set, the streaks depend only
    /// on the seed and `key`, never on batch order or threading.
    pub fn apply_keyed(&self, image: &RgbImage, key: &str) -> ImageEffectResult<RgbImage> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(image_seed(seed, key)),
            None => StdRng::from_os_rng(),
        };

        rain_and_fog(image, self, &mut rng)
    }
}

/// Mixes `key` into `seed` with 64-bit FNV-1a.
pub fn image_seed(seed: u64, key: &str) -> u64 {
    key.bytes().fold(seed ^ 0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

/// Flat grey haze over the whole frame.
pub fn add_fog(image: &RgbImage, intensity: f32) -> RgbImage {
    add_weighted_fill(image, 1.0 - intensity, FOG_COLOR, intensity, 0.0)
}

/// Fog, rain streaks, a wet tint and a final darkening pass.
///
/// Streak placement comes from `rng`; pass a seeded generator for repeatable
/// output.
pub fn rain_and_fog<R: Rng>(
    image: &RgbImage,
    config: &RainFogConfig,
    rng: &mut R,
) -> ImageEffectResult<RgbImage> {
    config.validate()?;

    let fogged = add_fog(image, config.fog_intensity);

    let streaks = draw_streaks(config, image.width(), image.height(), rng);
    let streaks = smooth(&streaks);

    let mut composite = to_f32(&fogged);
    add_weighted_layer_f32(&mut composite, 1.0, &streaks, RAIN_WEIGHT);
    add_weighted_fill_f32(&mut composite, WET_BASE_WEIGHT, WET_COLOR, WET_WEIGHT);

    Ok(quantize_scaled(&composite, FINAL_CONTRAST, FINAL_BRIGHTNESS))
}

fn draw_streaks<R: Rng>(
    config: &RainFogConfig,
    width: u32,
    height: u32,
    rng: &mut R,
) -> Rgb32FImage {
    let mut layer = Rgb32FImage::new(width, height);
    let (sin, cos) = config.angle.to_radians().sin_cos();
    let count = config.drop_count(width, height);
    let mut skipped = 0;

    for _ in 0..count {
        let x = rng.random_range(0..=width) as i32;
        let y = rng.random_range(0..=height) as i32;

        // Far away drops sit higher up in the frame and look shorter
        let raw_length = rng.random_range(MIN_DROP_LENGTH..=config.drop_length);
        let length = (raw_length as f32 * (1.0 - y as f32 / height as f32)) as i32;

        if length < MIN_VISIBLE_LENGTH {
            skipped += 1;
            continue;
        }

        let end = (
            x + (length as f32 * sin) as i32,
            y + (length as f32 * cos) as i32,
        );

        draw_streak(&mut layer, (x, y), end, config.drop_width, (sin, cos));
    }

    log::trace!("rain layer {width}x{height}: {count} streaks, {skipped} too short");

    layer
}

fn draw_streak(
    layer: &mut Rgb32FImage,
    start: (i32, i32),
    end: (i32, i32),
    width: u32,
    (sin, cos): (f32, f32),
) {
    let center = (width - 1) as f32 / 2.0;

    for i in 0..width {
        let offset = i as f32 - center;
        let dx = (offset * cos).round() as i32;
        let dy = (-offset * sin).round() as i32;

        draw_antialiased_line_segment_mut(
            layer,
            (start.0 + dx, start.1 + dy),
            (end.0 + dx, end.1 + dy),
            STREAK_COLOR,
            blend_streak,
        );
    }
}

fn blend_streak(line: Rgb<f32>, background: Rgb<f32>, weight: f32) -> Rgb<f32> {
    Rgb([
        line[0] * weight + background[0] * (1.0 - weight),
        line[1] * weight + background[1] * (1.0 - weight),
        line[2] * weight + background[2] * (1.0 - weight),
    ])
}

/// Separable 3x3 blur with mirrored borders.
fn smooth(layer: &Rgb32FImage) -> Rgb32FImage {
    let (width, height) = layer.dimensions();
    let mut horizontal = Rgb32FImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let mut sum = [0.0f32; 3];
            for (k, weight) in SMOOTHING_KERNEL.iter().enumerate() {
                let sx = reflect_101(x as i64 + k as i64 - 1, width as usize) as u32;
                let pixel = layer.get_pixel(sx, y);
                for c in 0..3 {
                    sum[c] += pixel[c] * weight;
                }
            }
            horizontal.put_pixel(x, y, Rgb(sum));
        }
    }

    let mut output = Rgb32FImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let mut sum = [0.0f32; 3];
            for (k, weight) in SMOOTHING_KERNEL.iter().enumerate() {
                let sy = reflect_101(y as i64 + k as i64 - 1, height as usize) as u32;
                let pixel = horizontal.get_pixel(x, sy);
                for c in 0..3 {
                    sum[c] += pixel[c] * weight;
                }
            }
            output.put_pixel(x, y, Rgb(sum));
        }
    }

    output
}
