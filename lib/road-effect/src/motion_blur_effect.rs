use crate::{
    Effect, ImageEffectError, ImageEffectResult,
    blend::{reflect_101, saturate},
};
use derivative::Derivative;
use derive_setters::Setters;
use image::RgbImage;

/// Motion blur configuration
#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct MotionBlurConfig {
    /// Kernel size, i.e. the blur length in pixels
    #[derivative(Default(value = "10"))]
    degree: u32,

    /// Blur direction in degrees, counter-clockwise from horizontal
    #[derivative(Default(value = "0.0"))]
    angle: f32,
}

impl MotionBlurConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bucket(bucket: SpeedBucket) -> Self {
        Self::default().with_degree(bucket.degree())
    }
}

impl Effect for MotionBlurConfig {
    fn apply(&self, image: &RgbImage) -> ImageEffectResult<RgbImage> {
        motion_blur(image, self.degree, self.angle)
    }
}

/// Blur severity presets, assuming a shutter speed of about 1/250s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedBucket {
    Low,
    Medium,
    High,
}

impl SpeedBucket {
    pub fn all() -> &'static [SpeedBucket] {
        &[SpeedBucket::Low, SpeedBucket::Medium, SpeedBucket::High]
    }

    pub fn degree(&self) -> u32 {
        match self {
            SpeedBucket::Low => 5,
            SpeedBucket::Medium => 10,
            SpeedBucket::High => 15,
        }
    }

    pub fn dir_name(&self) -> &'static str {
        match self {
            SpeedBucket::Low => "low_speed",
            SpeedBucket::Medium => "medium_speed",
            SpeedBucket::High => "high_speed",
        }
    }

    pub fn speed_range(&self) -> &'static str {
        match self {
            SpeedBucket::Low => "10-30 km/h (6-18 mph)",
            SpeedBucket::Medium => "30-60 km/h (18-37 mph)",
            SpeedBucket::High => "60-100+ km/h (37-62+ mph)",
        }
    }

    pub fn scenario(&self) -> &'static str {
        match self {
            SpeedBucket::Low => "Parking, residential areas",
            SpeedBucket::Medium => "Urban streets",
            SpeedBucket::High => "Highways, freeways",
        }
    }
}

/// Square convolution kernel stored row by row.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    size: usize,
    weights: Vec<f32>,
}

impl Kernel {
    /// A single line of ones through the middle row, rotated by `angle`
    /// degrees about the kernel centre and normalized to sum to one.
    pub fn motion(degree: u32, angle: f32) -> ImageEffectResult<Self> {
        if degree == 0 {
            return Err(ImageEffectError::InvalidParameter(
                "motion blur degree must be at least 1".to_string(),
            ));
        }

        let size = degree as usize;
        let mut line = vec![0.0f32; size * size];
        let row = (size - 1) / 2;
        line[row * size..(row + 1) * size].fill(1.0);

        let mut weights = rotate(&line, size, angle);

        let sum: f32 = weights.iter().sum();
        if sum <= f32::EPSILON {
            return Err(ImageEffectError::ImageProc(format!(
                "motion blur kernel is empty after rotating by {angle} degrees"
            )));
        }
        weights.iter_mut().for_each(|w| *w /= sum);

        Ok(Self { size, weights })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.weights[y * self.size + x]
    }

    // Non-zero weights as (dx, dy, weight) offsets from the anchor.
    fn taps(&self) -> Vec<(i64, i64, f32)> {
        let anchor = (self.size / 2) as i64;

        self.weights
            .iter()
            .enumerate()
            .filter(|(_, w)| **w != 0.0)
            .map(|(i, w)| {
                let x = (i % self.size) as i64;
                let y = (i / self.size) as i64;
                (x - anchor, y - anchor, *w)
            })
            .collect()
    }
}

// Inverse-mapped bilinear rotation, samples outside the grid read as zero.
fn rotate(src: &[f32], size: usize, angle: f32) -> Vec<f32> {
    if angle == 0.0 {
        return src.to_vec();
    }

    let center = size as f32 / 2.0 - 0.5;
    let (sin, cos) = angle.to_radians().sin_cos();
    let sample = |x: i64, y: i64| -> f32 {
        if x < 0 || y < 0 || x >= size as i64 || y >= size as i64 {
            0.0
        } else {
            src[y as usize * size + x as usize]
        }
    };

    let mut dst = vec![0.0f32; size * size];
    for y in 0..size {
        for x in 0..size {
            let dx = x as f32 - center;
            let dy = y as f32 - center;
            let sx = center + cos * dx - sin * dy;
            let sy = center + sin * dx + cos * dy;

            let x0 = sx.floor();
            let y0 = sy.floor();
            let fx = sx - x0;
            let fy = sy - y0;
            let (x0, y0) = (x0 as i64, y0 as i64);

            dst[y * size + x] = sample(x0, y0) * (1.0 - fx) * (1.0 - fy)
                + sample(x0 + 1, y0) * fx * (1.0 - fy)
                + sample(x0, y0 + 1) * (1.0 - fx) * fy
                + sample(x0 + 1, y0 + 1) * fx * fy;
        }
    }

    dst
}

/// Correlate `image` with `kernel`, mirroring samples at the borders.
pub fn convolve(image: &RgbImage, kernel: &Kernel) -> RgbImage {
    let (width, height) = image.dimensions();
    let taps = kernel.taps();
    let mut output = RgbImage::new(width, height);

    for (x, y, pixel) in output.enumerate_pixels_mut() {
        let mut sum = [0.0f32; 3];

        for &(dx, dy, weight) in &taps {
            let sx = reflect_101(x as i64 + dx, width as usize) as u32;
            let sy = reflect_101(y as i64 + dy, height as usize) as u32;
            let src = image.get_pixel(sx, sy);

            for c in 0..3 {
                sum[c] += src[c] as f32 * weight;
            }
        }

        for c in 0..3 {
            pixel[c] = saturate(sum[c]);
        }
    }

    output
}

/// Directional box blur of length `degree` along `angle` degrees.
pub fn motion_blur(image: &RgbImage, degree: u32, angle: f32) -> ImageEffectResult<RgbImage> {
    let kernel = Kernel::motion(degree, angle)?;
    Ok(convolve(image, &kernel))
}
