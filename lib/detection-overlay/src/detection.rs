use crate::{Error, Result};
use image::RgbImage;
use imageproc::rect::Rect;

/// Class names of the pothole model, indexed by class id.
pub const POTHOLE_LABELS: &[&str] = &["Pothole"];

/// Axis-aligned box in pixel coordinates, `x1 <= x2` and `y1 <= y2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Result<Self> {
        if ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
            return Err(Error::InvalidBox(format!(
                "non-finite coordinates ({x1}, {y1}, {x2}, {y2})"
            )));
        }

        if x1 > x2 || y1 > y2 {
            return Err(Error::InvalidBox(format!(
                "corners out of order ({x1}, {y1}, {x2}, {y2})"
            )));
        }

        Ok(Self { x1, y1, x2, y2 })
    }

    /// Integer rectangle covering `x1..=x2`, `y1..=y2` after truncation,
    /// clipped to a `width x height` frame. `None` if nothing is left.
    pub fn to_pixel_rect(&self, width: u32, height: u32) -> Option<Rect> {
        if width == 0 || height == 0 {
            return None;
        }

        let x1 = (self.x1 as i64).max(0);
        let y1 = (self.y1 as i64).max(0);
        let x2 = (self.x2 as i64).min(width as i64 - 1);
        let y2 = (self.y2 as i64).min(height as i64 - 1);

        if x1 > x2 || y1 > y2 {
            return None;
        }

        let size = ((x2 - x1 + 1) as u32, (y2 - y1 + 1) as u32);
        Some(Rect::at(x1 as i32, y1 as i32).of_size(size.0, size.1))
    }
}

/// One model output.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub class_index: usize,
    /// In `[0, 1]`
    pub confidence: f32,
}

impl Detection {
    pub fn new(bbox: BoundingBox, class_index: usize, confidence: f32) -> Self {
        Self {
            bbox,
            class_index,
            confidence,
        }
    }

    /// Confidence rounded up to two decimals.
    pub fn rounded_confidence(&self) -> f32 {
        // the epsilon keeps 0.3 from becoming 0.31 because of f32 noise
        ((self.confidence as f64 * 100.0 - 1e-4).ceil() / 100.0) as f32
    }
}

/// Object detector run on every image. Model loading and inference live
/// behind this trait.
pub trait Detector {
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<Detection>>;
}

impl<F> Detector for F
where
    F: FnMut(&RgbImage) -> Result<Vec<Detection>>,
{
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<Detection>> {
        self(image)
    }
}
