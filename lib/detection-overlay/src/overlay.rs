use crate::{Detection, Detector, Error, POTHOLE_LABELS, Result};
use ab_glyph::{FontArc, PxScale};
use batch_runner::{BatchReport, BatchRunner};
use derivative::Derivative;
use derive_setters::Setters;
use image::{Rgb, RgbImage};
use imageproc::{
    drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size},
    rect::Rect,
};
use std::path::Path;

/// Output file prefix of annotated images.
pub const DETECTED_PREFIX: &str = "detected_";

#[derive(Derivative, Setters)]
#[derivative(Debug, Clone, Default)]
#[non_exhaustive]
#[setters(prefix = "with_")]
pub struct OverlayConfig {
    /// Detections whose rounded confidence is not above this are dropped
    #[derivative(Default(value = "0.3"))]
    pub confidence_threshold: f32,

    /// Class names indexed by class id, unknown ids are dropped
    #[derivative(Default(value = "POTHOLE_LABELS.iter().map(|s| s.to_string()).collect()"))]
    pub labels: Vec<String>,

    /// Length of the corner accents, capped at half the box side
    #[derivative(Default(value = "30"))]
    pub corner_length: u32,

    /// Thickness of the corner accents
    #[derivative(Default(value = "2"))]
    pub thickness: u32,

    #[derivative(Default(value = "Rgb([255, 0, 255])"))]
    pub rect_color: Rgb<u8>,

    #[derivative(Default(value = "Rgb([0, 255, 0])"))]
    pub corner_color: Rgb<u8>,

    #[derivative(Default(value = "Rgb([0, 0, 255])"))]
    pub label_color: Rgb<u8>,

    #[derivative(Default(value = "Rgb([255, 255, 255])"))]
    pub text_color: Rgb<u8>,

    /// Text height in pixels
    #[derivative(Default(value = "18.0"))]
    pub text_scale: f32,

    /// Padding around the label text
    #[derivative(Default(value = "10"))]
    pub label_padding: u32,

    /// Label text font, characters are drawn as blocks without one
    #[derivative(Debug = "ignore")]
    #[derivative(Default(value = "None"))]
    pub font: Option<FontArc>,
}

impl OverlayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    fn label_for(&self, detection: &Detection) -> Option<&str> {
        self.labels.get(detection.class_index).map(|s| s.as_str())
    }
}

pub fn load_font(path: impl AsRef<Path>) -> Result<FontArc> {
    let path = path.as_ref();
    if !cutil::fs::file_exist(path) {
        return Err(Error::FontNotFound(path.to_path_buf()));
    }

    let bytes = std::fs::read(path)?;
    FontArc::try_from_vec(bytes).map_err(|e| Error::FontLoadFailed(e.to_string()))
}

/// Run `detector` on `image` and draw every kept detection on a copy.
pub fn annotate(
    image: &RgbImage,
    detector: &mut impl Detector,
    config: &OverlayConfig,
) -> Result<RgbImage> {
    let detections = detector.detect(image)?;
    let mut canvas = image.clone();
    let (width, height) = image.dimensions();
    let mut drawn = 0;

    for detection in &detections {
        let confidence = detection.rounded_confidence();
        if confidence <= config.confidence_threshold {
            continue;
        }

        let Some(label) = config.label_for(detection) else {
            log::debug!("dropping detection with unknown class {}", detection.class_index);
            continue;
        };

        let Some(rect) = detection.bbox.to_pixel_rect(width, height) else {
            log::debug!("dropping detection outside the frame: {:?}", detection.bbox);
            continue;
        };

        draw_corner_rect(&mut canvas, rect, config);
        draw_label(&mut canvas, rect, &format!("{label} {confidence:.2}"), config);
        drawn += 1;
    }

    log::debug!("drew {drawn} of {} detections", detections.len());
    Ok(canvas)
}

/// Annotate every image in `input_dir` into `output_dir/detected_<name>`.
///
/// Detector failures are recorded per file and the batch goes on.
pub fn annotate_folder(
    input_dir: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    detector: &mut impl Detector,
    config: &OverlayConfig,
) -> batch_runner::Result<BatchReport> {
    let runner = BatchRunner::for_detection();
    let inputs = batch_runner::collect_images(input_dir, batch_runner::DETECTION_EXTENSIONS)?;

    runner.run(
        &inputs,
        output_dir,
        |image: &RgbImage| annotate(image, &mut *detector, config),
        DETECTED_PREFIX,
    )
}

fn draw_corner_rect(canvas: &mut RgbImage, rect: Rect, config: &OverlayConfig) {
    draw_hollow_rect_mut(canvas, rect, config.rect_color);

    let length = config
        .corner_length
        .min(rect.width() / 2)
        .min(rect.height() / 2)
        .max(1);
    let thickness = config.thickness.clamp(1, length);

    let (left, top) = (rect.left(), rect.top());
    let right_bar = rect.right() - length as i32 + 1;
    let right_edge = rect.right() - thickness as i32 + 1;
    let bottom_bar = rect.bottom() - length as i32 + 1;
    let bottom_edge = rect.bottom() - thickness as i32 + 1;

    for bar in [
        Rect::at(left, top).of_size(length, thickness),
        Rect::at(left, top).of_size(thickness, length),
        Rect::at(right_bar, top).of_size(length, thickness),
        Rect::at(right_edge, top).of_size(thickness, length),
        Rect::at(left, bottom_edge).of_size(length, thickness),
        Rect::at(left, bottom_bar).of_size(thickness, length),
        Rect::at(right_bar, bottom_edge).of_size(length, thickness),
        Rect::at(right_edge, bottom_bar).of_size(thickness, length),
    ] {
        draw_filled_rect_mut(canvas, bar, config.corner_color);
    }
}

// Text baseline sits 10 px above the box, the filled background is padded
// around the text and clipped by the canvas.
fn draw_label(canvas: &mut RgbImage, rect: Rect, text: &str, config: &OverlayConfig) {
    let scale = PxScale::from(config.text_scale);
    let (text_width, text_height) = match config.font.as_ref() {
        Some(font) => text_size(scale, font, text),
        None => estimate_text_size(text, config.text_scale),
    };
    let padding = config.label_padding;

    let text_x = rect.left();
    let text_y = rect.top() - 10 - text_height as i32;

    let background = Rect::at(text_x - padding as i32, text_y - padding as i32)
        .of_size(text_width.max(1) + 2 * padding, text_height.max(1) + 2 * padding);
    draw_filled_rect_mut(canvas, background, config.label_color);

    match config.font.as_ref() {
        Some(font) => draw_text_mut(canvas, config.text_color, text_x, text_y, scale, font, text),
        None => draw_block_text(canvas, text, text_x, text_y, text_height, config.text_color),
    }
}

// Each character is about 0.6 of the text height wide
fn estimate_text_size(text: &str, text_scale: f32) -> (u32, u32) {
    let char_count = text.chars().count() as f32;
    let width = (char_count * text_scale * 0.6) as u32;
    let height = text_scale as u32;
    (width.max(1), height.max(1))
}

// Fontless rendering: one checkered cell per visible character.
fn draw_block_text(
    canvas: &mut RgbImage,
    text: &str,
    x: i32,
    y: i32,
    height: u32,
    color: Rgb<u8>,
) {
    let char_width = ((height as f32 * 0.6) as i32).max(1);
    let (canvas_width, canvas_height) = (canvas.width() as i32, canvas.height() as i32);

    for (index, c) in text.chars().enumerate() {
        if c.is_whitespace() {
            continue;
        }

        let left = x + index as i32 * char_width;
        for cy in y.max(0)..(y + height as i32).min(canvas_height) {
            for cx in left.max(0)..(left + char_width).min(canvas_width) {
                if (cx + cy) % 2 == 0 {
                    canvas.put_pixel(cx as u32, cy as u32, color);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BoundingBox;
    use std::fs;
    use tempfile::tempdir;

    const MAGENTA: Rgb<u8> = Rgb([255, 0, 255]);
    const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
    const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    fn pothole(x1: f32, y1: f32, x2: f32, y2: f32, confidence: f32) -> Detection {
        Detection::new(BoundingBox::new(x1, y1, x2, y2).unwrap(), 0, confidence)
    }

    fn stub(detections: Vec<Detection>) -> impl FnMut(&RgbImage) -> Result<Vec<Detection>> {
        move |_: &RgbImage| Ok(detections.clone())
    }

    #[test]
    fn test_default_config() {
        let config = OverlayConfig::new();

        assert_eq!(config.confidence_threshold, 0.3);
        assert_eq!(config.labels, vec!["Pothole".to_string()]);
        assert_eq!(config.corner_length, 30);
        assert!(config.font.is_none());
    }

    #[test]
    fn test_annotate_draws_box_and_corners() -> Result<()> {
        let image = RgbImage::new(100, 100);
        let mut detector = stub(vec![pothole(20.0, 30.0, 70.0, 80.0, 0.9)]);

        let annotated = annotate(&image, &mut detector, &OverlayConfig::new())?;

        // corners are 25 px, half of the 51 px side
        assert_eq!(*annotated.get_pixel(20, 30), GREEN);
        assert_eq!(*annotated.get_pixel(44, 30), GREEN);
        assert_eq!(*annotated.get_pixel(21, 31), GREEN);
        assert_eq!(*annotated.get_pixel(70, 30), GREEN);
        assert_eq!(*annotated.get_pixel(70, 80), GREEN);
        assert_eq!(*annotated.get_pixel(20, 80), GREEN);

        assert_eq!(*annotated.get_pixel(45, 30), MAGENTA);
        assert_eq!(*annotated.get_pixel(20, 55), MAGENTA);
        assert_eq!(*annotated.get_pixel(45, 80), MAGENTA);

        assert_eq!(*annotated.get_pixel(45, 55), BLACK);
        assert_eq!(*annotated.get_pixel(5, 5), BLACK);
        assert_eq!(*annotated.get_pixel(90, 90), BLACK);
        Ok(())
    }

    #[test]
    fn test_label_without_font() -> Result<()> {
        let image = RgbImage::new(100, 100);
        let mut detector = stub(vec![pothole(20.0, 50.0, 70.0, 90.0, 0.9)]);

        let annotated = annotate(&image, &mut detector, &OverlayConfig::new())?;

        // "Pothole 0.90" is 12 cells of 10 px, 18 px high, starting at (20, 22)
        // on a background padded by 10 px
        assert_eq!(*annotated.get_pixel(12, 14), BLUE);
        assert_eq!(*annotated.get_pixel(40, 49), BLUE);
        assert_eq!(*annotated.get_pixel(20, 22), WHITE);
        assert_eq!(*annotated.get_pixel(21, 22), BLUE);
        assert_eq!(*annotated.get_pixel(5, 30), BLACK);
        assert_eq!(*annotated.get_pixel(20, 50), GREEN);
        Ok(())
    }

    #[test]
    fn test_label_with_font() -> anyhow::Result<()> {
        let font_path = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";
        if !cutil::fs::file_exist(font_path) {
            return Ok(());
        }

        let image = RgbImage::new(100, 100);
        let mut detector = stub(vec![pothole(20.0, 50.0, 70.0, 90.0, 0.9)]);
        let config = OverlayConfig::new().with_font(Some(load_font(font_path)?));

        let annotated = annotate(&image, &mut detector, &config)?;

        assert_eq!(*annotated.get_pixel(12, 49), BLUE);
        let text_pixels = (0..50)
            .flat_map(|y| (0..100).map(move |x| (x, y)))
            .filter(|&(x, y)| annotated.get_pixel(x, y)[0] > 0)
            .count();
        assert!(text_pixels > 0);
        assert_eq!(*annotated.get_pixel(20, 50), GREEN);
        Ok(())
    }

    #[test]
    fn test_annotate_filters_detections() -> Result<()> {
        let image = RgbImage::new(100, 100);
        let mut detector = stub(vec![
            pothole(10.0, 10.0, 40.0, 40.0, 0.25),
            pothole(10.0, 10.0, 40.0, 40.0, 0.3),
            pothole(10.0, 10.0, 40.0, 40.0, 0.295),
            Detection::new(BoundingBox::new(10.0, 10.0, 40.0, 40.0)?, 1, 0.99),
            pothole(200.0, 200.0, 240.0, 240.0, 0.9),
        ]);

        let annotated = annotate(&image, &mut detector, &OverlayConfig::new())?;
        assert_eq!(annotated, image);
        Ok(())
    }

    #[test]
    fn test_annotate_threshold_is_strict_on_rounded_confidence() -> Result<()> {
        let image = RgbImage::new(50, 50);
        let mut detector = stub(vec![pothole(10.0, 10.0, 40.0, 40.0, 0.301)]);

        let annotated = annotate(&image, &mut detector, &OverlayConfig::new())?;
        assert_eq!(*annotated.get_pixel(10, 10), GREEN);

        let strict = OverlayConfig::new().with_confidence_threshold(0.31);
        let untouched = annotate(&image, &mut detector, &strict)?;
        assert_eq!(untouched, image);
        Ok(())
    }

    #[test]
    fn test_annotate_clips_partial_box() -> Result<()> {
        let image = RgbImage::new(60, 40);
        let mut detector = stub(vec![pothole(-20.0, -20.0, 30.0, 100.0, 0.8)]);

        let annotated = annotate(&image, &mut detector, &OverlayConfig::new())?;

        assert_eq!(annotated.dimensions(), (60, 40));
        assert_eq!(*annotated.get_pixel(0, 0), GREEN);
        assert_eq!(*annotated.get_pixel(30, 39), GREEN);
        assert_eq!(*annotated.get_pixel(50, 20), BLACK);
        Ok(())
    }

    #[test]
    fn test_annotate_tiny_box() -> Result<()> {
        let image = RgbImage::new(10, 10);
        let mut detector = stub(vec![pothole(4.0, 4.0, 4.0, 4.0, 0.8)]);

        let annotated = annotate(&image, &mut detector, &OverlayConfig::new())?;
        assert_eq!(*annotated.get_pixel(4, 4), GREEN);
        assert_eq!(*annotated.get_pixel(5, 5), BLACK);
        Ok(())
    }

    #[test]
    fn test_annotate_custom_labels() -> Result<()> {
        let image = RgbImage::new(50, 50);
        let mut detector = stub(vec![Detection::new(
            BoundingBox::new(5.0, 5.0, 30.0, 30.0)?,
            1,
            0.7,
        )]);
        let config = OverlayConfig::new().with_labels(vec!["Pothole".into(), "Crack".into()]);

        let annotated = annotate(&image, &mut detector, &config)?;
        assert_eq!(*annotated.get_pixel(5, 5), GREEN);
        Ok(())
    }

    #[test]
    fn test_annotate_detector_error() {
        let image = RgbImage::new(10, 10);
        let mut detector =
            |_: &RgbImage| -> Result<Vec<Detection>> { Err(Error::Detector("no session".into())) };

        let result = annotate(&image, &mut detector, &OverlayConfig::new());
        assert!(matches!(result, Err(Error::Detector(_))));
    }

    #[test]
    fn test_load_font_errors() {
        let temp_dir = tempdir().unwrap();

        let missing = temp_dir.path().join("missing.ttf");
        assert!(matches!(load_font(&missing), Err(Error::FontNotFound(_))));

        let garbage = temp_dir.path().join("garbage.ttf");
        fs::write(&garbage, b"not a font").unwrap();
        assert!(matches!(load_font(&garbage), Err(Error::FontLoadFailed(_))));
    }

    #[test]
    fn test_annotate_folder_keeps_going_after_detector_failure() -> anyhow::Result<()> {
        let input = tempdir()?;
        let output = tempdir()?;

        RgbImage::from_pixel(40, 40, Rgb([60, 60, 60])).save(input.path().join("a.png"))?;
        RgbImage::from_pixel(40, 40, Rgb([60, 60, 60])).save(input.path().join("b.bmp"))?;
        RgbImage::from_pixel(30, 30, Rgb([60, 60, 60])).save(input.path().join("c.png"))?;
        fs::write(input.path().join("notes.txt"), b"skip me")?;

        // fails on the 30x30 image only
        let mut detector = |image: &RgbImage| {
            if image.width() == 30 {
                return Err(Error::Detector("inference failed".into()));
            }
            Ok(vec![pothole(5.0, 5.0, 30.0, 30.0, 0.9)])
        };

        let report = annotate_folder(
            input.path(),
            output.path(),
            &mut detector,
            &OverlayConfig::new(),
        )?;

        assert_eq!(report.processed_count(), 2);
        assert_eq!(report.failed_count(), 1);
        assert!(report.failures[0].0.ends_with("c.png"));

        let annotated = batch_runner::load_image(output.path().join("detected_a.png"))?;
        assert_eq!(*annotated.get_pixel(5, 5), GREEN);
        assert!(output.path().join("detected_b.bmp").exists());
        assert!(!output.path().join("detected_c.png").exists());
        Ok(())
    }
}
