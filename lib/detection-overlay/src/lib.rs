pub mod detection;
pub mod overlay;

pub use detection::{BoundingBox, Detection, Detector, POTHOLE_LABELS};
pub use overlay::{DETECTED_PREFIX, OverlayConfig, annotate, annotate_folder, load_font};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Detector failed: {0}")]
    Detector(String),

    #[error("Invalid bounding box: {0}")]
    InvalidBox(String),

    #[error("Font file not found: {0}")]
    FontNotFound(std::path::PathBuf),

    #[error("Failed to load font: {0}")]
    FontLoadFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
