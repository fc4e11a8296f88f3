pub mod job;
pub mod runner;

pub use job::{BatchJob, DETECTION_EXTENSIONS, IMAGE_EXTENSIONS, collect_images};
pub use runner::{BatchReport, BatchRunner, load_image, save_image};

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to load {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },

    #[error("Failed to write {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },

    #[error("Failed to transform {}: {reason}", path.display())]
    Transform { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
