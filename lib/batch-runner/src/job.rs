use std::path::{Path, PathBuf};

/// Extensions picked up by the augmentation pipelines.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Extensions picked up by the detection pipeline.
pub const DETECTION_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff", "webp"];

/// Sorted, non-recursive listing of the images in `dir`.
pub fn collect_images(dir: impl AsRef<Path>, extensions: &[&str]) -> crate::Result<Vec<PathBuf>> {
    Ok(cutil::fs::list_files_with_extensions(dir, extensions)?)
}

/// Ordered (source, destination) pairs. Every pair is independent of the
/// others.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchJob {
    items: Vec<(PathBuf, PathBuf)>,
}

impl BatchJob {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map every input to `output_dir/<name_prefix><file name>`.
    pub fn from_inputs(
        inputs: &[impl AsRef<Path>],
        output_dir: impl AsRef<Path>,
        name_prefix: &str,
    ) -> Self {
        let items = inputs
            .iter()
            .map(|input| {
                let input = input.as_ref();
                let output = cutil::fs::prefixed_path(input, &output_dir, name_prefix);
                (input.to_path_buf(), output)
            })
            .collect();

        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[(PathBuf, PathBuf)] {
        &self.items
    }
}
