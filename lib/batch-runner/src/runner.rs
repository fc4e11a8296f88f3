use crate::{BatchJob, DETECTION_EXTENSIONS, Error, IMAGE_EXTENSIONS, Result};
use derivative::Derivative;
use derive_setters::Setters;
use image::{ImageFormat, RgbImage, codecs::jpeg::JpegEncoder};
use rayon::prelude::*;
use std::{
    fmt::Display,
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Instant,
};

const JPEG_QUALITY: u8 = 95;

/// Outcome of one batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Output files written, in job order
    pub written: Vec<PathBuf>,
    /// Source files that failed to load, transform or write
    pub failures: Vec<(PathBuf, Error)>,
    /// Inputs rejected by the extension allow-list
    pub skipped: Vec<PathBuf>,
    /// Jobs left untouched because the batch was cancelled
    pub cancelled: usize,
}

impl BatchReport {
    pub fn processed_count(&self) -> usize {
        self.written.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.cancelled == 0
    }

    fn record(&mut self, source: &Path, destination: &Path, result: Result<()>) {
        match result {
            Ok(()) => {
                log::info!("Processed: {}", cutil::fs::file_name(source));
                self.written.push(destination.to_path_buf());
            }
            Err(e) => {
                log::warn!("{e}");
                self.failures.push((source.to_path_buf(), e));
            }
        }
    }
}

/// Applies one transform to every image of a batch. A file that fails to
/// load, transform or write is logged and recorded, the rest of the batch
/// keeps going.
#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct BatchRunner {
    /// Case-insensitive extension allow-list, without dots
    #[derivative(Default(value = "IMAGE_EXTENSIONS.iter().map(|s| s.to_string()).collect()"))]
    extensions: Vec<String>,

    /// Checked before each file, set it to stop the batch early
    #[derivative(Default(value = "None"))]
    cancel: Option<Arc<AtomicBool>>,
}

impl BatchRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner accepting every format the detection pipeline reads.
    pub fn for_detection() -> Self {
        Self::default()
            .with_extensions(DETECTION_EXTENSIONS.iter().map(|s| s.to_string()).collect())
    }

    /// Transform every accepted input into `output_dir/<name_prefix><file name>`.
    ///
    /// Only failing to create `output_dir` is fatal. Per-file problems end up
    /// in [`BatchReport::failures`].
    pub fn run<F, E>(
        &self,
        inputs: &[impl AsRef<Path>],
        output_dir: impl AsRef<Path>,
        mut transform: F,
        name_prefix: &str,
    ) -> Result<BatchReport>
    where
        F: FnMut(&RgbImage) -> std::result::Result<RgbImage, E>,
        E: Display,
    {
        self.run_with_source(
            inputs,
            output_dir,
            |_: &Path, image: &RgbImage| transform(image),
            name_prefix,
        )
    }

    /// Same as [`BatchRunner::run`] but spreads the files over the rayon
    /// thread pool. Reports keep job order.
    pub fn run_parallel<F, E>(
        &self,
        inputs: &[impl AsRef<Path>],
        output_dir: impl AsRef<Path>,
        transform: F,
        name_prefix: &str,
    ) -> Result<BatchReport>
    where
        F: Fn(&RgbImage) -> std::result::Result<RgbImage, E> + Sync,
        E: Display,
    {
        self.run_parallel_with_source(
            inputs,
            output_dir,
            |_: &Path, image: &RgbImage| transform(image),
            name_prefix,
        )
    }

    /// Like [`BatchRunner::run`], the transform also gets the source path.
    pub fn run_with_source<F, E>(
        &self,
        inputs: &[impl AsRef<Path>],
        output_dir: impl AsRef<Path>,
        transform: F,
        name_prefix: &str,
    ) -> Result<BatchReport>
    where
        F: FnMut(&Path, &RgbImage) -> std::result::Result<RgbImage, E>,
        E: Display,
    {
        let (job, skipped) = self.prepare(inputs, output_dir.as_ref(), name_prefix)?;
        let mut report = self.run_job(&job, transform);
        report.skipped = skipped;
        Ok(report)
    }

    /// Like [`BatchRunner::run_parallel`], the transform also gets the source
    /// path.
    pub fn run_parallel_with_source<F, E>(
        &self,
        inputs: &[impl AsRef<Path>],
        output_dir: impl AsRef<Path>,
        transform: F,
        name_prefix: &str,
    ) -> Result<BatchReport>
    where
        F: Fn(&Path, &RgbImage) -> std::result::Result<RgbImage, E> + Sync,
        E: Display,
    {
        let (job, skipped) = self.prepare(inputs, output_dir.as_ref(), name_prefix)?;
        let mut report = self.run_job_parallel(&job, transform);
        report.skipped = skipped;
        Ok(report)
    }

    /// Process an explicit job list sequentially, in order.
    pub fn run_job<F, E>(&self, job: &BatchJob, mut transform: F) -> BatchReport
    where
        F: FnMut(&Path, &RgbImage) -> std::result::Result<RgbImage, E>,
        E: Display,
    {
        let start = Instant::now();
        let mut report = BatchReport::default();

        for (index, (source, destination)) in job.items().iter().enumerate() {
            if self.is_cancelled() {
                report.cancelled = job.len() - index;
                log::info!("Batch cancelled, {} files left", report.cancelled);
                break;
            }

            let result = process_one(source, destination, &mut transform);
            report.record(source, destination, result);
        }

        log_summary(&report, start);
        report
    }

    pub fn run_job_parallel<F, E>(&self, job: &BatchJob, transform: F) -> BatchReport
    where
        F: Fn(&Path, &RgbImage) -> std::result::Result<RgbImage, E> + Sync,
        E: Display,
    {
        let start = Instant::now();
        let results: Vec<Option<Result<()>>> = job
            .items()
            .par_iter()
            .map(|(source, destination)| {
                if self.is_cancelled() {
                    return None;
                }
                Some(process_one(source, destination, &transform))
            })
            .collect();

        let mut report = BatchReport::default();
        for ((source, destination), result) in job.items().iter().zip(results) {
            match result {
                Some(result) => report.record(source, destination, result),
                None => report.cancelled += 1,
            }
        }

        if report.cancelled > 0 {
            log::info!("Batch cancelled, {} files left", report.cancelled);
        }

        log_summary(&report, start);
        report
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn prepare(
        &self,
        inputs: &[impl AsRef<Path>],
        output_dir: &Path,
        name_prefix: &str,
    ) -> Result<(BatchJob, Vec<PathBuf>)> {
        fs::create_dir_all(output_dir)?;

        let (accepted, skipped): (Vec<PathBuf>, Vec<PathBuf>) = inputs
            .iter()
            .map(|input| input.as_ref().to_path_buf())
            .partition(|input| cutil::fs::has_extension(input, &self.extensions));

        for path in &skipped {
            log::debug!("Skip {}: unsupported extension", path.display());
        }

        Ok((BatchJob::from_inputs(&accepted, output_dir, name_prefix), skipped))
    }
}

fn process_one<F, E>(source: &Path, destination: &Path, transform: F) -> Result<()>
where
    F: FnOnce(&Path, &RgbImage) -> std::result::Result<RgbImage, E>,
    E: Display,
{
    let image = load_image(source)?;

    let output = transform(source, &image).map_err(|e| Error::Transform {
        path: source.to_path_buf(),
        reason: e.to_string(),
    })?;

    save_image(&output, destination)
}

fn log_summary(report: &BatchReport, start: Instant) {
    log::info!(
        "Batch finished in {}: {} processed, {} failed",
        cutil::time::elapsed_str(start.elapsed()),
        report.processed_count(),
        report.failed_count()
    );
}

/// Decode any supported image file into 8-bit RGB.
pub fn load_image(path: impl AsRef<Path>) -> Result<RgbImage> {
    let path = path.as_ref();

    image::open(path)
        .map(|image| image.to_rgb8())
        .map_err(|e| Error::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Encode `image` in the format implied by the extension of `path`.
///
/// The data is written to a temporary file next to `path` and renamed into
/// place, so an interrupted write never leaves a truncated image behind.
pub fn save_image(image: &RgbImage, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let write_err = |reason: String| Error::Write {
        path: path.to_path_buf(),
        reason,
    };

    let format = ImageFormat::from_path(path).map_err(|e| write_err(e.to_string()))?;

    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(dir).map_err(|e| write_err(e.to_string()))?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".partial-")
        .tempfile_in(dir)
        .map_err(|e| write_err(e.to_string()))?;

    {
        let mut writer = BufWriter::new(tmp.as_file_mut());

        let encoded = match format {
            ImageFormat::Jpeg => {
                JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY).encode_image(image)
            }
            _ => image.write_to(&mut writer, format),
        };
        encoded.map_err(|e| write_err(e.to_string()))?;

        writer.flush().map_err(|e| write_err(e.to_string()))?;
    }

    tmp.persist(path).map_err(|e| write_err(e.error.to_string()))?;
    Ok(())
}
