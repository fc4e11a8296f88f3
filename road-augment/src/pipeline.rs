use crate::config::Config;
use anyhow::{Context, Result};
use batch_runner::{BatchReport, BatchRunner, IMAGE_EXTENSIONS};
use image::RgbImage;
use road_effect::{Effect, SpeedBucket};
use std::path::{Path, PathBuf};

pub const NIGHT_PREFIX: &str = "night_d_";
pub const RAIN_PREFIX: &str = "rain_";

/// Applies the configured effects to a folder of images.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Config,
    runner: BatchRunner,
    parallel: bool,
}

/// Report of one effect run, `name` is the effect or bucket it belongs to.
#[derive(Debug)]
pub struct Outcome {
    pub name: String,
    pub output_dir: PathBuf,
    pub report: BatchReport,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            runner: BatchRunner::new(),
            parallel: false,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn night(&self, input_dir: &Path, output_dir: &Path) -> Result<Outcome> {
        let inputs = self.inputs(input_dir)?;
        let effect = self.config.night.effect();

        log::info!("Converting {} images to night", inputs.len());
        let report = self.apply(&inputs, output_dir, &effect, NIGHT_PREFIX)?;
        Ok(outcome("night", output_dir, report))
    }

    /// Each image is seeded from the configured seed and its file name, so
    /// sequential and parallel runs write the same files.
    pub fn rain(&self, input_dir: &Path, output_dir: &Path) -> Result<Outcome> {
        let inputs = self.inputs(input_dir)?;
        let effect = self.config.rain.effect();

        log::info!(
            "Adding rain (intensity {}) to {} images",
            self.config.rain.intensity,
            inputs.len()
        );

        let transform = |source: &Path, image: &RgbImage| {
            effect.apply_keyed(image, &cutil::fs::file_name(source))
        };

        let report = if self.parallel {
            self.runner.run_parallel_with_source(&inputs, output_dir, transform, RAIN_PREFIX)
        } else {
            self.runner.run_with_source(&inputs, output_dir, transform, RAIN_PREFIX)
        };

        let report = report.with_context(|| format!("create {} failed", output_dir.display()))?;
        Ok(outcome("rain", output_dir, report))
    }

    /// One subfolder per speed bucket under `output_dir`, file names kept.
    pub fn motion_blur(&self, input_dir: &Path, output_dir: &Path) -> Result<Vec<Outcome>> {
        let inputs = self.inputs(input_dir)?;
        let mut outcomes = vec![];

        for bucket in SpeedBucket::all() {
            let effect = self.config.motion_blur.effect(*bucket);
            let bucket_dir = output_dir.join(bucket.dir_name());

            log::info!(
                "Processing {} images (kernel size: {})",
                bucket.dir_name(),
                bucket.degree()
            );
            log::info!("Speed range: {}", bucket.speed_range());
            log::info!("Scenario: {}", bucket.scenario());

            let report = self.apply(&inputs, &bucket_dir, &effect, "")?;
            outcomes.push(outcome(bucket.dir_name(), &bucket_dir, report));
        }

        Ok(outcomes)
    }

    /// Every effect into its configured folder name under `output_root`.
    pub fn all(&self, input_dir: &Path, output_root: &Path) -> Result<Vec<Outcome>> {
        let output = &self.config.output;

        let mut outcomes = vec![
            self.night(input_dir, &output_root.join(&output.night_dir))?,
            self.rain(input_dir, &output_root.join(&output.rain_dir))?,
        ];
        outcomes.extend(self.motion_blur(input_dir, &output_root.join(&output.motion_blur_dir))?);

        Ok(outcomes)
    }

    fn inputs(&self, input_dir: &Path) -> Result<Vec<PathBuf>> {
        let inputs = batch_runner::collect_images(input_dir, IMAGE_EXTENSIONS)
            .with_context(|| format!("read input folder {} failed", input_dir.display()))?;

        if inputs.is_empty() {
            log::warn!("No images found in {}", input_dir.display());
        }

        Ok(inputs)
    }

    fn apply(
        &self,
        inputs: &[PathBuf],
        output_dir: &Path,
        effect: &(impl Effect + Sync),
        name_prefix: &str,
    ) -> Result<BatchReport> {
        let transform = |image: &RgbImage| effect.apply(image);

        let report = if self.parallel {
            self.runner.run_parallel(inputs, output_dir, transform, name_prefix)
        } else {
            self.runner.run(inputs, output_dir, transform, name_prefix)
        };

        report.with_context(|| format!("create {} failed", output_dir.display()))
    }
}

fn outcome(name: &str, output_dir: &Path, report: BatchReport) -> Outcome {
    Outcome {
        name: name.to_string(),
        output_dir: output_dir.to_path_buf(),
        report,
    }
}
