pub mod cli;
pub mod config;
pub mod pipeline;

use anyhow::Result;
use cli::{Cli, Commands};
use config::Config;
use pipeline::{Outcome, Pipeline};
use std::path::PathBuf;

pub fn init_logger() {
    use std::io::Write;

    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format(|buf, record| {
            let style = buf.default_level_style(record.level());
            let ts = cutil::time::local_now("%H:%M:%S");

            writeln!(
                buf,
                "[{} {style}{}{style:#} {} {}] {}",
                ts,
                record.level(),
                record
                    .file()
                    .unwrap_or("None")
                    .split('/')
                    .next_back()
                    .unwrap_or("None"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .init();
}

/// Run one command. Only configuration and input folder problems are
/// errors, failed files end up in the summary.
pub fn run(cli: Cli) -> Result<Vec<Outcome>> {
    let config = Config::load(cli.config.as_deref())?;
    let output = config.output.clone();

    let outcomes = match cli.command {
        Commands::Night(io) => {
            let pipeline = Pipeline::new(config).with_parallel(cli.parallel);
            let output_dir = io.output.unwrap_or(output.night_dir);
            vec![pipeline.night(&io.input, &output_dir)?]
        }
        Commands::Rain {
            io,
            intensity,
            seed,
        } => {
            let mut config = config;
            if let Some(intensity) = intensity {
                config.rain.intensity = intensity;
            }
            if seed.is_some() {
                config.rain.seed = seed;
            }

            let pipeline = Pipeline::new(config).with_parallel(cli.parallel);
            let output_dir = io.output.unwrap_or(output.rain_dir);
            vec![pipeline.rain(&io.input, &output_dir)?]
        }
        Commands::MotionBlur { io, angle } => {
            let mut config = config;
            if let Some(angle) = angle {
                config.motion_blur.angle = angle;
            }

            let pipeline = Pipeline::new(config).with_parallel(cli.parallel);
            let output_dir = io.output.unwrap_or(output.motion_blur_dir);
            pipeline.motion_blur(&io.input, &output_dir)?
        }
        Commands::All(io) => {
            let pipeline = Pipeline::new(config).with_parallel(cli.parallel);
            let output_root = io.output.unwrap_or_else(|| PathBuf::from("."));
            pipeline.all(&io.input, &output_root)?
        }
    };

    for outcome in &outcomes {
        log::info!(
            "{}: {} written, {} failed, {} skipped -> {}",
            outcome.name,
            outcome.report.processed_count(),
            outcome.report.failed_count(),
            outcome.report.skipped.len(),
            outcome.output_dir.display()
        );
    }

    Ok(outcomes)
}
