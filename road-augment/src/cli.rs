use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "road-augment")]
#[command(about = "Generate night, rain and motion-blur variants of road images")]
#[command(version)]
pub struct Cli {
    /// TOML file with effect parameters and output folders
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Process files on all cores
    #[arg(long, global = true)]
    pub parallel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Darken images into night scenes
    Night(IoArgs),

    /// Add fog, rain streaks and a wet tint
    Rain {
        #[command(flatten)]
        io: IoArgs,

        /// Rain strength, overrides the config file
        #[arg(long)]
        intensity: Option<f32>,

        /// Seed for reproducible streaks, overrides the config file
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Blur images at three vehicle speeds
    MotionBlur {
        #[command(flatten)]
        io: IoArgs,

        /// Blur direction in degrees, overrides the config file
        #[arg(long, allow_negative_numbers = true)]
        angle: Option<f32>,
    },

    /// Run every effect, each into its own folder under the output
    All(IoArgs),
}

#[derive(Args, Debug, Clone)]
pub struct IoArgs {
    /// Folder with the source images
    #[arg(long)]
    pub input: PathBuf,

    /// Output folder, defaults to the configured one
    #[arg(long)]
    pub output: Option<PathBuf>,
}
