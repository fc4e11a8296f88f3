//! # CUtil - Common Utilities Library
//!
//! Small helpers shared by the augmentation crates.
//!
//! ## Features
//!
//! - `fs`: File system utilities (extension filtering, sorted listings, file names)
//! - `time`: Time formatting utilities (log timestamps, elapsed durations)

#[cfg(feature = "fs")]
pub mod fs;

#[cfg(feature = "time")]
pub mod time;
