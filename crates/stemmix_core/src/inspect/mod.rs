//! Audio file inspection via the probe tool.
//!
//! Runs `ffprobe -v quiet -print_format json -show_format -show_streams <file>`
//! and reduces its output to an [`AudioMetadata`](crate::models::AudioMetadata)
//! record. Only container and stream headers are read; no samples are decoded,
//! so inspection is cheap for arbitrarily large files.
//!
//! # Usage
//!
//! ```ignore
//! use stemmix_core::inspect::AudioInspector;
//!
//! let inspector = AudioInspector::new("/usr/bin/ffprobe");
//! let meta = inspector.inspect(Path::new("/stems/vocals.wav")).await?;
//! println!("{} Hz, {} ch", meta.sample_rate_hz, meta.channels);
//! ```

mod inspector;
mod parse;
mod types;

pub use inspector::AudioInspector;
pub use parse::parse_probe_output;
pub use types::{InspectError, InspectResult};
