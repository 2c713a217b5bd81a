//! Logging for the render pipeline.
//!
//! Two layers:
//!
//! - process-wide `tracing` output on stderr, installed by [`init_tracing`]
//! - a [`JobLogger`] per render job, writing `<logs>/<job>.log` and keeping
//!   the tail of engine stderr for failure reports
//!
//! ```no_run
//! use stemmix_core::logging::{JobLogger, LogConfig};
//!
//! let logger = JobLogger::new("final_mix", "/path/to/logs", LogConfig::default(), None).unwrap();
//! logger.step("Render");
//! logger.command("ffmpeg -i drums.wav -i bass.wav ...");
//! logger.done("Mix written");
//! ```

mod job_logger;
mod types;

pub use job_logger::JobLogger;
pub use types::{LineMarker, LogCallback, LogConfig, LogLevel};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `default_level`. Output goes to stderr so stdout
/// stays free for JSON results. Calling this twice is harmless.
pub fn init_tracing(default_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("stemmix={0},stemmix_core={0}", default_level.as_str())));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init();
}
