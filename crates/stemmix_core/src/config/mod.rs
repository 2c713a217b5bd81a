//! The `stemmix.toml` settings file.
//!
//! Keys absent from the file fall back to defaults, and
//! [`ConfigManager::update_section`] rewrites a single table in place.
//!
//! ```no_run
//! use stemmix_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new("stemmix.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Engine: {}", config.settings().tools.ffmpeg_path);
//!
//! config.settings_mut().render.timeout_secs = 600;
//! config.update_section(ConfigSection::Render).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, LoggingSettings, PathSettings, RenderDefaults, Settings, ToolSettings,
};
