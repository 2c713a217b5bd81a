//! Reading and writing the settings file.
//!
//! The file is plain TOML with one table per [`ConfigSection`]. Writes go
//! through a temporary file in the same directory and a rename, so a crash
//! never leaves a half-written config. Section updates edit the existing
//! document with `toml_edit`, keeping user comments and other sections.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use toml_edit::{DocumentMut, Item, Table};

use super::settings::{ConfigSection, Settings};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Cannot read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Cannot write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("Invalid settings in {}: {source}", .path.display())]
    Invalid {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Cannot edit {}: {source}", .path.display())]
    Edit {
        path: PathBuf,
        source: toml_edit::TomlError,
    },

    #[error("Cannot serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Owns the settings file at one path and the settings last read from it.
pub struct ConfigManager {
    path: PathBuf,
    settings: Settings,
}

impl ConfigManager {
    /// Nothing is read until [`load`](Self::load) or
    /// [`load_or_create`](Self::load_or_create).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            settings: Settings::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// In-memory only until `save` or `update_section`.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn logs_folder(&self) -> PathBuf {
        PathBuf::from(&self.settings.paths.logs_folder)
    }

    /// Read the file; keys it does not set keep their defaults.
    pub fn load(&mut self) -> ConfigResult<()> {
        let text = self.read()?.ok_or_else(|| ConfigError::NotFound(self.path.clone()))?;
        self.settings = self.parse(&text)?;
        tracing::debug!("Loaded settings from {}", self.path.display());
        Ok(())
    }

    /// Read the file, or write a commented default one if there is none.
    ///
    /// Tables missing from an existing file are appended with their
    /// defaults so the file documents every option.
    pub fn load_or_create(&mut self) -> ConfigResult<()> {
        let Some(text) = self.read()? else {
            tracing::info!("Writing default settings to {}", self.path.display());
            self.settings = Settings::default();
            return self.save();
        };

        self.settings = self.parse(&text)?;
        let doc = self.edit_document(&text)?;
        for section in ConfigSection::all() {
            if !doc.contains_key(section.table_name()) {
                tracing::debug!("Adding [{}] to {}", section.table_name(), self.path.display());
                self.update_section(section)?;
            }
        }
        Ok(())
    }

    /// Rewrite the whole file from the current settings.
    pub fn save(&self) -> ConfigResult<()> {
        let mut doc = DocumentMut::new();
        for section in ConfigSection::all() {
            let mut table = self.section_table(section)?;
            table
                .decor_mut()
                .set_prefix(format!("\n# {}\n", section_comment(section)));
            doc.insert(section.table_name(), Item::Table(table));
        }

        let text = format!("# stemmix settings\n{}", doc);
        self.write_atomic(&text)
    }

    /// Write one table from the current settings, leaving the rest of the
    /// file as it is on disk now.
    pub fn update_section(&mut self, section: ConfigSection) -> ConfigResult<()> {
        let text = self.read()?.unwrap_or_default();
        let mut doc = self.edit_document(&text)?;

        let table = self.section_table(section)?;
        match doc.get_mut(section.table_name()).and_then(Item::as_table_mut) {
            Some(existing) => {
                // Keep the comment above the table header
                let decor = existing.decor().clone();
                *existing = table;
                *existing.decor_mut() = decor;
            }
            None => {
                doc.insert(section.table_name(), Item::Table(table));
            }
        }

        self.write_atomic(&doc.to_string())
    }

    fn read(&self) -> ConfigResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ConfigError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn parse(&self, text: &str) -> ConfigResult<Settings> {
        toml::from_str(text).map_err(|source| ConfigError::Invalid {
            path: self.path.clone(),
            source,
        })
    }

    fn edit_document(&self, text: &str) -> ConfigResult<DocumentMut> {
        text.parse().map_err(|source| ConfigError::Edit {
            path: self.path.clone(),
            source,
        })
    }

    fn section_table(&self, section: ConfigSection) -> ConfigResult<Table> {
        let text = match section {
            ConfigSection::Tools => toml::to_string(&self.settings.tools)?,
            ConfigSection::Render => toml::to_string(&self.settings.render)?,
            ConfigSection::Paths => toml::to_string(&self.settings.paths)?,
            ConfigSection::Logging => toml::to_string(&self.settings.logging)?,
        };
        let doc = self.edit_document(&text)?;
        Ok(doc.as_table().clone())
    }

    fn write_atomic(&self, text: &str) -> ConfigResult<()> {
        let write_err = |source| ConfigError::Write {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(write_err)?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(text.as_bytes()).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;
        Ok(())
    }
}

fn section_comment(section: ConfigSection) -> &'static str {
    match section {
        ConfigSection::Tools => "Render engine and probe executables (names on PATH or absolute paths)",
        ConfigSection::Render => "Render defaults; timeout_secs = 0 disables the timeout",
        ConfigSection::Paths => "Where relative output paths and job logs go",
        ConfigSection::Logging => "Per-job log files",
    }
}
