use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use translator_core::{languages, TrackerSettings, TrackingMode};
use translator_engine::{EngineConfig, ServiceSettings};
use translator_logging::{translator_debug, translator_info};

pub const DEFAULT_CONFIG_FILENAME: &str = "translator.ron";

/// How a file upload is followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum Mode {
    /// The server answers the upload with the document; progress is estimated.
    #[default]
    Simulated,
    /// The server answers with a job id that is polled.
    Polled,
}

impl From<Mode> for TrackingMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Simulated => TrackingMode::Simulated,
            Mode::Polled => TrackingMode::Polled,
        }
    }
}

/// Client settings, read from a RON file. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server_url: String,
    pub mode: Mode,
    pub poll_interval_ms: u64,
    pub tick_interval_ms: u64,
    pub debounce_ms: u64,
    pub poll_retry_limit: u32,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub output_dir: PathBuf,
    pub source_lang: String,
    pub target_lang: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8080".to_string(),
            mode: Mode::Simulated,
            poll_interval_ms: 5000,
            tick_interval_ms: 1000,
            debounce_ms: 500,
            poll_retry_limit: 0,
            connect_timeout_secs: 10,
            request_timeout_secs: 600,
            output_dir: PathBuf::from("./translated"),
            source_lang: languages::AUTO_DETECT.to_string(),
            target_lang: languages::DEFAULT_TARGET.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("could not parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
    #[error("unknown source language {0:?} (see `translator languages`)")]
    UnknownSourceLanguage(String),
    #[error("unknown target language {0:?} (see `translator languages`)")]
    UnknownTargetLanguage(String),
}

/// Values given on the command line; `None` keeps the file value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub server_url: Option<String>,
    pub mode: Option<Mode>,
    pub output_dir: Option<PathBuf>,
    pub source_lang: Option<String>,
    pub target_lang: Option<String>,
}

impl ClientConfig {
    /// Loads `path`, or `./translator.ron` when no path is given.
    ///
    /// A missing default file yields the defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILENAME), false),
        };

        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound && !explicit => {
                translator_info!("No config at {:?}; using defaults", path);
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        let config: Self =
            ron::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?;
        translator_info!("Loaded config from {:?}", path);
        translator_debug!("{:?}", config);
        Ok(config)
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(server_url) = overrides.server_url {
            self.server_url = server_url;
        }
        if let Some(mode) = overrides.mode {
            self.mode = mode;
        }
        if let Some(output_dir) = overrides.output_dir {
            self.output_dir = output_dir;
        }
        if let Some(source_lang) = overrides.source_lang {
            self.source_lang = source_lang;
        }
        if let Some(target_lang) = overrides.target_lang {
            self.target_lang = target_lang;
        }
    }

    /// Catalog names for the configured languages.
    pub fn languages(&self) -> Result<(&'static str, &'static str), ConfigError> {
        let source = languages::resolve_source(&self.source_lang)
            .ok_or_else(|| ConfigError::UnknownSourceLanguage(self.source_lang.clone()))?;
        let target = languages::resolve_target(&self.target_lang)
            .ok_or_else(|| ConfigError::UnknownTargetLanguage(self.target_lang.clone()))?;
        Ok((source, target))
    }

    pub fn tracker_settings(&self) -> TrackerSettings {
        TrackerSettings {
            mode: self.mode.into(),
            tick_interval: Duration::from_millis(self.tick_interval_ms.max(1)),
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            debounce: Duration::from_millis(self.debounce_ms),
            poll_retry_limit: self.poll_retry_limit,
            ..TrackerSettings::default()
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            service: ServiceSettings {
                base_url: self.server_url.clone(),
                connect_timeout: Duration::from_secs(self.connect_timeout_secs),
                request_timeout: Duration::from_secs(self.request_timeout_secs),
                ..ServiceSettings::default()
            },
            output_dir: self.output_dir.clone(),
        }
    }
}
