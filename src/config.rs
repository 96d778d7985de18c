use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::AppError;

const CONFIG_PATH_ENV: &str = "DESKSHELL_CONFIG";
const COPY_OVERWRITE_ENV: &str = "DESKSHELL_COPY_OVERWRITE";
const USAGE_SOURCE_ENV: &str = "DESKSHELL_USAGE_SOURCE";

/// Where drive usage numbers come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageSource {
    /// Native query first, command-line utility when that fails.
    #[default]
    Auto,
    Native,
    Command,
}

impl std::str::FromStr for UsageSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "native" => Ok(Self::Native),
            "command" => Ok(Self::Command),
            _ => Err(format!("unknown usage source: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Replace files and merge directories when a copy destination exists.
    pub copy_overwrite: bool,
    pub usage_source: UsageSource,
    /// Refuse mutations under OS system roots.
    pub protect_system_paths: bool,
    pub log_level: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            copy_overwrite: false,
            usage_source: UsageSource::Auto,
            protect_system_paths: true,
            log_level: "info".to_string(),
        }
    }
}

impl ShellConfig {
    /// Resolves the config file, reads it if present and applies environment
    /// overrides.
    pub fn load() -> Result<Self, AppError> {
        let mut config = match config_file_path() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&raw)
            .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(COPY_OVERWRITE_ENV) {
            self.copy_overwrite = parse_flag(&raw).ok_or_else(|| {
                AppError::Config(format!("{COPY_OVERWRITE_ENV} must be a boolean, got {raw}"))
            })?;
        }
        if let Some(raw) = lookup(USAGE_SOURCE_ENV) {
            self.usage_source = raw.parse().map_err(AppError::Config)?;
        }
        Ok(())
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn config_file_path() -> Option<PathBuf> {
    if let Ok(explicit) = std::env::var(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(explicit));
    }
    directories::ProjectDirs::from("dev", "deskshell", "deskshell")
        .map(|dirs| dirs.config_dir().join("config.json"))
}
