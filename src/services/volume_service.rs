use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::ShellConfig;
use crate::error::AppError;
use crate::models::{DriveInfo, UsageStats};
use crate::services::usage_stats::{provider_for, UsageStatsProvider};

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Lists the volumes a file manager should offer as starting points.
pub trait VolumeEnumerator: Send + Sync {
    fn enumerate(&self) -> Result<Vec<DriveInfo>, AppError>;
}

/// Chooses the strategy for the host platform. Called once at startup.
pub fn select_volume_enumerator(config: &ShellConfig) -> Arc<dyn VolumeEnumerator> {
    let usage = provider_for(config.usage_source);
    if cfg!(windows) {
        Arc::new(LetterProbeEnumerator::new(usage))
    } else {
        Arc::new(RootAndHomeEnumerator::new(usage, home_dir()))
    }
}

pub fn home_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}

/// Probes `A:` through `Z:` and reports the letters that answer.
pub struct LetterProbeEnumerator {
    usage: Arc<dyn UsageStatsProvider>,
    probe: fn(&Path) -> bool,
}

impl LetterProbeEnumerator {
    pub fn new(usage: Arc<dyn UsageStatsProvider>) -> Self {
        Self {
            usage,
            probe: volume_answers,
        }
    }

    pub fn with_probe(usage: Arc<dyn UsageStatsProvider>, probe: fn(&Path) -> bool) -> Self {
        Self { usage, probe }
    }
}

fn volume_answers(root: &Path) -> bool {
    std::fs::metadata(root).is_ok()
}

impl VolumeEnumerator for LetterProbeEnumerator {
    fn enumerate(&self) -> Result<Vec<DriveInfo>, AppError> {
        let mut drives = Vec::new();
        for letter in 'A'..='Z' {
            let name = format!("{letter}:");
            let root = PathBuf::from(format!("{letter}:\\"));
            if !(self.probe)(&root) {
                continue;
            }
            match self.usage.usage(&root) {
                Ok(stats) => drives.push(drive_info(&name, &root.to_string_lossy(), &stats)),
                Err(err) => {
                    tracing::debug!(drive = %name, error = %err, "skipping drive without usage stats");
                }
            }
        }
        Ok(drives)
    }
}

/// POSIX hosts: the root filesystem and the filesystem holding the home
/// directory, which may be the same volume.
pub struct RootAndHomeEnumerator {
    usage: Arc<dyn UsageStatsProvider>,
    root: PathBuf,
    home: Option<PathBuf>,
}

impl RootAndHomeEnumerator {
    pub fn new(usage: Arc<dyn UsageStatsProvider>, home: Option<PathBuf>) -> Self {
        Self {
            usage,
            root: PathBuf::from("/"),
            home,
        }
    }
}

impl VolumeEnumerator for RootAndHomeEnumerator {
    fn enumerate(&self) -> Result<Vec<DriveInfo>, AppError> {
        let home = self
            .home
            .as_ref()
            .ok_or_else(|| AppError::Usage("could not resolve home directory".to_string()))?;

        let root_stats = self.usage.usage(&self.root)?;
        let home_stats = self.usage.usage(home)?;

        Ok(vec![
            drive_info("Root", &self.root.to_string_lossy(), &root_stats),
            drive_info("Home", &home.to_string_lossy(), &home_stats),
        ])
    }
}

pub fn drive_info(name: &str, path: &str, stats: &UsageStats) -> DriveInfo {
    DriveInfo {
        name: name.to_string(),
        path: path.to_string(),
        total: format_bytes(stats.total),
        free: format_bytes(stats.free),
        used: format_bytes(stats.used),
        used_percentage: format!("{:.1}", stats.used_percentage()),
    }
}

/// Largest unit that keeps the value under 1024, one decimal place.
pub fn format_bytes(bytes: u64) -> String {
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.1} {}", SIZE_UNITS[unit])
}
