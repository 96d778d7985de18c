//! Drive usage queries.
//!
//! Two interchangeable sources: the native disk table maintained by the OS
//! (via `sysinfo`) and the platform's command-line reporting utility, whose
//! text output is parsed here. [`provider_for`] picks one, or chains them.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use sysinfo::Disks;

use crate::config::UsageSource;
use crate::error::AppError;
use crate::models::UsageStats;

pub trait UsageStatsProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Total, free and used bytes of the volume holding `volume`.
    fn usage(&self, volume: &Path) -> Result<UsageStats, AppError>;
}

pub fn provider_for(source: UsageSource) -> Arc<dyn UsageStatsProvider> {
    match source {
        UsageSource::Native => Arc::new(NativeUsageProvider),
        UsageSource::Command => Arc::new(CommandUsageProvider),
        UsageSource::Auto => Arc::new(FallbackUsageProvider {
            primary: Box::new(NativeUsageProvider),
            fallback: Box::new(CommandUsageProvider),
        }),
    }
}

/// Reads the OS mount table and picks the deepest mount point containing the
/// requested path.
pub struct NativeUsageProvider;

impl UsageStatsProvider for NativeUsageProvider {
    fn name(&self) -> &'static str {
        "native"
    }

    fn usage(&self, volume: &Path) -> Result<UsageStats, AppError> {
        let target = std::fs::canonicalize(volume).unwrap_or_else(|_| volume.to_path_buf());
        let disks = Disks::new_with_refreshed_list();
        let mounts = disks
            .list()
            .iter()
            .map(|disk| {
                (
                    disk.mount_point().to_path_buf(),
                    UsageStats::from_total_and_free(disk.total_space(), disk.available_space()),
                )
            })
            .collect::<Vec<_>>();

        best_mount(&target, &mounts).ok_or_else(|| {
            AppError::Usage(format!("no mounted volume contains {}", volume.display()))
        })
    }
}

fn best_mount(target: &Path, mounts: &[(PathBuf, UsageStats)]) -> Option<UsageStats> {
    mounts
        .iter()
        .filter(|(mount, _)| target.starts_with(mount))
        .max_by_key(|(mount, _)| mount.components().count())
        .map(|(_, stats)| *stats)
}

/// Shells out to `df` on POSIX hosts and `wmic` on Windows.
pub struct CommandUsageProvider;

impl UsageStatsProvider for CommandUsageProvider {
    fn name(&self) -> &'static str {
        "command"
    }

    fn usage(&self, volume: &Path) -> Result<UsageStats, AppError> {
        if cfg!(windows) {
            let filter = format!("DeviceID='{}'", device_id(volume)?);
            let output = run_utility(
                Command::new("wmic").args([
                    "logicaldisk",
                    "where",
                    filter.as_str(),
                    "get",
                    "Size,FreeSpace",
                    "/value",
                ]),
                "wmic",
            )?;
            parse_wmic_output(&output)
        } else {
            let output = run_utility(Command::new("df").arg("-kP").arg(volume), "df")?;
            parse_df_output(&output)
        }
    }
}

/// Native query first; when it fails, the command-line utility.
pub struct FallbackUsageProvider {
    pub primary: Box<dyn UsageStatsProvider>,
    pub fallback: Box<dyn UsageStatsProvider>,
}

impl UsageStatsProvider for FallbackUsageProvider {
    fn name(&self) -> &'static str {
        "auto"
    }

    fn usage(&self, volume: &Path) -> Result<UsageStats, AppError> {
        self.primary.usage(volume).or_else(|err| {
            tracing::debug!(
                volume = %volume.display(),
                provider = self.primary.name(),
                error = %err,
                "usage query failed, trying {}",
                self.fallback.name()
            );
            self.fallback.usage(volume)
        })
    }
}

fn run_utility(command: &mut Command, label: &str) -> Result<String, AppError> {
    let output = command
        .output()
        .map_err(|e| AppError::Usage(format!("failed to run {label}: {e}")))?;
    if !output.status.success() {
        return Err(AppError::Usage(format!(
            "{label} exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

fn device_id(volume: &Path) -> Result<String, AppError> {
    let raw = volume.to_string_lossy();
    let bytes = raw.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        Ok(raw[..2].to_ascii_uppercase())
    } else {
        Err(AppError::Usage(format!("not a drive letter path: {raw}")))
    }
}

/// Parses POSIX `df -kP` output. Sizes are reported in 1024-byte blocks.
pub fn parse_df_output(output: &str) -> Result<UsageStats, AppError> {
    let row = output
        .lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .last()
        .ok_or_else(|| AppError::Usage("df printed no data row".to_string()))?;

    let fields: Vec<&str> = row.split_whitespace().collect();
    if fields.len() < 4 {
        return Err(AppError::Usage(format!("unexpected df row: {row}")));
    }

    let blocks = |index: usize| -> Result<u64, AppError> {
        fields[index]
            .parse::<u64>()
            .map(|kb| kb.saturating_mul(1024))
            .map_err(|e| AppError::Usage(format!("bad df field {:?}: {e}", fields[index])))
    };

    Ok(UsageStats {
        total: blocks(1)?,
        used: blocks(2)?,
        free: blocks(3)?,
    })
}

/// Parses `wmic ... get Size,FreeSpace /value` output (`Key=Value` lines in
/// any order, CRLF endings, blank padding).
pub fn parse_wmic_output(output: &str) -> Result<UsageStats, AppError> {
    let mut size = None;
    let mut free = None;

    for line in output.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        let parsed = value
            .parse::<u64>()
            .map_err(|e| AppError::Usage(format!("bad wmic value {key}={value}: {e}")))?;
        match key.trim() {
            "Size" => size = Some(parsed),
            "FreeSpace" => free = Some(parsed),
            _ => {}
        }
    }

    match (size, free) {
        (Some(total), Some(free)) => Ok(UsageStats::from_total_and_free(total, free)),
        _ => Err(AppError::Usage(
            "wmic did not report Size and FreeSpace".to_string(),
        )),
    }
}
