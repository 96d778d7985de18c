use serde::{Deserialize, Serialize};

/// A volume as presented to the file manager. Sizes are pre-formatted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveInfo {
    pub name: String,
    pub path: String,
    pub total: String,
    pub free: String,
    pub used: String,
    pub used_percentage: String,
}

/// Raw byte counts reported by a usage query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UsageStats {
    pub total: u64,
    pub free: u64,
    pub used: u64,
}

impl UsageStats {
    pub fn from_total_and_free(total: u64, free: u64) -> Self {
        Self {
            total,
            free: free.min(total),
            used: total.saturating_sub(free),
        }
    }

    /// Share of the space available to users that is taken, in `[0, 100]`.
    pub fn used_percentage(&self) -> f64 {
        let denominator = self.used.saturating_add(self.free);
        if denominator == 0 {
            return 0.0;
        }
        (self.used as f64 / denominator as f64 * 100.0).clamp(0.0, 100.0)
    }
}

/// Static host facts handed to the presentation side when the bridge opens.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    pub platform: String,
    pub home_dir: Option<String>,
    pub operations: Vec<String>,
}
