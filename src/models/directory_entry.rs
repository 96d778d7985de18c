use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::Metadata;
use std::path::Path;

/// One immediate child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub name: String,
    pub path: String,
    pub is_directory: bool,
    /// Byte length, absent for directories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    pub modified_at: DateTime<Utc>,
}

impl DirectoryEntry {
    /// Builds an entry from a metadata probe. Fails when the platform cannot
    /// report a modification time, which callers treat like any other
    /// unreadable child.
    pub fn from_metadata(path: &Path, metadata: &Metadata) -> std::io::Result<Self> {
        let modified = metadata.modified()?;
        let is_directory = metadata.is_dir();
        Ok(Self {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            path: path.to_string_lossy().to_string(),
            is_directory,
            size: (!is_directory).then(|| metadata.len()),
            modified_at: DateTime::<Utc>::from(modified),
        })
    }
}
