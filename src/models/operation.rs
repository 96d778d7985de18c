use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorKind};
use crate::models::{DirectoryEntry, DriveInfo};

/// The complete set of operations reachable across the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationName {
    ListDirectory,
    CreateFolder,
    Delete,
    Copy,
    GetDrives,
}

impl OperationName {
    pub const ALL: [OperationName; 5] = [
        Self::ListDirectory,
        Self::CreateFolder,
        Self::Delete,
        Self::Copy,
        Self::GetDrives,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListDirectory => "list-directory",
            Self::CreateFolder => "create-folder",
            Self::Delete => "delete",
            Self::Copy => "copy",
            Self::GetDrives => "get-drives",
        }
    }
}

impl std::fmt::Display for OperationName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OperationName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| format!("unknown operation: {s}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "op",
    content = "args",
    rename_all = "kebab-case",
    deny_unknown_fields
)]
pub enum OperationRequest {
    ListDirectory { path: String },
    CreateFolder { path: String },
    Delete { path: String },
    Copy { source: String, destination: String },
    GetDrives,
}

impl OperationRequest {
    pub fn name(&self) -> OperationName {
        match self {
            Self::ListDirectory { .. } => OperationName::ListDirectory,
            Self::CreateFolder { .. } => OperationName::CreateFolder,
            Self::Delete { .. } => OperationName::Delete,
            Self::Copy { .. } => OperationName::Copy,
            Self::GetDrives => OperationName::GetDrives,
        }
    }
}

/// Tagged outcome sent back across the bridge: `{"ok": T}` or
/// `{"error": kind, "message": text}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BridgeResult<T> {
    Ok { ok: T },
    Err { error: ErrorKind, message: String },
}

impl<T> BridgeResult<T> {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::Err {
            error: ErrorKind::InvalidRequest,
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> BridgeResult<U> {
        match self {
            Self::Ok { ok } => BridgeResult::Ok { ok: f(ok) },
            Self::Err { error, message } => BridgeResult::Err { error, message },
        }
    }
}

impl<T> From<Result<T, AppError>> for BridgeResult<T> {
    fn from(result: Result<T, AppError>) -> Self {
        match result {
            Ok(ok) => Self::Ok { ok },
            Err(err) => Self::Err {
                error: err.kind(),
                message: err.to_string(),
            },
        }
    }
}

/// Operation-specific success payload. Mutations carry no data and
/// serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OperationOutput {
    Entries(Vec<DirectoryEntry>),
    Drives(Vec<DriveInfo>),
    Done,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BridgeCall {
    pub id: u64,
    pub request: OperationRequest,
}

#[derive(Debug, Clone, Serialize)]
pub struct BridgeReply {
    /// Absent only when the envelope itself could not be decoded.
    pub id: Option<u64>,
    pub result: BridgeResult<OperationOutput>,
}
