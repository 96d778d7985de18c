//! The only surface the untrusted presentation side can reach.
//!
//! Exactly the operations in [`OperationName::ALL`] are routed, each to the
//! matching [`FileSystemService`] call. Arguments are plain strings and are
//! handed to the service untouched; validation happens there. Anything that
//! does not decode into an [`OperationRequest`] is answered with an
//! `invalid-request` error and never reaches the service.

use std::sync::Arc;

use serde_json::Value;

use crate::models::{
    BridgeCall, BridgeReply, BridgeResult, DirectoryEntry, DriveInfo, OperationName,
    OperationOutput, OperationRequest, SystemInfo,
};
use crate::services::volume_service::home_dir;
use crate::services::FileSystemService;

#[derive(Clone)]
pub struct Bridge {
    service: Arc<FileSystemService>,
}

impl Bridge {
    pub fn new(service: FileSystemService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    pub fn operations() -> &'static [OperationName] {
        &OperationName::ALL
    }

    pub fn system_info(&self) -> SystemInfo {
        SystemInfo {
            platform: std::env::consts::OS.to_string(),
            home_dir: home_dir().map(|p| p.to_string_lossy().to_string()),
            operations: Self::operations()
                .iter()
                .map(|op| op.as_str().to_string())
                .collect(),
        }
    }

    pub async fn list_directory(&self, path: String) -> BridgeResult<Vec<DirectoryEntry>> {
        self.service.list_directory(&path).await.into()
    }

    pub async fn create_folder(&self, path: String) -> BridgeResult<()> {
        self.service.create_folder(&path).await.into()
    }

    pub async fn delete_item(&self, path: String) -> BridgeResult<()> {
        self.service.delete_item(&path).await.into()
    }

    pub async fn copy_item(&self, source: String, destination: String) -> BridgeResult<()> {
        self.service.copy_item(&source, &destination).await.into()
    }

    pub async fn get_drives(&self) -> BridgeResult<Vec<DriveInfo>> {
        self.service.get_drives().await.into()
    }

    pub async fn dispatch(&self, request: OperationRequest) -> BridgeResult<OperationOutput> {
        let op = request.name();
        tracing::debug!(op = %op, "bridge call");
        match request {
            OperationRequest::ListDirectory { path } => self
                .list_directory(path)
                .await
                .map(OperationOutput::Entries),
            OperationRequest::CreateFolder { path } => {
                self.create_folder(path).await.map(|()| OperationOutput::Done)
            }
            OperationRequest::Delete { path } => {
                self.delete_item(path).await.map(|()| OperationOutput::Done)
            }
            OperationRequest::Copy {
                source,
                destination,
            } => self
                .copy_item(source, destination)
                .await
                .map(|()| OperationOutput::Done),
            OperationRequest::GetDrives => self.get_drives().await.map(OperationOutput::Drives),
        }
    }

    /// Decodes one JSON envelope and answers it. The reply echoes the call id
    /// whenever one could be read, even if the rest of the envelope is bad.
    pub async fn handle_message(&self, raw: &str) -> BridgeReply {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "undecodable bridge message");
                return BridgeReply {
                    id: None,
                    result: BridgeResult::invalid_request(format!("malformed message: {e}")),
                };
            }
        };
        let id = value.get("id").and_then(Value::as_u64);

        match serde_json::from_value::<BridgeCall>(value) {
            Ok(call) => BridgeReply {
                id: Some(call.id),
                result: self.dispatch(call.request).await,
            },
            Err(e) => {
                tracing::warn!(id, error = %e, "rejected bridge request");
                BridgeReply {
                    id,
                    result: BridgeResult::invalid_request(format!("rejected request: {e}")),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::services::volume_service::VolumeEnumerator;
    use crate::services::FileServiceOptions;

    struct NoDrives;

    impl VolumeEnumerator for NoDrives {
        fn enumerate(&self) -> Result<Vec<DriveInfo>, crate::error::AppError> {
            Ok(Vec::new())
        }
    }

    fn bridge() -> Bridge {
        Bridge::new(FileSystemService::with_volumes(
            FileServiceOptions {
                copy_overwrite: false,
                protect_system_paths: true,
            },
            Arc::new(NoDrives),
        ))
    }

    #[test]
    fn exposes_exactly_five_operations() {
        let names: Vec<&str> = Bridge::operations().iter().map(|op| op.as_str()).collect();
        assert_eq!(
            names,
            vec!["list-directory", "create-folder", "delete", "copy", "get-drives"]
        );
        assert_eq!(bridge().system_info().operations.len(), 5);
    }

    #[tokio::test]
    async fn failures_come_back_tagged() {
        let result = bridge()
            .list_directory("/nonexistent/deskshell/dir".to_string())
            .await;
        match result {
            BridgeResult::Err { error, message } => {
                assert_eq!(error, ErrorKind::Io);
                assert!(message.starts_with("IO error"));
            }
            BridgeResult::Ok { .. } => panic!("listing a missing directory succeeded"),
        }
    }

    #[tokio::test]
    async fn dispatch_routes_by_request() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("made");
        let bridge = bridge();

        let created = bridge
            .dispatch(OperationRequest::CreateFolder {
                path: folder.to_string_lossy().to_string(),
            })
            .await;
        assert_eq!(created, BridgeResult::Ok { ok: OperationOutput::Done });
        assert!(folder.is_dir());

        let drives = bridge.dispatch(OperationRequest::GetDrives).await;
        assert_eq!(
            drives,
            BridgeResult::Ok {
                ok: OperationOutput::Drives(Vec::new())
            }
        );
    }

    #[tokio::test]
    async fn unknown_operations_never_reach_the_service() {
        let reply = bridge()
            .handle_message(r#"{"id": 7, "request": {"op": "exec", "args": {"cmd": "id"}}}"#)
            .await;
        assert_eq!(reply.id, Some(7));
        assert!(matches!(
            reply.result,
            BridgeResult::Err {
                error: ErrorKind::InvalidRequest,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn malformed_json_has_no_id() {
        let reply = bridge().handle_message("{ nope").await;
        assert_eq!(reply.id, None);
        assert!(!reply.result.is_ok());
    }
}
