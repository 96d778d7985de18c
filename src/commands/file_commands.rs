//! Webview-facing command table. Every command resolves; failures travel
//! inside the returned [`BridgeResult`] instead of rejecting the promise.

use tauri::{command, State};

use crate::error::AppError;
use crate::models::{BridgeResult, DirectoryEntry, DriveInfo};
use crate::state::AppState;

#[command]
pub async fn list_directory(
    path: String,
    state: State<'_, AppState>,
) -> Result<BridgeResult<Vec<DirectoryEntry>>, AppError> {
    Ok(state.bridge.list_directory(path).await)
}

#[command]
pub async fn create_folder(
    path: String,
    state: State<'_, AppState>,
) -> Result<BridgeResult<()>, AppError> {
    Ok(state.bridge.create_folder(path).await)
}

#[command]
pub async fn delete_item(
    path: String,
    state: State<'_, AppState>,
) -> Result<BridgeResult<()>, AppError> {
    Ok(state.bridge.delete_item(path).await)
}

#[command]
pub async fn copy_item(
    source: String,
    destination: String,
    state: State<'_, AppState>,
) -> Result<BridgeResult<()>, AppError> {
    Ok(state.bridge.copy_item(source, destination).await)
}

#[command]
pub async fn get_drives(
    state: State<'_, AppState>,
) -> Result<BridgeResult<Vec<DriveInfo>>, AppError> {
    Ok(state.bridge.get_drives().await)
}
