use std::fs;
use std::path::Path;
use std::sync::Arc;

use deskshell_lib::models::{BridgeResult, DirectoryEntry, DriveInfo, UsageStats};
use deskshell_lib::services::volume_service::{drive_info, VolumeEnumerator};
use deskshell_lib::services::{FileServiceOptions, FileSystemService};
use deskshell_lib::{AppError, Bridge};
use serde_json::{json, Value};

struct StaticVolumes;

impl VolumeEnumerator for StaticVolumes {
    fn enumerate(&self) -> Result<Vec<DriveInfo>, AppError> {
        Ok(vec![
            drive_info("Root", "/", &UsageStats::from_total_and_free(1 << 40, 1 << 38)),
            drive_info("Home", "/home/u", &UsageStats::from_total_and_free(1536, 1536)),
        ])
    }
}

fn bridge() -> Bridge {
    Bridge::new(FileSystemService::with_volumes(
        FileServiceOptions {
            copy_overwrite: false,
            protect_system_paths: true,
        },
        Arc::new(StaticVolumes),
    ))
}

async fn call(bridge: &Bridge, id: u64, request: Value) -> Value {
    let raw = json!({ "id": id, "request": request }).to_string();
    let reply = bridge.handle_message(&raw).await;
    assert_eq!(reply.id, Some(id));
    serde_json::to_value(&reply.result).unwrap()
}

async fn list(bridge: &Bridge, dir: &Path) -> Vec<DirectoryEntry> {
    let result = call(
        bridge,
        1,
        json!({ "op": "list-directory", "args": { "path": dir } }),
    )
    .await;
    serde_json::from_value(result["ok"].clone()).unwrap()
}

#[tokio::test]
async fn create_list_copy_delete_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let bridge = bridge();
    let folder = dir.path().join("projects");

    let created = call(
        &bridge,
        10,
        json!({ "op": "create-folder", "args": { "path": folder } }),
    )
    .await;
    assert_eq!(created, json!({ "ok": null }));

    let entries = list(&bridge, dir.path()).await;
    let entry = entries.iter().find(|e| e.name == "projects").unwrap();
    assert!(entry.is_directory);

    fs::write(folder.join("plan.txt"), "ship it").unwrap();
    let copy = dir.path().join("projects-copy");
    let copied = call(
        &bridge,
        11,
        json!({ "op": "copy", "args": { "source": folder, "destination": copy } }),
    )
    .await;
    assert_eq!(copied, json!({ "ok": null }));
    assert_eq!(fs::read_to_string(copy.join("plan.txt")).unwrap(), "ship it");

    let deleted = call(
        &bridge,
        12,
        json!({ "op": "delete", "args": { "path": folder } }),
    )
    .await;
    assert_eq!(deleted, json!({ "ok": null }));

    let names: Vec<String> = list(&bridge, dir.path())
        .await
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, vec!["projects-copy".to_string()]);
}

#[tokio::test]
async fn listing_a_missing_directory_reports_io_error() {
    let result = call(
        &bridge(),
        2,
        json!({ "op": "list-directory", "args": { "path": "/nonexistent/deskshell" } }),
    )
    .await;
    assert_eq!(result["error"], "io");
    assert!(!result["message"].as_str().unwrap().is_empty());
    assert!(result.get("ok").is_none());
}

#[tokio::test]
async fn entries_use_camel_case_and_omit_directory_sizes() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("f.txt"), "1234").unwrap();

    let result = call(
        &bridge(),
        3,
        json!({ "op": "list-directory", "args": { "path": dir.path() } }),
    )
    .await;
    let entries = result["ok"].as_array().unwrap();

    for entry in entries {
        let is_dir = entry["isDirectory"].as_bool().unwrap();
        assert_eq!(entry.get("size").is_some(), !is_dir);
        assert!(entry["modifiedAt"].is_string());
    }
}

#[tokio::test]
async fn drives_come_back_formatted() {
    let result = call(&bridge(), 4, json!({ "op": "get-drives" })).await;
    let drives: Vec<DriveInfo> = serde_json::from_value(result["ok"].clone()).unwrap();

    assert_eq!(drives[0].total, "1.0 TB");
    assert_eq!(drives[0].used_percentage, "75.0");
    assert_eq!(drives[1].total, "1.5 KB");
    assert_eq!(drives[1].used, "0.0 B");
    for drive in &drives {
        let pct: f64 = drive.used_percentage.parse().unwrap();
        assert!((0.0..=100.0).contains(&pct));
    }
}

#[tokio::test]
async fn operations_outside_the_table_are_refused() {
    for op in ["read-file", "spawn", "fs:list-directory", "LIST-DIRECTORY"] {
        let result = call(&bridge(), 5, json!({ "op": op, "args": { "path": "/" } })).await;
        assert_eq!(result["error"], "invalid-request", "{op} was accepted");
    }
}

#[tokio::test]
async fn typed_methods_match_message_dispatch() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("x"), "x").unwrap();
    let bridge = bridge();

    let typed = bridge
        .list_directory(dir.path().to_string_lossy().to_string())
        .await;
    let BridgeResult::Ok { ok: typed } = typed else {
        panic!("typed listing failed");
    };
    assert_eq!(typed, list(&bridge, dir.path()).await);
}
