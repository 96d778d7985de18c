use crate::error::AppError;
use std::path::{Component, Path};

/// Trees no bridge caller may create in, delete from or copy into.
const PROTECTED_ROOTS: &[&str] = &[
    "/Applications",
    "/bin",
    "/boot",
    "/dev",
    "/etc",
    "/proc",
    "/sbin",
    "/sys",
    "/usr",
    "/System",
    "/Library",
    "C:\\Windows",
    "C:\\Program Files",
    "C:\\Program Files (x86)",
];

/// Filesystem roots themselves. Their children stay writable.
const PROTECTED_EXACT: &[&str] = &["/", "C:\\"];

/// Rejects arguments no legitimate caller produces: empty strings, embedded
/// NUL bytes and `..` components.
pub fn validate_path(path: &str) -> Result<(), AppError> {
    if path.trim().is_empty() {
        return Err(AppError::Rejected("path is empty".to_string()));
    }
    if path.contains('\0') {
        return Err(AppError::Rejected(
            "path contains a NUL byte".to_string(),
        ));
    }
    if Path::new(path)
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(AppError::Rejected(format!(
            "path traversal (.. component) not allowed: {path}"
        )));
    }
    Ok(())
}

pub fn is_protected_path(path: &str) -> bool {
    let normalized = normalize(path);
    let windows = is_windows_style_path(&normalized);
    let same = |a: &str, b: &str| {
        if windows {
            a.eq_ignore_ascii_case(b)
        } else {
            a == b
        }
    };

    if PROTECTED_EXACT
        .iter()
        .any(|root| same(&normalized, &normalize(root)))
    {
        return true;
    }

    PROTECTED_ROOTS.iter().any(|root| {
        let root = normalize(root);
        if windows != is_windows_style_path(&root) {
            return false;
        }
        same(&normalized, &root)
            || (normalized.len() > root.len()
                && normalized
                    .get(..root.len())
                    .is_some_and(|prefix| same(prefix, &root))
                && normalized.as_bytes()[root.len()] == b'/')
    })
}

pub fn validate_not_protected(path: &str) -> Result<(), AppError> {
    if is_protected_path(path) {
        return Err(AppError::Rejected(format!(
            "operation on protected path not allowed: {path}"
        )));
    }
    Ok(())
}

/// Comparison form: forward slashes, no empty or `.` segments, drive roots
/// kept as `C:/`.
fn normalize(path: &str) -> String {
    let unified = path.trim().replace('\\', "/");
    let segments: Vec<&str> = unified
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();
    let joined = segments.join("/");

    if unified.starts_with('/') {
        format!("/{joined}")
    } else if segments.len() == 1 && is_windows_style_path(&joined) && joined.len() == 2 {
        format!("{joined}/")
    } else {
        joined
    }
}

fn is_windows_style_path(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic()
}
