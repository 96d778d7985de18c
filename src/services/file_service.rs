use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinSet;
use walkdir::WalkDir;

use crate::config::ShellConfig;
use crate::error::AppError;
use crate::models::{DirectoryEntry, DriveInfo, OperationName};
use crate::services::volume_service::{select_volume_enumerator, VolumeEnumerator};
use crate::shell::safety::{validate_not_protected, validate_path};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileServiceOptions {
    pub copy_overwrite: bool,
    pub protect_system_paths: bool,
}

impl From<&ShellConfig> for FileServiceOptions {
    fn from(config: &ShellConfig) -> Self {
        Self {
            copy_overwrite: config.copy_overwrite,
            protect_system_paths: config.protect_system_paths,
        }
    }
}

/// Owns every interaction with the host file system. Holds no state between
/// calls beyond its options and the volume strategy picked at startup.
#[derive(Clone)]
pub struct FileSystemService {
    options: FileServiceOptions,
    volumes: Arc<dyn VolumeEnumerator>,
}

impl FileSystemService {
    pub fn new(config: &ShellConfig) -> Self {
        Self::with_volumes(config.into(), select_volume_enumerator(config))
    }

    pub fn with_volumes(options: FileServiceOptions, volumes: Arc<dyn VolumeEnumerator>) -> Self {
        Self { options, volumes }
    }

    /// Immediate children of `path` in OS enumeration order. Children whose
    /// metadata cannot be read are left out.
    pub async fn list_directory(&self, path: &str) -> Result<Vec<DirectoryEntry>, AppError> {
        self.list_directory_inner(path)
            .await
            .map_err(|e| report(OperationName::ListDirectory, path, e))
    }

    async fn list_directory_inner(&self, path: &str) -> Result<Vec<DirectoryEntry>, AppError> {
        validate_path(path)?;

        let mut reader = tokio::fs::read_dir(path).await?;
        let mut children = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            children.push(entry.path());
        }

        let mut probes = JoinSet::new();
        for (index, child) in children.iter().cloned().enumerate() {
            probes.spawn(async move {
                let entry = match tokio::fs::metadata(&child).await {
                    Ok(metadata) => DirectoryEntry::from_metadata(&child, &metadata),
                    Err(e) => Err(e),
                };
                (index, child, entry)
            });
        }

        let mut slots: Vec<Option<DirectoryEntry>> = vec![None; children.len()];
        while let Some(probe) = probes.join_next().await {
            let (index, child, entry) = probe?;
            match entry {
                Ok(entry) => slots[index] = Some(entry),
                Err(e) => {
                    tracing::debug!(path = %child.display(), error = %e, "dropping unreadable entry");
                }
            }
        }

        Ok(slots.into_iter().flatten().collect())
    }

    /// Creates exactly one directory level.
    pub async fn create_folder(&self, path: &str) -> Result<(), AppError> {
        async {
            validate_path(path)?;
            self.guard_mutation(path)?;
            tokio::fs::create_dir(path).await?;
            Ok::<_, AppError>(())
        }
        .await
        .map_err(|e| report(OperationName::CreateFolder, path, e))
    }

    /// Permanently removes a file, or a directory with everything under it.
    /// A symlink is removed as a link, its target is untouched.
    pub async fn delete_item(&self, path: &str) -> Result<(), AppError> {
        async {
            validate_path(path)?;
            self.guard_mutation(path)?;
            let metadata = tokio::fs::symlink_metadata(path).await?;
            if metadata.is_dir() {
                tokio::fs::remove_dir_all(path).await?;
            } else {
                tokio::fs::remove_file(path).await?;
            }
            Ok::<_, AppError>(())
        }
        .await
        .map_err(|e| report(OperationName::Delete, path, e))
    }

    /// Copies a file byte for byte, or a directory tree. Not atomic: a failure
    /// partway through leaves what was already copied.
    pub async fn copy_item(&self, source: &str, destination: &str) -> Result<(), AppError> {
        async {
            validate_path(source)?;
            validate_path(destination)?;
            self.guard_mutation(destination)?;

            let metadata = tokio::fs::metadata(source).await?;
            let src = PathBuf::from(source);
            let dest = PathBuf::from(destination);
            let overwrite = self.options.copy_overwrite;

            if metadata.is_dir() {
                if is_within(&src, &dest)? {
                    return Err(AppError::Rejected(format!(
                        "cannot copy {source} into itself ({destination})"
                    )));
                }
                tokio::task::spawn_blocking(move || copy_dir_recursive(&src, &dest, overwrite))
                    .await??;
            } else {
                if resolve(&dest)? == resolve(&src)? {
                    return Err(AppError::Rejected(format!(
                        "source and destination are the same file: {source}"
                    )));
                }
                tokio::task::spawn_blocking(move || copy_file(&src, &dest, overwrite)).await??;
            }
            Ok::<_, AppError>(())
        }
        .await
        .map_err(|e| report(OperationName::Copy, &format!("{source} -> {destination}"), e))
    }

    pub async fn get_drives(&self) -> Result<Vec<DriveInfo>, AppError> {
        let volumes = self.volumes.clone();
        let drives = match tokio::task::spawn_blocking(move || volumes.enumerate()).await {
            Ok(drives) => drives,
            Err(e) => Err(e.into()),
        };
        drives.map_err(|e| report(OperationName::GetDrives, "", e))
    }

    fn guard_mutation(&self, path: &str) -> Result<(), AppError> {
        if self.options.protect_system_paths {
            validate_not_protected(path)?;
        }
        Ok(())
    }
}

fn report(op: OperationName, path: &str, err: AppError) -> AppError {
    tracing::error!(op = %op, path, error = %err, "file operation failed");
    err.capture()
}

fn copy_file(src: &Path, dest: &Path, overwrite: bool) -> Result<(), AppError> {
    if overwrite {
        fs::copy(src, dest)?;
        return Ok(());
    }

    let mut reader = fs::File::open(src)?;
    let mut writer = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dest)?;
    io::copy(&mut reader, &mut writer)?;
    writer.set_permissions(reader.metadata()?.permissions())?;
    Ok(())
}

fn copy_dir_recursive(src: &Path, dest: &Path, overwrite: bool) -> Result<(), AppError> {
    if !overwrite && fs::symlink_metadata(dest).is_ok() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("destination already exists: {}", dest.display()),
        )
        .into());
    }

    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry.path().strip_prefix(src).map_err(io::Error::other)?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            match fs::create_dir(&target) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists && target.is_dir() => {}
                Err(e) => return Err(e.into()),
            }
        } else {
            copy_file(entry.path(), &target, overwrite)?;
        }
    }
    Ok(())
}

/// Absolute form of `path` for comparisons. The last component may not exist
/// yet, so only the parent is canonicalized.
fn resolve(path: &Path) -> Result<PathBuf, AppError> {
    if let Ok(canonical) = fs::canonicalize(path) {
        return Ok(canonical);
    }
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::canonicalize(parent)?,
        _ => std::env::current_dir()?,
    };
    Ok(match path.file_name() {
        Some(name) => parent.join(name),
        None => parent,
    })
}

fn is_within(root: &Path, candidate: &Path) -> Result<bool, AppError> {
    Ok(resolve(candidate)?.starts_with(resolve(root)?))
}
