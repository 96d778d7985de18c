pub mod file_service;
pub mod usage_stats;
pub mod volume_service;

pub use file_service::{FileServiceOptions, FileSystemService};
