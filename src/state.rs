use crate::commands::Bridge;
use crate::config::ShellConfig;
use crate::services::FileSystemService;

/// Handle passed to whichever host owns the presentation surface. Created
/// once at startup; there is no process-wide instance.
#[derive(Clone)]
pub struct AppState {
    pub bridge: Bridge,
    pub config: ShellConfig,
}

impl AppState {
    pub fn from_config(config: ShellConfig) -> Self {
        Self {
            bridge: Bridge::new(FileSystemService::new(&config)),
            config,
        }
    }
}
