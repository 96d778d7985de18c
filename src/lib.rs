pub mod commands;
pub mod config;
pub mod error;
mod logging;
pub mod models;
pub mod services;
mod shell;
mod state;
pub mod transport;

pub use commands::Bridge;
pub use config::ShellConfig;
pub use error::{AppError, ErrorKind};
pub use state::AppState;

pub fn run() {
    if let Err(e) = try_run() {
        eprintln!("deskshell: {e:#}");
        std::process::exit(1);
    }
}

fn try_run() -> anyhow::Result<()> {
    let _guard = logging::init_sentry();
    let config = ShellConfig::load()?;
    logging::init_logging(&config)?;
    tracing::info!(
        copy_overwrite = config.copy_overwrite,
        usage_source = ?config.usage_source,
        protect_system_paths = config.protect_system_paths,
        "starting file-system bridge"
    );
    launch(AppState::from_config(config))
}

#[cfg(not(feature = "desktop"))]
fn launch(state: AppState) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(transport::serve_stdio(state.bridge))
}

#[cfg(feature = "desktop")]
fn launch(state: AppState) -> anyhow::Result<()> {
    use commands::file_commands;

    tauri::Builder::default()
        .manage(state)
        .invoke_handler(tauri::generate_handler![
            file_commands::list_directory,
            file_commands::create_folder,
            file_commands::delete_item,
            file_commands::copy_item,
            file_commands::get_drives,
        ])
        .run(tauri::generate_context!())?;
    Ok(())
}
