use tracing_subscriber::EnvFilter;

use crate::config::ShellConfig;

const LOG_FILTER_ENV: &str = "DESKSHELL_LOG";

/// Logs go to stderr; stdout belongs to the bridge when serving over stdio.
pub fn init_logging(config: &ShellConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))
}

/// Error reporting is opt-in through `SENTRY_DSN`.
pub fn init_sentry() -> Option<sentry::ClientInitGuard> {
    std::env::var("SENTRY_DSN")
        .ok()
        .filter(|dsn| !dsn.trim().is_empty())
        .map(|dsn| {
            sentry::init((
                dsn,
                sentry::ClientOptions {
                    release: sentry::release_name!(),
                    send_default_pii: false,
                    ..Default::default()
                },
            ))
        })
}
