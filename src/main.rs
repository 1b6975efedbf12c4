//! EnergyFlow dashboard host
//!
//! Restores the signed-in session and runs its dashboard until Ctrl+C.
//! Reads configuration from `$ENERGYFLOW_CONFIG` or
//! `~/.config/energyflow/config.toml`.

use tracing::{error, info};

use energyflow::config::{config_path_from_env, AppConfig, LoggingConfig};
use energyflow::host::{init_tracing, DashboardHost};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Load configuration ─────────────────────────────────────
    let config_path = config_path_from_env();
    let config = if config_path.exists() {
        match AppConfig::load(&config_path) {
            Ok(cfg) => {
                init_tracing(&cfg.logging);
                info!("Configuration loaded from {}", config_path.display());
                cfg
            }
            Err(e) => {
                init_tracing(&LoggingConfig::default());
                error!("Failed to load config: {}. Using defaults.", e);
                AppConfig::default()
            }
        }
    } else {
        init_tracing(&LoggingConfig::default());
        info!("No config at {}; using defaults", config_path.display());
        AppConfig::default()
    };

    info!("Starting EnergyFlow dashboard host...");

    let host = DashboardHost::start(config).await;
    if let Some(dashboard) = host.dashboard() {
        let identity = dashboard.identity();
        info!(
            "🖥️ {} for {} ({})",
            dashboard.kind().title(),
            identity.name,
            identity.email
        );
    }

    // Start listening for shutdown signals (SIGTERM, SIGINT)
    host.install_signal_handler();
    info!("🚀 Host started. Press Ctrl+C to shutdown gracefully.");

    host.wait().await;
    Ok(())
}
