//! Dashboard host runtime.
//!
//! [`DashboardHost`] wires the pieces together for a long-running process:
//! session storage, the session store, the event bus, the dashboard for
//! whoever is signed in, and graceful shutdown.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::application::{Dashboard, SessionStore};
use crate::config::{AppConfig, LoggingConfig, SessionConfig, StorageBackend};
use crate::infrastructure::{FileSessionStorage, InMemorySessionStorage, SessionStorage};
use crate::notifications::{create_event_bus, Event, SharedEventBus};
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};

/// Seconds allowed for unmounting before shutdown gives up
const SHUTDOWN_TIMEOUT_SECS: u64 = 10;

pub struct DashboardHost {
    pub event_bus: SharedEventBus,
    pub session: Arc<SessionStore>,
    pub config: AppConfig,
    dashboard: Option<Dashboard>,
    shutdown: ShutdownCoordinator,
    feed_task: JoinHandle<()>,
}

impl DashboardHost {
    /// Restore the persisted session and mount its dashboard.
    ///
    /// With nobody signed in the host stays up with no dashboard; sign in
    /// with `energyflowctl login` and restart it.
    pub async fn start(config: AppConfig) -> Self {
        let event_bus = create_event_bus();
        info!("🔔 Event bus initialized");

        let storage = build_storage(&config.session);
        let session = Arc::new(
            SessionStore::from_config(storage, &config.session).with_event_bus(event_bus.clone()),
        );

        let shutdown = ShutdownCoordinator::new(SHUTDOWN_TIMEOUT_SECS);
        let feed_task = tokio::spawn(log_feed(event_bus.clone(), shutdown.signal()));

        let dashboard = match session.initialize().await {
            Some(identity) => Some(Dashboard::mount(
                &identity,
                &config,
                event_bus.clone(),
                shutdown.signal(),
            )),
            None => {
                warn!("No one is signed in; run `energyflowctl login --email <address>` first");
                None
            }
        };

        Self {
            event_bus,
            session,
            config,
            dashboard,
            shutdown,
            feed_task,
        }
    }

    pub fn dashboard(&self) -> Option<&Dashboard> {
        self.dashboard.as_ref()
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install OS signal listeners (SIGTERM, SIGINT) that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for the shutdown signal, then unmount the dashboard.
    pub async fn wait(self) {
        let Self {
            dashboard,
            shutdown,
            feed_task,
            ..
        } = self;

        shutdown
            .shutdown_with_cleanup(|| async move {
                if let Some(dashboard) = dashboard {
                    dashboard.unmount().await;
                }
            })
            .await;

        feed_task.abort();
        info!("👋 EnergyFlow host shutdown complete");
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        info!("🛑 Shutting down dashboard host...");
        self.trigger_shutdown();
        self.wait().await;
    }
}

/// Storage backend selected by `[session] storage`.
pub fn build_storage(config: &SessionConfig) -> Arc<dyn SessionStorage> {
    match config.storage {
        StorageBackend::Memory => Arc::new(InMemorySessionStorage::new()),
        StorageBackend::File => {
            let dir = config.resolved_storage_dir();
            debug!("Session storage directory: {}", dir.display());
            Arc::new(FileSessionStorage::new(dir))
        }
    }
}

/// Log dashboard events until shutdown.
async fn log_feed(event_bus: SharedEventBus, shutdown: ShutdownSignal) {
    let mut subscriber = event_bus.subscribe();
    let stop = shutdown.notified().wait();
    tokio::pin!(stop);

    loop {
        tokio::select! {
            msg = subscriber.recv() => {
                let Some(msg) = msg else { break };
                match &msg.event {
                    Event::TelemetryUpdated(e) => info!(
                        tick = e.tick,
                        solar = e.snapshot.solar,
                        wind = e.snapshot.wind,
                        load = e.snapshot.load,
                        battery = e.snapshot.battery.charge,
                        grid_standby = e.snapshot.is_grid_standby(),
                        "⚡ Telemetry"
                    ),
                    Event::AlertRaised(e) => info!(level = ?e.alert.level, "🔔 {}", e.alert.message),
                    other => debug!(event = other.event_type(), "Dashboard event"),
                }
            }
            _ = &mut stop => break,
        }
    }
}

pub fn init_tracing(config: &LoggingConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));

    if config.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::domain::Role;

    fn memory_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.session.storage = StorageBackend::Memory;
        config.session.login_latency_ms = 0;
        config
    }

    #[tokio::test(start_paused = true)]
    async fn anonymous_host_has_no_dashboard() {
        let host = DashboardHost::start(memory_config()).await;
        assert!(host.dashboard().is_none());
        assert!(!host.session.is_loading().await);
        host.shutdown().await;
    }

    #[tokio::test]
    async fn file_session_mounts_matching_dashboard() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = memory_config();
        config.session.storage = StorageBackend::File;
        config.session.storage_dir = Some(dir.path().to_path_buf());

        let store = SessionStore::from_config(build_storage(&config.session), &config.session);
        store.initialize().await;
        store.login("ops-admin@campus.edu", "pw").await.unwrap();

        let host = DashboardHost::start(config).await;
        let dashboard = host.dashboard().unwrap();
        assert_eq!(dashboard.identity().role, Role::Admin);
        assert!(dashboard.telemetry().await.is_some());

        tokio::time::timeout(Duration::from_secs(5), host.shutdown())
            .await
            .unwrap();
    }
}
