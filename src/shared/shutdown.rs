//! Process-wide stop flag.
//!
//! One [`ShutdownSignal`] is handed to every background job the dashboard
//! host starts: telemetry simulators, pending assistant replies and optimizer
//! runs. Tripping it once stops all of them.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};

/// Cloneable stop flag backed by a `watch` channel holding `true` once tripped.
#[derive(Clone, Debug)]
pub struct ShutdownSignal {
    flag: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (flag, _) = watch::channel(false);
        Self { flag: Arc::new(flag) }
    }

    pub fn is_triggered(&self) -> bool {
        *self.flag.borrow()
    }

    /// Trip the flag. Later calls are no-ops.
    pub fn trigger(&self) {
        let was_set = self.flag.send_replace(true);
        if !was_set {
            info!("🛑 Stop requested, winding down dashboard tasks");
        }
    }

    pub async fn wait(&self) {
        self.notified().wait().await
    }

    /// Take a receiver now and await it later; a trip in between is still seen.
    pub fn notified(&self) -> ShutdownNotified {
        ShutdownNotified {
            flag: self.flag.subscribe(),
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ShutdownNotified {
    flag: watch::Receiver<bool>,
}

impl ShutdownNotified {
    pub async fn wait(mut self) {
        // The sender lives inside every signal clone, so Err only means
        // the last clone is gone and nothing can trip it anymore.
        if self.flag.wait_for(|tripped| *tripped).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Trip `shutdown` on SIGINT or SIGTERM (Ctrl+C elsewhere).
pub async fn listen_for_shutdown_signals(shutdown: ShutdownSignal) {
    match os_stop_request().await {
        Ok(name) => {
            info!("📡 {} received", name);
            shutdown.trigger();
        }
        Err(e) => error!("Could not listen for OS signals: {}", e),
    }
}

#[cfg(unix)]
async fn os_stop_request() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let name = tokio::select! {
        _ = interrupt.recv() => "SIGINT",
        _ = terminate.recv() => "SIGTERM",
    };
    Ok(name)
}

#[cfg(not(unix))]
async fn os_stop_request() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("Ctrl+C")
}

/// Owns the host's stop flag and bounds how long teardown may take.
pub struct ShutdownCoordinator {
    signal: ShutdownSignal,
    grace: Duration,
}

impl ShutdownCoordinator {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            signal: ShutdownSignal::new(),
            grace: Duration::from_secs(timeout_secs),
        }
    }

    pub fn signal(&self) -> ShutdownSignal {
        self.signal.clone()
    }

    pub fn start_signal_listener(&self) {
        tokio::spawn(listen_for_shutdown_signals(self.signal()));
    }

    /// Block until the flag trips, then give `cleanup` the grace period.
    /// `false` means teardown was cut short.
    pub async fn shutdown_with_cleanup<F, Fut>(&self, cleanup: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ()>,
    {
        self.signal.wait().await;
        info!(grace_secs = self.grace.as_secs(), "⏳ Unmounting dashboards");

        let finished = tokio::time::timeout(self.grace, cleanup()).await.is_ok();
        if finished {
            info!("✅ Dashboards unmounted");
        } else {
            warn!(grace_secs = self.grace.as_secs(), "⚠️ Teardown cut short");
        }
        finished
    }
}
