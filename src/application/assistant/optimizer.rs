//! Load optimizer run for the admin console
//!
//! A run takes a fixed amount of time and then reports back through the
//! dashboard's alert feed. Only one run may be in progress.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::info;

use crate::domain::{Alert, AlertFeed, DomainError, DomainResult};
use crate::notifications::{AlertEvent, Event, SharedEventBus};

pub const OPTIMIZED_MESSAGE: &str = "ML model optimized load distribution";

pub struct LoadOptimizer {
    dashboard_id: String,
    duration: Duration,
    alerts: Arc<RwLock<AlertFeed>>,
    running: Arc<AtomicBool>,
    task: Mutex<Option<JoinHandle<()>>>,
    event_bus: Option<SharedEventBus>,
}

impl LoadOptimizer {
    pub fn new(dashboard_id: impl Into<String>, duration: Duration, alerts: Arc<RwLock<AlertFeed>>) -> Self {
        Self {
            dashboard_id: dashboard_id.into(),
            duration,
            alerts,
            running: Arc::new(AtomicBool::new(false)),
            task: Mutex::new(None),
            event_bus: None,
        }
    }

    pub fn with_event_bus(mut self, event_bus: SharedEventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Start a run. Fails with `InvalidState` while another is in progress.
    pub fn run(&self) -> DomainResult<()> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(DomainError::InvalidState(
                "load optimization already running".to_string(),
            ));
        }

        info!(dashboard_id = %self.dashboard_id, "🤖 Load optimization started");

        let running = self.running.clone();
        let alerts = self.alerts.clone();
        let duration = self.duration;
        let dashboard_id = self.dashboard_id.clone();
        let event_bus = self.event_bus.clone();

        let task = tokio::spawn(async move {
            tokio::time::sleep(duration).await;

            let alert = Alert::info(OPTIMIZED_MESSAGE);
            alerts.write().await.push(alert.clone());
            running.store(false, Ordering::SeqCst);
            info!(dashboard_id = %dashboard_id, "🤖 Load optimization finished");

            if let Some(bus) = event_bus {
                bus.publish(Event::AlertRaised(AlertEvent { dashboard_id, alert }));
            }
        });

        if let Ok(mut slot) = self.task.lock() {
            *slot = Some(task);
        }
        Ok(())
    }

    /// Abort a run in progress; no alert is raised for it.
    pub fn cancel(&self) {
        if let Ok(mut slot) = self.task.lock() {
            if let Some(task) = slot.take() {
                task.abort();
            }
        }
        self.running.store(false, Ordering::SeqCst);
    }
}

impl Drop for LoadOptimizer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn optimizer() -> (LoadOptimizer, Arc<RwLock<AlertFeed>>) {
        let alerts = Arc::new(RwLock::new(AlertFeed::default()));
        (LoadOptimizer::new("dash", Duration::from_secs(10), alerts.clone()), alerts)
    }

    #[tokio::test(start_paused = true)]
    async fn run_raises_alert_when_done() {
        let (optimizer, alerts) = optimizer();
        optimizer.run().unwrap();
        assert!(optimizer.is_running());

        tokio::time::sleep(Duration::from_secs(9)).await;
        assert!(alerts.read().await.alerts().is_empty());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!optimizer.is_running());
        let feed = alerts.read().await;
        assert_eq!(feed.alerts().len(), 1);
        assert_eq!(feed.alerts()[0].message, OPTIMIZED_MESSAGE);
        assert_eq!(feed.unread_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn second_run_is_rejected() {
        let (optimizer, _) = optimizer();
        optimizer.run().unwrap();
        assert!(matches!(optimizer.run(), Err(DomainError::InvalidState(_))));

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(optimizer.run().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_suppresses_alert() {
        let (optimizer, alerts) = optimizer();
        optimizer.run().unwrap();
        tokio::time::sleep(Duration::from_secs(3)).await;
        optimizer.cancel();

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(!optimizer.is_running());
        assert!(alerts.read().await.alerts().is_empty());
    }
}
