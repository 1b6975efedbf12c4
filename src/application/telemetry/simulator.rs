//! Telemetry Simulator
//!
//! Random-walks a [`TelemetrySnapshot`] on a fixed-delay timer so dashboards
//! have a live-looking feed without any sensor input.
//!
//! Every [`TelemetrySimulator::start`] returns a [`SimulatorHandle`]; the
//! timer runs until the handle is stopped, dropped, or the shutdown signal
//! fires.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::TelemetryConfig;
use crate::domain::{Jitter, TelemetrySnapshot};
use crate::notifications::{Event, SharedEventBus, SimulatorStoppedEvent, TelemetryEvent};
use crate::shared::ShutdownSignal;

/// Builder for a running simulator
#[derive(Clone)]
pub struct TelemetrySimulator {
    dashboard_id: String,
    interval: Duration,
    jitter: Jitter,
    seed: Option<u64>,
    event_bus: Option<SharedEventBus>,
    shutdown: Option<ShutdownSignal>,
}

impl TelemetrySimulator {
    pub fn new(dashboard_id: impl Into<String>, interval: Duration) -> Self {
        Self {
            dashboard_id: dashboard_id.into(),
            // tokio intervals reject a zero period
            interval: interval.max(Duration::from_millis(1)),
            jitter: Jitter::default(),
            seed: None,
            event_bus: None,
            shutdown: None,
        }
    }

    pub fn from_config(dashboard_id: impl Into<String>, config: &TelemetryConfig) -> Self {
        Self::new(dashboard_id, config.interval()).with_jitter(config.jitter)
    }

    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    /// Fix the random sequence (tests, reproducible demos).
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_event_bus(mut self, event_bus: SharedEventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Begin ticking from `initial`. The first tick fires one interval
    /// after start.
    pub fn start(&self, initial: TelemetrySnapshot) -> SimulatorHandle {
        let (watch_tx, _) = watch::channel(initial.clone());
        let shared = Arc::new(Shared {
            snapshot: RwLock::new(initial),
            watch: watch_tx,
            stopped: AtomicBool::new(false),
            ticks: AtomicU64::new(0),
        });

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let task = tokio::spawn(run(
            shared.clone(),
            self.dashboard_id.clone(),
            self.interval,
            self.jitter,
            rng,
            self.event_bus.clone(),
            self.shutdown.clone(),
        ));

        metrics::gauge!("energyflow_simulators_active").increment(1.0);
        info!(
            "📈 [{}] Telemetry simulator started (interval: {}ms)",
            self.dashboard_id,
            self.interval.as_millis()
        );

        SimulatorHandle {
            dashboard_id: self.dashboard_id.clone(),
            shared,
            task: Some(task),
            event_bus: self.event_bus.clone(),
        }
    }
}

struct Shared {
    snapshot: RwLock<TelemetrySnapshot>,
    watch: watch::Sender<TelemetrySnapshot>,
    /// Checked under the snapshot lock before every mutation
    stopped: AtomicBool,
    ticks: AtomicU64,
}

async fn run(
    shared: Arc<Shared>,
    dashboard_id: String,
    period: Duration,
    jitter: Jitter,
    mut rng: StdRng,
    event_bus: Option<SharedEventBus>,
    shutdown: Option<ShutdownSignal>,
) {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown_wait = async move {
        match shutdown {
            Some(signal) => signal.wait().await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(shutdown_wait);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let mut snapshot = shared.snapshot.write().await;
                if shared.stopped.load(Ordering::SeqCst) {
                    break;
                }
                snapshot.perturb(&jitter, &mut rng, Utc::now());
                let tick = shared.ticks.fetch_add(1, Ordering::SeqCst) + 1;
                let current = snapshot.clone();
                shared.watch.send_replace(current.clone());
                debug!(
                    "[{}] tick {}: solar={:.1} wind={:.1} load={:.1} charge={:.1}%",
                    dashboard_id, tick, current.solar, current.wind, current.load, current.battery.charge
                );
                // Published under the lock so a concurrent stop() announces after this tick.
                if let Some(bus) = &event_bus {
                    bus.publish(Event::TelemetryUpdated(TelemetryEvent {
                        dashboard_id: dashboard_id.clone(),
                        tick,
                        snapshot: current,
                    }));
                }
                drop(snapshot);

                metrics::counter!("energyflow_telemetry_ticks_total").increment(1);
            }
            _ = &mut shutdown_wait => {
                info!("📈 [{}] Telemetry simulator shutting down", dashboard_id);
                shared.stopped.store(true, Ordering::SeqCst);
                break;
            }
        }
    }
}

/// Owning handle to a running simulator.
///
/// [`stop`](Self::stop) is the orderly way out; dropping the handle also
/// cancels the timer so an early return in the owning view cannot leak it.
pub struct SimulatorHandle {
    dashboard_id: String,
    shared: Arc<Shared>,
    task: Option<JoinHandle<()>>,
    event_bus: Option<SharedEventBus>,
}

impl SimulatorHandle {
    pub fn dashboard_id(&self) -> &str {
        &self.dashboard_id
    }

    /// Latest snapshot
    pub async fn snapshot(&self) -> TelemetrySnapshot {
        self.shared.snapshot.read().await.clone()
    }

    /// Receiver holding the latest snapshot, updated on every tick
    pub fn subscribe(&self) -> watch::Receiver<TelemetrySnapshot> {
        self.shared.watch.subscribe()
    }

    pub fn ticks(&self) -> u64 {
        self.shared.ticks.load(Ordering::SeqCst)
    }

    /// False once stopped or once the shutdown signal ended the timer.
    pub fn is_running(&self) -> bool {
        !self.shared.stopped.load(Ordering::SeqCst)
    }

    /// Cancel future ticks and return the number of ticks applied.
    ///
    /// When this returns, no further mutation of the snapshot can happen:
    /// the stop flag is raised, then the snapshot lock is taken once so any
    /// tick already holding it has finished, and every later tick sees the
    /// flag under the same lock.
    pub async fn stop(mut self) -> u64 {
        self.shared.stopped.store(true, Ordering::SeqCst);
        drop(self.shared.snapshot.write().await);

        if let Some(task) = self.task.take() {
            task.abort();
            metrics::gauge!("energyflow_simulators_active").decrement(1.0);
        }

        let ticks = self.ticks();
        info!("📈 [{}] Telemetry simulator stopped after {} ticks", self.dashboard_id, ticks);
        if let Some(bus) = &self.event_bus {
            bus.publish(Event::SimulatorStopped(SimulatorStoppedEvent {
                dashboard_id: self.dashboard_id.clone(),
                ticks,
                timestamp: Utc::now(),
            }));
        }
        ticks
    }
}

impl Drop for SimulatorHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            self.shared.stopped.store(true, Ordering::SeqCst);
            task.abort();
            metrics::gauge!("energyflow_simulators_active").decrement(1.0);
            debug!("[{}] Simulator handle dropped; timer cancelled", self.dashboard_id);
        }
    }
}
