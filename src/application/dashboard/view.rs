//! Role-gated dashboard
//!
//! A [`Dashboard`] is what a signed-in identity sees. Mounting one for a
//! technician or admin starts a telemetry simulator owned by the dashboard;
//! the government overview is a static campus table. [`Dashboard::unmount`]
//! stops every timer the dashboard started.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{watch, RwLock};
use tracing::{info, warn};

use crate::application::assistant::{Assistant, ChatMessage, LoadOptimizer};
use crate::application::session::SessionStore;
use crate::application::telemetry::{SimulatorHandle, TelemetrySimulator};
use crate::config::AppConfig;
use crate::domain::{
    Alert, AlertFeed, Campus, DomainError, DomainResult, Identity, Kpi, Leaderboard,
    PriorityBoard, PriorityRequest, PriorityUpdate, Region, Role, Settings, SettingsUpdate,
    TelemetrySnapshot, UserPoints,
};
use crate::notifications::{Event, PriorityEvent, SettingsEvent, SharedEventBus};
use crate::shared::ShutdownSignal;

/// Campus shown on a technician's leaderboard row when the profile has none
const FALLBACK_CAMPUS: &str = "Main Campus";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DashboardKind {
    Technician,
    Admin,
    Government,
}

impl From<Role> for DashboardKind {
    fn from(role: Role) -> Self {
        match role {
            Role::Technician => DashboardKind::Technician,
            Role::Admin => DashboardKind::Admin,
            Role::Government => DashboardKind::Government,
        }
    }
}

impl DashboardKind {
    pub fn title(&self) -> &'static str {
        match self {
            DashboardKind::Technician => "Campus Energy Monitor",
            DashboardKind::Admin => "Admin Energy Control Panel",
            DashboardKind::Government => "Government Analytics Dashboard",
        }
    }
}

/// Source the admin console routes campus output through
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputSource {
    #[default]
    Solar,
    Wind,
    Grid,
    Battery,
}

/// Panels shared by the technician and admin views
struct Operations {
    simulator: SimulatorHandle,
    alerts: Arc<RwLock<AlertFeed>>,
    priorities: PriorityBoard,
    leaderboard: Leaderboard,
    assistant: Assistant,
}

impl Operations {
    async fn close(self) -> u64 {
        self.assistant.close();
        self.simulator.stop().await
    }
}

enum View {
    Technician(Operations),
    Admin {
        ops: Operations,
        optimizer: LoadOptimizer,
        regions: Vec<Region>,
        output: OutputSource,
    },
    Government {
        kpis: Kpi,
        campuses: Vec<Campus>,
    },
}

pub struct Dashboard {
    id: String,
    identity: Identity,
    event_bus: SharedEventBus,
    settings: Settings,
    view: View,
}

impl Dashboard {
    /// Mount the view matching `identity.role`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(
        identity: &Identity,
        config: &AppConfig,
        event_bus: SharedEventBus,
        shutdown: ShutdownSignal,
    ) -> Self {
        let id = uuid::Uuid::new_v4().to_string();
        let kind = DashboardKind::from(identity.role);

        let view = match kind {
            DashboardKind::Technician => View::Technician(Self::operations(
                &id,
                identity,
                config,
                &event_bus,
                &shutdown,
                AlertFeed::technician_seed(),
                PriorityBoard::technician_seed(),
                Leaderboard::technician_seed(
                    &identity.id,
                    &identity.name,
                    identity.campus.as_deref().unwrap_or(FALLBACK_CAMPUS),
                ),
            )),
            DashboardKind::Admin => {
                let ops = Self::operations(
                    &id,
                    identity,
                    config,
                    &event_bus,
                    &shutdown,
                    AlertFeed::admin_seed(),
                    PriorityBoard::admin_seed(),
                    Leaderboard::admin_seed(&identity.id, &identity.name),
                );
                let optimizer = LoadOptimizer::new(&id, config.assistant.ml_run(), ops.alerts.clone())
                    .with_event_bus(event_bus.clone());
                View::Admin {
                    ops,
                    optimizer,
                    regions: Region::seed(),
                    output: OutputSource::default(),
                }
            }
            DashboardKind::Government => View::Government {
                kpis: Kpi::seed(),
                campuses: Campus::seed(),
            },
        };

        info!(dashboard_id = %id, kind = ?kind, user = %identity.email, "🖥️ Dashboard mounted");
        Self {
            id,
            identity: identity.clone(),
            event_bus,
            settings: Settings::for_identity(identity),
            view,
        }
    }

    /// Mount the dashboard for whoever is signed in, or `None` while the
    /// session is loading or anonymous (the login screen is shown instead).
    pub async fn for_session(
        store: &SessionStore,
        config: &AppConfig,
        event_bus: SharedEventBus,
        shutdown: ShutdownSignal,
    ) -> Option<Self> {
        let identity = store.current_identity().await?;
        Some(Self::mount(&identity, config, event_bus, shutdown))
    }

    #[allow(clippy::too_many_arguments)]
    fn operations(
        id: &str,
        identity: &Identity,
        config: &AppConfig,
        event_bus: &SharedEventBus,
        shutdown: &ShutdownSignal,
        alerts: AlertFeed,
        priorities: PriorityBoard,
        leaderboard: Leaderboard,
    ) -> Operations {
        let simulator = TelemetrySimulator::from_config(id, &config.telemetry)
            .with_event_bus(event_bus.clone())
            .with_shutdown(shutdown.clone())
            .start(TelemetrySnapshot::seed());
        let assistant = Assistant::from_config(id, &config.assistant).with_event_bus(event_bus.clone());

        info!(dashboard_id = %id, user_id = %identity.id, "Operations panels ready");
        Operations {
            simulator,
            alerts: Arc::new(RwLock::new(alerts)),
            priorities,
            leaderboard,
            assistant,
        }
    }

    /// Stop the simulator and cancel pending assistant and optimizer work.
    ///
    /// Returns the number of telemetry ticks applied while mounted.
    pub async fn unmount(self) -> u64 {
        let ticks = match self.view {
            View::Technician(ops) => ops.close().await,
            View::Admin { ops, optimizer, .. } => {
                optimizer.cancel();
                ops.close().await
            }
            View::Government { .. } => 0,
        };
        info!(dashboard_id = %self.id, ticks, "🖥️ Dashboard unmounted");
        ticks
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> DashboardKind {
        match &self.view {
            View::Technician(_) => DashboardKind::Technician,
            View::Admin { .. } => DashboardKind::Admin,
            View::Government { .. } => DashboardKind::Government,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    fn ops(&self) -> Option<&Operations> {
        match &self.view {
            View::Technician(ops) | View::Admin { ops, .. } => Some(ops),
            View::Government { .. } => None,
        }
    }

    fn ops_mut(&mut self) -> Option<&mut Operations> {
        match &mut self.view {
            View::Technician(ops) | View::Admin { ops, .. } => Some(ops),
            View::Government { .. } => None,
        }
    }

    fn forbidden(&self, action: &str) -> DomainError {
        warn!(dashboard_id = %self.id, role = %self.identity.role, action, "Action not available");
        DomainError::Forbidden(format!("{} cannot {}", self.identity.role, action))
    }

    // ---- telemetry ----

    /// Latest simulated reading; `None` on the government overview.
    pub async fn telemetry(&self) -> Option<TelemetrySnapshot> {
        match self.ops() {
            Some(ops) => Some(ops.simulator.snapshot().await),
            None => None,
        }
    }

    pub fn subscribe_telemetry(&self) -> Option<watch::Receiver<TelemetrySnapshot>> {
        self.ops().map(|ops| ops.simulator.subscribe())
    }

    pub fn telemetry_ticks(&self) -> u64 {
        self.ops().map(|ops| ops.simulator.ticks()).unwrap_or(0)
    }

    // ---- alerts ----

    pub async fn alerts(&self) -> Vec<Alert> {
        match self.ops() {
            Some(ops) => ops.alerts.read().await.alerts().to_vec(),
            None => Vec::new(),
        }
    }

    pub async fn unread_alerts(&self) -> usize {
        match self.ops() {
            Some(ops) => ops.alerts.read().await.unread_count(),
            None => 0,
        }
    }

    pub async fn mark_alert_read(&self, alert_id: &str) -> DomainResult<()> {
        let ops = self.ops().ok_or_else(|| self.forbidden("view alerts"))?;
        if ops.alerts.write().await.mark_read(alert_id) {
            Ok(())
        } else {
            Err(DomainError::NotFound {
                entity: "Alert",
                field: "id",
                value: alert_id.to_string(),
            })
        }
    }

    pub async fn mark_all_alerts_read(&self) {
        if let Some(ops) = self.ops() {
            ops.alerts.write().await.mark_all_read();
        }
    }

    // ---- priorities ----

    pub fn priorities(&self) -> &[PriorityRequest] {
        self.ops().map(|ops| ops.priorities.requests()).unwrap_or(&[])
    }

    /// Edit a zone request. Only the admin console may do this.
    pub fn update_priority(&mut self, request_id: &str, update: PriorityUpdate) -> DomainResult<PriorityRequest> {
        if !self.identity.role.can_manage_priorities() {
            return Err(self.forbidden("edit priorities"));
        }
        let View::Admin { ops, .. } = &mut self.view else {
            return Err(self.forbidden("edit priorities"));
        };

        let request = ops.priorities.update(request_id, update)?.clone();
        info!(
            dashboard_id = %self.id,
            request_id,
            zone = request.zone.label(),
            preference = %request.preference,
            active = request.active,
            "Priority updated"
        );
        self.event_bus.publish(Event::PriorityUpdated(PriorityEvent {
            dashboard_id: self.id.clone(),
            updated_by: self.identity.email.clone(),
            request: request.clone(),
        }));
        Ok(request)
    }

    // ---- points ----

    pub fn leaderboard(&self) -> &[UserPoints] {
        self.ops().map(|ops| ops.leaderboard.entries()).unwrap_or(&[])
    }

    /// Credit renewable kWh to the signed-in user and re-rank the board.
    ///
    /// Returns the points earned by this usage.
    pub fn record_renewable_usage(&mut self, kwh: f64) -> DomainResult<u32> {
        let user_id = self.identity.id.clone();
        let Some(ops) = self.ops_mut() else {
            return Err(self.forbidden("earn points"));
        };
        let earned = ops
            .leaderboard
            .record_usage(&user_id, kwh)
            .ok_or_else(|| DomainError::NotFound {
                entity: "UserPoints",
                field: "user_id",
                value: user_id.clone(),
            })?;
        if earned > 0 {
            info!(dashboard_id = %self.id, user_id = %user_id, earned, "Points earned");
        }
        Ok(earned)
    }

    // ---- settings ----

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Validate and save a settings change for the signed-in user.
    pub fn update_settings(&mut self, update: SettingsUpdate) -> DomainResult<&Settings> {
        self.settings.apply(update)?;
        info!(dashboard_id = %self.id, user_id = %self.identity.id, "Settings saved");
        self.event_bus.publish(Event::SettingsSaved(SettingsEvent {
            dashboard_id: self.id.clone(),
            user_id: self.identity.id.clone(),
            settings: self.settings.clone(),
        }));
        Ok(&self.settings)
    }

    // ---- assistant ----

    /// Send a chat message; `Ok(false)` when the text is blank.
    pub async fn ask(&self, text: &str) -> DomainResult<bool> {
        let ops = self.ops().ok_or_else(|| self.forbidden("use the assistant"))?;
        Ok(ops.assistant.send(text).await)
    }

    pub async fn transcript(&self) -> Vec<ChatMessage> {
        match self.ops() {
            Some(ops) => ops.assistant.transcript().await,
            None => Vec::new(),
        }
    }

    // ---- admin console ----

    pub fn run_optimizer(&self) -> DomainResult<()> {
        match &self.view {
            View::Admin { optimizer, .. } => optimizer.run(),
            _ => Err(self.forbidden("run load optimization")),
        }
    }

    pub fn optimizer_running(&self) -> bool {
        matches!(&self.view, View::Admin { optimizer, .. } if optimizer.is_running())
    }

    pub fn regions(&self) -> &[Region] {
        match &self.view {
            View::Admin { regions, .. } => regions,
            _ => &[],
        }
    }

    pub fn output_source(&self) -> Option<OutputSource> {
        match &self.view {
            View::Admin { output, .. } => Some(*output),
            _ => None,
        }
    }

    pub fn switch_output(&mut self, source: OutputSource) -> DomainResult<()> {
        let View::Admin { output, .. } = &mut self.view else {
            return Err(self.forbidden("switch output source"));
        };
        *output = source;
        info!(dashboard_id = %self.id, source = ?source, "Output source switched");
        Ok(())
    }

    // ---- government overview ----

    pub fn kpis(&self) -> Option<Kpi> {
        match &self.view {
            View::Government { kpis, .. } => Some(*kpis),
            _ => None,
        }
    }

    pub fn campuses(&self) -> &[Campus] {
        match &self.view {
            View::Government { campuses, .. } => campuses,
            _ => &[],
        }
    }
}
