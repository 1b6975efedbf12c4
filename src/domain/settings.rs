//! Per-user settings and profile

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidateEmail};

use super::{DomainError, DomainResult, Identity};

pub const DEFAULT_PHONE: &str = "+1 (555) 123-4567";
pub const DEFAULT_REPORT_RECIPIENTS: [&str; 2] = ["admin@campus.edu", "facility@campus.edu"];

pub const ALERT_THRESHOLD_MIN: u8 = 70;
pub const ALERT_THRESHOLD_MAX: u8 = 95;
pub const BATTERY_RESERVE_MIN: u8 = 10;
pub const BATTERY_RESERVE_MAX: u8 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub email: String,
    pub campus: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertSettings {
    pub battery_alerts: bool,
    pub system_alerts: bool,
    pub maintenance_alerts: bool,
    pub email_notifications: bool,
    pub push_notifications: bool,
    /// Percent, in [ALERT_THRESHOLD_MIN, ALERT_THRESHOLD_MAX]
    pub alert_threshold: u8,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            battery_alerts: true,
            system_alerts: true,
            maintenance_alerts: true,
            email_notifications: true,
            push_notifications: true,
            alert_threshold: 85,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadPreferences {
    pub priority_labs: bool,
    pub priority_hostels: bool,
    pub priority_offices: bool,
    pub auto_optimization: bool,
    /// Percent of battery held back, in [BATTERY_RESERVE_MIN, BATTERY_RESERVE_MAX]
    pub battery_reserve: u8,
}

impl Default for LoadPreferences {
    fn default() -> Self {
        Self {
            priority_labs: true,
            priority_hostels: true,
            priority_offices: false,
            auto_optimization: true,
            battery_reserve: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFrequency {
    Daily,
    #[default]
    Weekly,
    Monthly,
}

impl fmt::Display for ReportFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        })
    }
}

impl FromStr for ReportFrequency {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(DomainError::Validation(format!(
                "report frequency must be daily, weekly or monthly, got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSettings {
    pub auto_email: bool,
    pub frequency: ReportFrequency,
    pub recipients: Vec<String>,
    pub include_graphs: bool,
    pub include_alerts: bool,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            auto_email: true,
            frequency: ReportFrequency::Weekly,
            recipients: DEFAULT_REPORT_RECIPIENTS.iter().map(|r| r.to_string()).collect(),
            include_graphs: true,
            include_alerts: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub profile: Profile,
    pub alerts: AlertSettings,
    pub load: LoadPreferences,
    pub reports: ReportSettings,
}

impl Settings {
    /// Defaults for a freshly signed-in identity.
    pub fn for_identity(identity: &Identity) -> Self {
        Self {
            profile: Profile {
                name: identity.name.clone(),
                email: identity.email.clone(),
                campus: identity.campus.clone().unwrap_or_default(),
                phone: DEFAULT_PHONE.to_string(),
            },
            alerts: AlertSettings::default(),
            load: LoadPreferences::default(),
            reports: ReportSettings::default(),
        }
    }

    /// Apply a partial update. Nothing is written unless the whole update is valid.
    pub fn apply(&mut self, update: SettingsUpdate) -> DomainResult<()> {
        update
            .validate()
            .map_err(|e| DomainError::Validation(e.to_string()))?;
        let recipients = update.recipients.as_deref().map(parse_recipients).transpose()?;

        let SettingsUpdate {
            name,
            email,
            campus,
            phone,
            battery_alerts,
            system_alerts,
            maintenance_alerts,
            email_notifications,
            push_notifications,
            alert_threshold,
            priority_labs,
            priority_hostels,
            priority_offices,
            auto_optimization,
            battery_reserve,
            auto_email,
            frequency,
            include_graphs,
            include_alerts,
            ..
        } = update;

        set(&mut self.profile.name, name.map(|n| n.trim().to_string()));
        set(&mut self.profile.email, email.map(|e| e.trim().to_string()));
        set(&mut self.profile.campus, campus);
        set(&mut self.profile.phone, phone);

        set(&mut self.alerts.battery_alerts, battery_alerts);
        set(&mut self.alerts.system_alerts, system_alerts);
        set(&mut self.alerts.maintenance_alerts, maintenance_alerts);
        set(&mut self.alerts.email_notifications, email_notifications);
        set(&mut self.alerts.push_notifications, push_notifications);
        set(&mut self.alerts.alert_threshold, alert_threshold);

        set(&mut self.load.priority_labs, priority_labs);
        set(&mut self.load.priority_hostels, priority_hostels);
        set(&mut self.load.priority_offices, priority_offices);
        set(&mut self.load.auto_optimization, auto_optimization);
        set(&mut self.load.battery_reserve, battery_reserve);

        set(&mut self.reports.auto_email, auto_email);
        set(&mut self.reports.frequency, frequency);
        set(&mut self.reports.recipients, recipients);
        set(&mut self.reports.include_graphs, include_graphs);
        set(&mut self.reports.include_alerts, include_alerts);
        Ok(())
    }
}

fn set<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

/// Split a comma-separated recipient list and check every address.
pub fn parse_recipients(raw: &str) -> DomainResult<Vec<String>> {
    let recipients: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(String::from)
        .collect();
    if let Some(bad) = recipients.iter().find(|r| !r.validate_email()) {
        return Err(DomainError::Validation(format!("invalid report recipient '{}'", bad)));
    }
    Ok(recipients)
}

/// Partial settings change. `None` fields are left as they are.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: Option<String>,
    #[validate(email(message = "invalid email format"))]
    pub email: Option<String>,
    pub campus: Option<String>,
    pub phone: Option<String>,

    pub battery_alerts: Option<bool>,
    pub system_alerts: Option<bool>,
    pub maintenance_alerts: Option<bool>,
    pub email_notifications: Option<bool>,
    pub push_notifications: Option<bool>,
    #[validate(range(min = 70, max = 95, message = "alert threshold must be 70-95"))]
    pub alert_threshold: Option<u8>,

    pub priority_labs: Option<bool>,
    pub priority_hostels: Option<bool>,
    pub priority_offices: Option<bool>,
    pub auto_optimization: Option<bool>,
    #[validate(range(min = 10, max = 50, message = "battery reserve must be 10-50"))]
    pub battery_reserve: Option<u8>,

    pub auto_email: Option<bool>,
    pub frequency: Option<ReportFrequency>,
    /// Comma-separated addresses
    pub recipients: Option<String>,
    pub include_graphs: Option<bool>,
    pub include_alerts: Option<bool>,
}
