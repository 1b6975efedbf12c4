//! Campus-level indicators for the government overview

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{BatteryState, TelemetrySnapshot};

/// System-wide key performance indicators
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpi {
    pub renewable_utilization: f64,
    pub grid_dependency: f64,
    pub carbon_savings: f64,
    pub cost_reduction: f64,
}

impl Kpi {
    pub fn seed() -> Self {
        Self {
            renewable_utilization: 78.5,
            grid_dependency: 21.5,
            carbon_savings: 2847.0,
            cost_reduction: 45.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campus {
    pub id: String,
    pub name: String,
    /// Percent of demand covered by renewables
    pub renewable_utilization: f64,
    /// Percent of demand drawn from the grid
    pub grid_dependency: f64,
    /// kg CO₂
    pub carbon_savings: f64,
    pub energy_data: TelemetrySnapshot,
}

impl Campus {
    /// The three campuses reported to the ministry.
    pub fn seed() -> Vec<Campus> {
        vec![
            Campus::new("1", "Main Campus", 85.2, 1250.0, reading(245.0, 85.0, (85.0, 92.0, 1247), 180.0, 0.0)),
            Campus::new("2", "North Campus", 72.8, 890.0, reading(180.0, 65.0, (72.0, 88.0, 980), 220.0, 45.0)),
            Campus::new("3", "South Campus", 67.3, 707.0, reading(165.0, 45.0, (68.0, 85.0, 1156), 195.0, 62.0)),
        ]
    }

    /// Grid dependency is the remainder of renewable utilization,
    /// rounded to one decimal.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        renewable_utilization: f64,
        carbon_savings: f64,
        energy_data: TelemetrySnapshot,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            renewable_utilization,
            grid_dependency: ((100.0 - renewable_utilization) * 10.0).round() / 10.0,
            carbon_savings,
            energy_data,
        }
    }
}

/// Dominant renewable source of a region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionMix {
    Solar,
    Wind,
    Mixed,
}

/// One marker on the admin energy map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub name: String,
    pub solar: f64,
    pub wind: f64,
    pub load: f64,
    pub points: u32,
}

impl Region {
    pub fn new(id: &str, name: &str, solar: f64, wind: f64, load: f64, points: u32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            solar,
            wind,
            load,
            points,
        }
    }

    pub fn seed() -> Vec<Region> {
        vec![
            Region::new("north", "North Campus", 120.0, 45.0, 90.0, 850),
            Region::new("main", "Main Campus", 245.0, 85.0, 180.0, 1250),
            Region::new("south", "South Campus", 180.0, 60.0, 140.0, 950),
        ]
    }

    pub fn mix(&self) -> RegionMix {
        if self.solar > self.wind {
            RegionMix::Solar
        } else if self.wind > self.solar {
            RegionMix::Wind
        } else {
            RegionMix::Mixed
        }
    }
}

fn reading(solar: f64, wind: f64, battery: (f64, f64, u32), load: f64, grid: f64) -> TelemetrySnapshot {
    let (charge, health, cycles) = battery;
    TelemetrySnapshot {
        solar,
        wind,
        battery: BatteryState { charge, health, cycles },
        load,
        grid,
        timestamp: Utc::now(),
    }
}
