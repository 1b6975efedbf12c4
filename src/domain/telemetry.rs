//! Energy telemetry snapshot

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Battery bank state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryState {
    /// State of charge, percent in [0, 100]
    pub charge: f64,
    /// State of health, percent
    pub health: f64,
    pub cycles: u32,
}

/// One point-in-time reading of the campus energy system.
///
/// All energy figures are in kWh. `grid == 0.0` means the grid
/// connection is on standby.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub solar: f64,
    pub wind: f64,
    pub battery: BatteryState,
    pub load: f64,
    pub grid: f64,
    pub timestamp: DateTime<Utc>,
}

impl TelemetrySnapshot {
    /// Reading every dashboard starts from.
    pub fn seed() -> Self {
        Self {
            solar: 245.0,
            wind: 85.0,
            battery: BatteryState {
                charge: 85.0,
                health: 92.0,
                cycles: 1247,
            },
            load: 180.0,
            grid: 0.0,
            timestamp: Utc::now(),
        }
    }

    pub fn is_grid_standby(&self) -> bool {
        self.grid <= 0.0
    }

    /// Renewable output of this reading (solar + wind).
    pub fn renewable(&self) -> f64 {
        self.solar + self.wind
    }

    /// Apply one random-walk step.
    ///
    /// Solar, wind and load move by `uniform(-δ/2, δ/2)` and are floored at 0;
    /// battery charge moves the same way and is clamped to [0, 100].
    /// Battery health, cycle count and grid draw are left untouched.
    pub fn perturb<R: Rng + ?Sized>(&mut self, jitter: &Jitter, rng: &mut R, at: DateTime<Utc>) {
        self.solar = (self.solar + sample(rng, jitter.solar)).max(0.0);
        self.wind = (self.wind + sample(rng, jitter.wind)).max(0.0);
        self.battery.charge = (self.battery.charge + sample(rng, jitter.charge)).clamp(0.0, 100.0);
        self.load = (self.load + sample(rng, jitter.load)).max(0.0);
        self.timestamp = at;
    }
}

/// Full-range magnitudes (δ) of the per-tick random walk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Jitter {
    pub solar: f64,
    pub wind: f64,
    pub load: f64,
    pub charge: f64,
}

impl Default for Jitter {
    fn default() -> Self {
        Self {
            solar: 20.0,
            wind: 10.0,
            load: 15.0,
            charge: 2.0,
        }
    }
}

fn sample<R: Rng + ?Sized>(rng: &mut R, delta: f64) -> f64 {
    let half = delta.abs() / 2.0;
    if !half.is_finite() || half == 0.0 {
        return 0.0;
    }
    rng.gen_range(-half..=half)
}
