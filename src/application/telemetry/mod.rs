//! Simulated live telemetry feed

pub mod simulator;

pub use simulator::{SimulatorHandle, TelemetrySimulator};
