//! Campus KPI export for the government overview

use std::io::Write;

use tracing::info;

use crate::domain::{Campus, DomainError, DomainResult};

pub const CSV_HEADER: [&str; 8] = [
    "Campus",
    "Renewable Utilization (%)",
    "Grid Dependency (%)",
    "Carbon Savings (kg CO₂)",
    "Solar (kWh)",
    "Wind (kWh)",
    "Battery Charge (%)",
    "Load (kWh)",
];

pub const DEFAULT_REPORT_FILE: &str = "energy-report.csv";

/// Write one row per campus, header first. Numbers keep their shortest
/// form (`1250`, `85.2`).
pub fn export_campus_csv<W: Write>(campuses: &[Campus], writer: W) -> DomainResult<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(CSV_HEADER).map_err(export_error)?;

    for campus in campuses {
        let data = &campus.energy_data;
        writer
            .write_record([
                campus.name.clone(),
                campus.renewable_utilization.to_string(),
                campus.grid_dependency.to_string(),
                campus.carbon_savings.to_string(),
                data.solar.to_string(),
                data.wind.to_string(),
                data.battery.charge.to_string(),
                data.load.to_string(),
            ])
            .map_err(export_error)?;
    }

    writer.flush().map_err(|e| DomainError::Export(e.to_string()))?;
    info!(rows = campuses.len(), "📄 Campus report exported");
    Ok(())
}

fn export_error(e: csv::Error) -> DomainError {
    DomainError::Export(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_campuses_export() {
        let mut out = Vec::new();
        export_campus_csv(&Campus::seed(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "Campus,Renewable Utilization (%),Grid Dependency (%),Carbon Savings (kg CO₂),Solar (kWh),Wind (kWh),Battery Charge (%),Load (kWh)"
        );
        assert_eq!(lines[1], "Main Campus,85.2,14.8,1250,245,85,85,180");
        assert_eq!(lines[3], "South Campus,67.3,32.7,707,165,45,68,195");
    }

    #[test]
    fn empty_table_still_has_header() {
        let mut out = Vec::new();
        export_campus_csv(&[], &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }

    #[test]
    fn names_with_commas_are_quoted() {
        let mut campus = Campus::seed().remove(0);
        campus.name = "Main, East Wing".to_string();
        let mut out = Vec::new();
        export_campus_csv(&[campus], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.lines().nth(1).unwrap().starts_with("\"Main, East Wing\","));
    }
}
