//! Zone energy-source priorities

use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{DomainError, DomainResult};

/// Campus building / usage category.
///
/// Occupancy only exists for hostels, so it lives on that variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Zone {
    ExamCenter,
    Classroom,
    Hostel {
        /// Occupancy percent in [0, 100]
        occupancy: u8,
    },
    Lab,
    Office,
}

impl Zone {
    pub fn label(&self) -> &'static str {
        match self {
            Zone::ExamCenter => "Exam Center",
            Zone::Classroom => "Classroom",
            Zone::Hostel { .. } => "Hostel",
            Zone::Lab => "Research Lab",
            Zone::Office => "Administrative Office",
        }
    }

    pub fn occupancy(&self) -> Option<u8> {
        match self {
            Zone::Hostel { occupancy } => Some(*occupancy),
            _ => None,
        }
    }
}

/// Preferred energy source mix for a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourcePreference {
    #[serde(rename = "grid")]
    Grid,
    #[serde(rename = "solar")]
    Solar,
    #[serde(rename = "wind")]
    Wind,
    #[serde(rename = "solar+wind")]
    SolarWind,
    #[serde(rename = "solar+wind+grid")]
    All,
}

impl SourcePreference {
    pub const ALL: [SourcePreference; 5] = [
        SourcePreference::Grid,
        SourcePreference::Solar,
        SourcePreference::Wind,
        SourcePreference::SolarWind,
        SourcePreference::All,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourcePreference::Grid => "grid",
            SourcePreference::Solar => "solar",
            SourcePreference::Wind => "wind",
            SourcePreference::SolarWind => "solar+wind",
            SourcePreference::All => "solar+wind+grid",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SourcePreference::Grid => "Grid Only",
            SourcePreference::Solar => "Solar Priority",
            SourcePreference::Wind => "Wind Priority",
            SourcePreference::SolarWind => "Solar + Wind",
            SourcePreference::All => "All Sources",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }
}

impl fmt::Display for SourcePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A zone's energy-source request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityRequest {
    pub id: String,
    #[serde(flatten)]
    pub zone: Zone,
    #[serde(rename = "priority")]
    pub preference: SourcePreference,
    pub active: bool,
}

impl PriorityRequest {
    pub fn new(id: impl Into<String>, zone: Zone, preference: SourcePreference, active: bool) -> Self {
        Self {
            id: id.into(),
            zone,
            preference,
            active,
        }
    }
}

/// Partial update of a [`PriorityRequest`]. `None` fields are left as they are.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PriorityUpdate {
    pub preference: Option<SourcePreference>,
    pub active: Option<bool>,
    #[validate(range(max = 100, message = "occupancy must be 0-100"))]
    pub occupancy: Option<u8>,
}

impl PriorityUpdate {
    pub fn preference(preference: SourcePreference) -> Self {
        Self {
            preference: Some(preference),
            ..Default::default()
        }
    }

    pub fn active(active: bool) -> Self {
        Self {
            active: Some(active),
            ..Default::default()
        }
    }

    pub fn occupancy(occupancy: u8) -> Self {
        Self {
            occupancy: Some(occupancy),
            ..Default::default()
        }
    }
}

/// In-memory list of zone requests owned by a dashboard.
#[derive(Debug, Clone, Default)]
pub struct PriorityBoard {
    requests: Vec<PriorityRequest>,
}

impl PriorityBoard {
    pub fn new(requests: Vec<PriorityRequest>) -> Self {
        Self { requests }
    }

    /// Starting list shown on the technician dashboard.
    pub fn technician_seed() -> Self {
        Self::new(vec![
            PriorityRequest::new("1", Zone::ExamCenter, SourcePreference::Grid, true),
            PriorityRequest::new("2", Zone::Classroom, SourcePreference::Solar, true),
            PriorityRequest::new("3", Zone::Hostel { occupancy: 85 }, SourcePreference::Grid, true),
            PriorityRequest::new("4", Zone::Lab, SourcePreference::SolarWind, true),
            PriorityRequest::new("5", Zone::Office, SourcePreference::Grid, false),
        ])
    }

    /// Starting list shown on the admin control panel.
    pub fn admin_seed() -> Self {
        Self::new(vec![
            PriorityRequest::new("1", Zone::ExamCenter, SourcePreference::Grid, true),
            PriorityRequest::new("2", Zone::Classroom, SourcePreference::Solar, true),
            PriorityRequest::new("3", Zone::Hostel { occupancy: 75 }, SourcePreference::Grid, false),
            PriorityRequest::new("4", Zone::Lab, SourcePreference::SolarWind, true),
            PriorityRequest::new("5", Zone::Office, SourcePreference::Grid, true),
        ])
    }

    pub fn requests(&self) -> &[PriorityRequest] {
        &self.requests
    }

    pub fn get(&self, id: &str) -> Option<&PriorityRequest> {
        self.requests.iter().find(|r| r.id == id)
    }

    pub fn active(&self) -> impl Iterator<Item = &PriorityRequest> {
        self.requests.iter().filter(|r| r.active)
    }

    /// Apply a partial update to the request with `id`.
    ///
    /// The update is validated as a whole before any field is written.
    pub fn update(&mut self, id: &str, update: PriorityUpdate) -> DomainResult<&PriorityRequest> {
        update
            .validate()
            .map_err(|e| DomainError::Validation(e.to_string()))?;

        let request = self
            .requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| DomainError::NotFound {
                entity: "PriorityRequest",
                field: "id",
                value: id.to_string(),
            })?;

        if let Some(occupancy) = update.occupancy {
            match &mut request.zone {
                Zone::Hostel { occupancy: current } => *current = occupancy,
                other => {
                    return Err(DomainError::Validation(format!(
                        "occupancy only applies to hostels, not {}",
                        other.label()
                    )))
                }
            }
        }
        if let Some(preference) = update.preference {
            request.preference = preference;
        }
        if let Some(active) = update.active {
            request.active = active;
        }

        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_preference_only_touches_that_field() {
        let mut board = PriorityBoard::admin_seed();
        let updated = board
            .update("2", PriorityUpdate::preference(SourcePreference::Wind))
            .unwrap();

        assert_eq!(updated.preference, SourcePreference::Wind);
        assert!(updated.active);
        assert_eq!(updated.zone, Zone::Classroom);
    }

    #[test]
    fn hostel_occupancy_can_change() {
        let mut board = PriorityBoard::admin_seed();
        board.update("3", PriorityUpdate::occupancy(40)).unwrap();
        assert_eq!(board.get("3").unwrap().zone.occupancy(), Some(40));
    }

    #[test]
    fn occupancy_on_non_hostel_is_rejected() {
        let mut board = PriorityBoard::admin_seed();
        let update = PriorityUpdate {
            preference: Some(SourcePreference::All),
            occupancy: Some(10),
            ..Default::default()
        };

        let err = board.update("4", update).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        // Nothing from the rejected update was applied.
        assert_eq!(board.get("4").unwrap().preference, SourcePreference::SolarWind);
    }

    #[test]
    fn occupancy_above_hundred_is_rejected() {
        let mut board = PriorityBoard::technician_seed();
        let err = board.update("3", PriorityUpdate::occupancy(120)).unwrap_err();
        let DomainError::Validation(message) = &err else {
            panic!("expected validation error, got {err}");
        };
        assert!(message.contains("occupancy must be 0-100"));
        assert_eq!(board.get("3").unwrap().zone.occupancy(), Some(85));
    }

    #[test]
    fn unknown_id_is_not_found() {
        let mut board = PriorityBoard::admin_seed();
        let err = board.update("99", PriorityUpdate::active(false)).unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[test]
    fn seeds_differ_per_view() {
        assert_eq!(PriorityBoard::technician_seed().active().count(), 4);
        assert_eq!(PriorityBoard::admin_seed().active().count(), 4);
        assert_eq!(PriorityBoard::admin_seed().get("3").unwrap().zone.occupancy(), Some(75));
        assert!(!PriorityBoard::technician_seed().get("5").unwrap().active);
    }

    #[test]
    fn hostel_serializes_with_occupancy_and_source_names() {
        let request = PriorityRequest::new("3", Zone::Hostel { occupancy: 85 }, SourcePreference::All, true);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["type"], "hostel");
        assert_eq!(json["occupancy"], 85);
        assert_eq!(json["priority"], "solar+wind+grid");

        let lab = PriorityRequest::new("4", Zone::Lab, SourcePreference::SolarWind, true);
        let json = serde_json::to_value(&lab).unwrap();
        assert!(json.get("occupancy").is_none());
    }

    #[test]
    fn preference_parses_from_wire_name() {
        assert_eq!(SourcePreference::parse("solar+wind"), Some(SourcePreference::SolarWind));
        assert_eq!(SourcePreference::parse("nuclear"), None);
    }
}
