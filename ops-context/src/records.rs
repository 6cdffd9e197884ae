//! Typed entity records read from the operational sources.
//!
//! Each record is built from a loosely-typed store document via `from_document`,
//! which never fails: unusable fields fall back to `None` or an empty value.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::Document;

/// Label rendered for a session whose theatre is unknown.
pub const UNKNOWN_THEATRE: &str = "TBA";
/// Role assigned to staff records that carry none.
pub const UNASSIGNED_ROLE: &str = "Unassigned";
/// Backlog status counted towards the waiting list.
pub const WAITING_STATUS: &str = "waiting";
/// Session status counted towards the cancellation rate.
pub const CANCELLED_STATUS: &str = "cancelled";

/// Theatre session types with their planned duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionType {
    #[default]
    Am,
    Pm,
    Eve,
    Full,
    Pme,
    Extended,
    Night,
    #[serde(other)]
    Other,
}

impl SessionType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "AM" => SessionType::Am,
            "PM" => SessionType::Pm,
            "EVE" => SessionType::Eve,
            "FULL" => SessionType::Full,
            "PME" => SessionType::Pme,
            "EXTENDED" => SessionType::Extended,
            "NIGHT" => SessionType::Night,
            _ => SessionType::Other,
        }
    }

    /// Planned session length in minutes.
    pub fn duration_minutes(self) -> u32 {
        match self {
            SessionType::Am | SessionType::Pm | SessionType::Eve => 240,
            SessionType::Full => 480,
            SessionType::Pme => 420,
            SessionType::Extended => 600,
            SessionType::Night => 720,
            SessionType::Other => 240,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRecord {
    pub id: String,
    pub date: Option<NaiveDate>,
    /// Display name, or the id when the document carries no name.
    pub theatre: Option<String>,
    pub theatre_id: Option<String>,
    pub session_type: SessionType,
    pub surgeon: Option<String>,
    pub specialty: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub booked_minutes: u32,
    pub status: Option<String>,
    pub turnover_minutes: Option<u32>,
    #[serde(default)]
    pub issues: Vec<String>,
}

impl ScheduleRecord {
    pub fn from_document(id: impl Into<String>, doc: &Value) -> Self {
        let d = Document::new(doc);
        let theatre_id = d.text(&["theatreId"]);
        Self {
            id: id.into(),
            date: d.date(&["date", "sessionDate"]),
            theatre: d
                .text(&["theatre", "theatreName"])
                .or_else(|| theatre_id.clone()),
            theatre_id,
            session_type: d
                .text(&["sessionType", "session"])
                .map(|s| SessionType::parse(&s))
                .unwrap_or_default(),
            surgeon: d.text(&["surgeon", "consultant"]),
            specialty: d.text(&["specialty", "specialtyName"]),
            start_time: d.text(&["startTime", "scheduledTime"]),
            end_time: d.text(&["endTime"]),
            booked_minutes: d.minutes(&["bookedMinutes", "booked"]).unwrap_or(0),
            status: d.text(&["status"]).map(|s| s.to_lowercase()),
            turnover_minutes: d.minutes(&["turnoverMinutes", "turnoverTime"]),
            issues: d.list(&["issues"]),
        }
    }

    pub fn theatre_label(&self) -> &str {
        self.theatre.as_deref().unwrap_or(UNKNOWN_THEATRE)
    }

    /// Pages select a theatre by id or by display name.
    pub fn is_in_theatre(&self, wanted: &str) -> bool {
        self.theatre_id.as_deref() == Some(wanted) || self.theatre.as_deref() == Some(wanted)
    }

    /// Booked share of the planned session length, as a percentage.
    pub fn utilization(&self) -> f64 {
        let planned = self.session_type.duration_minutes();
        if planned == 0 {
            return 0.0;
        }
        f64::from(self.booked_minutes) / f64::from(planned) * 100.0
    }

    pub fn is_cancelled(&self) -> bool {
        self.status.as_deref() == Some(CANCELLED_STATUS)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffRecord {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub specialty: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub availability: Option<String>,
    pub experience_years: Option<u32>,
}

impl StaffRecord {
    pub fn from_document(id: impl Into<String>, doc: &Value) -> Self {
        let d = Document::new(doc);
        Self {
            id: id.into(),
            first_name: d.text(&["firstName"]).unwrap_or_default(),
            last_name: d.text(&["lastName"]).unwrap_or_default(),
            role: d
                .text(&["role", "jobTitle"])
                .unwrap_or_else(|| UNASSIGNED_ROLE.to_string()),
            specialty: d.text(&["specialty", "specialtyName"]),
            skills: d.list(&["skills"]),
            availability: d.text(&["availability"]),
            experience_years: d.whole_number(&["experience", "experienceYears"]),
        }
    }
}

/// A procedure waiting to be scheduled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcedureRecord {
    pub id: String,
    pub name: String,
    pub opcs_code: Option<String>,
    pub specialty: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub duration_minutes: Option<u32>,
    pub created_at: Option<DateTime<Utc>>,
}

impl ProcedureRecord {
    pub fn from_document(id: impl Into<String>, doc: &Value) -> Self {
        let d = Document::new(doc);
        Self {
            id: id.into(),
            name: d
                .text(&["name", "procedureName", "procedure"])
                .unwrap_or_default(),
            opcs_code: d.text(&["opcsCode"]),
            specialty: d.text(&["specialty", "specialtyName"]),
            priority: d.text(&["priority"]),
            status: d.text(&["status"]).map(|s| s.to_lowercase()),
            duration_minutes: d.minutes(&["duration", "estimatedDuration"]),
            created_at: d.timestamp(&["createdAt", "created"]),
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.status.as_deref() == Some(WAITING_STATUS)
    }
}

/// A theatre (the schedulable resource/location).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TheatreRecord {
    pub id: String,
    pub name: String,
    pub capacity: Option<u32>,
    #[serde(default)]
    pub equipment: Vec<String>,
    pub specialty: Option<String>,
}

impl TheatreRecord {
    pub fn from_document(id: impl Into<String>, doc: &Value) -> Self {
        let id = id.into();
        let d = Document::new(doc);
        Self {
            name: d.text(&["name"]).unwrap_or_else(|| id.clone()),
            capacity: d.whole_number(&["capacity"]),
            equipment: d.list(&["equipment"]),
            specialty: d.text(&["specialty", "specialtyName"]),
            id,
        }
    }
}
