use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Provenance tag for appointments created by the conversational engine.
pub const BOOKED_BY_ASSISTANT: &str = "assistant";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub service: String,
    pub customer_id: String,
    pub customer_name: Option<String>,
    /// Business-local calendar date, carried from the same local date used
    /// to build `start_at`. Never recomputed from the UTC instant, so day
    /// filters stay consistent across DST boundaries.
    pub day: NaiveDate,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub booked_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new appointment; the store generates the id and timestamps.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub service: String,
    pub customer_id: String,
    pub customer_name: Option<String>,
    pub day: NaiveDate,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub booked_by: String,
}

/// Partial update applied by `SlotStore::update`. `None` fields are left
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct AppointmentPatch {
    pub day: Option<NaiveDate>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub status: Option<AppointmentStatus>,
}

/// A `Hold` is a provisional reservation created during an availability
/// check. It blocks the interval for everyone until confirmed or deleted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Hold,
    Confirmed,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Hold => "hold",
            AppointmentStatus::Confirmed => "confirmed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "confirmed" => AppointmentStatus::Confirmed,
            _ => AppointmentStatus::Hold,
        }
    }
}
