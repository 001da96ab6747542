use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::time_label::TimeLabel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Confirmed,
    Cancelled,
}

impl AppointmentStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Confirmed => "Confirmed",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Confirmed" => Ok(Self::Confirmed),
            "Cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown appointment status: {other}")),
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ledger entry for one reserved slot. Cancelled is terminal and
/// entries are never deleted (audit trail).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub trainer_id: Uuid,
    pub customer_id: Uuid,
    pub date: NaiveDate,
    pub time: TimeLabel,
    pub location: String,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

/// The intent handed to the store's atomic booking commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub customer_id: Uuid,
    pub trainer_id: Uuid,
    pub date: NaiveDate,
    pub time: TimeLabel,
    pub location: String,
}

/// Request body for booking an appointment; the customer id comes from
/// the authenticated actor, not the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub trainer_id: Uuid,
    pub date: NaiveDate,
    pub time: TimeLabel,
    pub location: String,
}
