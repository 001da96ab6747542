use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::time_label::TimeLabel;
use super::trainer::ServiceType;

/// One trainer's contribution to an availability result: the resolved
/// day and the hour labels that still have capacity left.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainerAvailability {
    pub trainer_id: Uuid,
    pub trainer_name: String,
    /// Short weekday label for the resolved calendar day ("Mon", ...).
    pub day: String,
    pub service_type: ServiceType,
    pub open_times: Vec<TimeLabel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub date: NaiveDate,
    pub location: String,
    pub service_type: ServiceType,
    pub trainers: Vec<TrainerAvailability>,
}
