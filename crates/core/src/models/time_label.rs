use std::fmt;

use serde::{Deserialize, Serialize};

/// Hour-of-day slot label, constrained to 0..=23.
///
/// Schedules key their slots by bare hour numbers (8, 9, 10, ...), so
/// the wire format is a plain integer rather than a free-form string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct TimeLabel(u8);

impl TimeLabel {
    pub const fn hour(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for TimeLabel {
    type Error = String;

    fn try_from(hour: u8) -> Result<Self, Self::Error> {
        if hour > 23 {
            Err(format!("time label out of range: {hour}"))
        } else {
            Ok(Self(hour))
        }
    }
}

impl From<TimeLabel> for u8 {
    fn from(label: TimeLabel) -> u8 {
        label.0
    }
}

impl fmt::Display for TimeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00", self.0)
    }
}
