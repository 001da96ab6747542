use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::time_label::TimeLabel;

/// The kind of service a trainer offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    Boxing,
    #[serde(rename = "PT")]
    Pt,
    Physio,
    Pilates,
}

impl ServiceType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Boxing => "Boxing",
            Self::Pt => "PT",
            Self::Physio => "Physio",
            Self::Pilates => "Pilates",
        }
    }
}

impl FromStr for ServiceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Boxing" => Ok(Self::Boxing),
            "PT" => Ok(Self::Pt),
            "Physio" => Ok(Self::Physio),
            "Pilates" => Ok(Self::Pilates),
            other => Err(format!("unknown service type: {other}")),
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Package tier sold against a trainer. The tier decides how many
/// customers may share one slot (the trainer's assigned capacity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackageKind {
    Solo,
    Duo,
    Trio,
    Group,
}

impl PackageKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Solo => "Solo",
            Self::Duo => "Duo",
            Self::Trio => "Trio",
            Self::Group => "Group",
        }
    }
}

impl FromStr for PackageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Solo" => Ok(Self::Solo),
            "Duo" => Ok(Self::Duo),
            "Trio" => Ok(Self::Trio),
            "Group" => Ok(Self::Group),
            other => Err(format!("unknown package kind: {other}")),
        }
    }
}

impl fmt::Display for PackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weekly availability template: a fixed Monday-first mapping of
/// weekday to the set of declared hour labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyTemplate {
    days: [BTreeSet<TimeLabel>; 7],
}

impl WeeklyTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, day: Weekday, label: TimeLabel) {
        self.days[day.num_days_from_monday() as usize].insert(label);
    }

    pub fn slots_for(&self, day: Weekday) -> &BTreeSet<TimeLabel> {
        &self.days[day.num_days_from_monday() as usize]
    }

    pub fn is_empty(&self) -> bool {
        self.days.iter().all(BTreeSet::is_empty)
    }
}

impl Default for WeeklyTemplate {
    fn default() -> Self {
        Self {
            days: std::array::from_fn(|_| BTreeSet::new()),
        }
    }
}

/// A recurring service provider. The locations a trainer works at are
/// the keys of `templates`; the weekly template is mutated only by the
/// trainer, the capacity only by an administrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trainer {
    pub id: Uuid,
    pub name: String,
    pub service_type: ServiceType,
    pub package_kind: PackageKind,
    /// Maximum simultaneous Confirmed reservations per slot.
    pub capacity: u32,
    pub templates: HashMap<String, WeeklyTemplate>,
}

impl Trainer {
    pub fn serves(&self, location: &str) -> bool {
        self.templates.contains_key(location)
    }

    pub fn template_for(&self, location: &str) -> Option<&WeeklyTemplate> {
        self.templates.get(location)
    }
}
