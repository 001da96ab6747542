use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::appointment::Appointment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Trainer,
    Admin,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "customer" => Ok(Self::Customer),
            "trainer" => Ok(Self::Trainer),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A pre-authenticated caller. The engine trusts this reference; how
/// it was authenticated is not the core's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    /// Whether this actor may view or cancel the given appointment:
    /// admins may manage any, trainers their own slots, customers
    /// their own bookings.
    pub fn may_manage(&self, appointment: &Appointment) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Trainer => appointment.trainer_id == self.id,
            Role::Customer => appointment.customer_id == self.id,
        }
    }
}
