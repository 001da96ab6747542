use chrono::{DateTime, NaiveDate, Utc, Weekday};
use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use gymbook_core::models::appointment::{Appointment, AppointmentStatus};
use gymbook_core::models::customer::{Customer, Membership, SessionBalance};
use gymbook_core::models::time_label::TimeLabel;
use gymbook_core::models::trainer::WeeklyTemplate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbTrainer {
    pub id: Uuid,
    pub name: String,
    pub service_type: String,
    pub package_kind: String,
    pub capacity: i32,
    pub created_at: DateTime<Utc>,
}

/// One declared template hour: (trainer, location, weekday, hour).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAvailability {
    pub trainer_id: Uuid,
    pub location: String,
    /// 0 = Monday .. 6 = Sunday.
    pub weekday: i16,
    pub hour: i16,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbCustomer {
    pub id: Uuid,
    pub name: String,
    pub package_kind: Option<String>,
    pub price: Option<i64>,
    pub membership_starts_at: Option<DateTime<Utc>>,
    pub membership_ends_at: Option<DateTime<Utc>>,
    pub sessions_remaining: i32,
    pub sessions_consumed: i32,
    pub sessions_total: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAppointment {
    pub id: Uuid,
    pub trainer_id: Uuid,
    pub customer_id: Uuid,
    pub date: NaiveDate,
    pub time: i16,
    pub location: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

pub(crate) fn weekday_from_index(index: i16) -> Result<Weekday> {
    Ok(match index {
        0 => Weekday::Mon,
        1 => Weekday::Tue,
        2 => Weekday::Wed,
        3 => Weekday::Thu,
        4 => Weekday::Fri,
        5 => Weekday::Sat,
        6 => Weekday::Sun,
        other => return Err(eyre!("weekday index out of range: {other}")),
    })
}

pub(crate) fn time_label_from_db(hour: i16) -> Result<TimeLabel> {
    let hour = u8::try_from(hour).map_err(|_| eyre!("hour out of range: {hour}"))?;
    TimeLabel::try_from(hour).map_err(|e| eyre!(e))
}

impl DbAvailability {
    pub(crate) fn apply_to(&self, template: &mut WeeklyTemplate) -> Result<()> {
        template.declare(weekday_from_index(self.weekday)?, time_label_from_db(self.hour)?);
        Ok(())
    }
}

impl DbCustomer {
    pub fn into_domain(self) -> Result<Customer> {
        let membership = match (self.package_kind, self.membership_starts_at, self.membership_ends_at) {
            (Some(kind), Some(starts_at), Some(ends_at)) => Some(Membership {
                package_kind: kind.parse().map_err(|e: String| eyre!(e))?,
                price: self.price.unwrap_or(0),
                starts_at,
                ends_at,
                balance: SessionBalance {
                    remaining: u32::try_from(self.sessions_remaining)
                        .map_err(|_| eyre!("negative remaining session count"))?,
                    consumed: u32::try_from(self.sessions_consumed)
                        .map_err(|_| eyre!("negative consumed session count"))?,
                    total: u32::try_from(self.sessions_total)
                        .map_err(|_| eyre!("negative total session count"))?,
                },
            }),
            _ => None,
        };

        Ok(Customer {
            id: self.id,
            name: self.name,
            membership,
        })
    }
}

impl DbAppointment {
    pub fn into_domain(self) -> Result<Appointment> {
        Ok(Appointment {
            id: self.id,
            trainer_id: self.trainer_id,
            customer_id: self.customer_id,
            date: self.date,
            time: time_label_from_db(self.time)?,
            location: self.location,
            status: self
                .status
                .parse::<AppointmentStatus>()
                .map_err(|e| eyre!(e))?,
            created_at: self.created_at,
        })
    }
}
