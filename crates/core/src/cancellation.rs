//! # Cancellation Policy Engine
//!
//! Validates a cancellation against the minimum-notice window, flips
//! the ledger entry to its terminal Cancelled status and restores the
//! owning customer's session balance. The status flip and the balance
//! credit are one atomic store operation; a rejected cancellation
//! leaves the appointment Confirmed.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use crate::booking::MAX_COMMIT_ATTEMPTS;
use crate::clock::Clock;
use crate::errors::{BookingError, BookingResult};
use crate::models::actor::Actor;
use crate::models::appointment::{Appointment, AppointmentStatus};
use crate::models::time_label::TimeLabel;
use crate::store::BookingStore;

/// Explicitly passed cancellation configuration, read once from the
/// environment at startup.
#[derive(Debug, Clone, Copy)]
pub struct CancellationPolicy {
    /// Minimum lead time, in hours, required to cancel with a refund.
    pub min_notice_hours: i64,
    /// The same fixed offset the availability resolver applies; both
    /// paths must agree on what "48 hours before" means.
    pub utc_offset_hours: i32,
}

impl CancellationPolicy {
    /// UTC instant of an appointment's local (date, hour) pair.
    pub fn appointment_instant(&self, date: NaiveDate, time: TimeLabel) -> DateTime<Utc> {
        let local = date
            .and_hms_opt(u32::from(time.hour()), 0, 0)
            .expect("hour label is within 0..=23");
        Utc.from_utc_datetime(&(local - Duration::hours(i64::from(self.utc_offset_hours))))
    }

    /// Whether a cancellation issued at `now` still meets the notice
    /// window. The boundary is inclusive: exactly `min_notice_hours`
    /// before the appointment is accepted.
    pub fn permits(&self, now: DateTime<Utc>, appointment: DateTime<Utc>) -> bool {
        appointment - now >= Duration::hours(self.min_notice_hours)
    }
}

pub struct CancellationEngine {
    store: Arc<dyn BookingStore>,
    clock: Arc<dyn Clock>,
    policy: CancellationPolicy,
}

impl CancellationEngine {
    pub fn new(store: Arc<dyn BookingStore>, clock: Arc<dyn Clock>, policy: CancellationPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    /// Cancels an appointment on behalf of an actor.
    ///
    /// An already-Cancelled appointment is rejected before the notice
    /// window is even considered, so a repeated cancel can never
    /// re-credit the balance. Appointments the actor may not manage
    /// are reported as missing.
    pub async fn cancel(&self, appointment_id: Uuid, actor: Actor) -> BookingResult<Appointment> {
        let appointment = self
            .store
            .find_appointment(appointment_id)
            .await?
            .ok_or_else(|| {
                BookingError::NotFound(format!("Appointment {appointment_id} not found"))
            })?;

        if !actor.may_manage(&appointment) {
            return Err(BookingError::NotFound(format!(
                "Appointment {appointment_id} not found"
            )));
        }

        if appointment.status == AppointmentStatus::Cancelled {
            return Err(BookingError::AlreadyCancelled);
        }

        let starts_at = self
            .policy
            .appointment_instant(appointment.date, appointment.time);
        let now = self.clock.now();
        if !self.policy.permits(now, starts_at) {
            return Err(BookingError::TooLate {
                hours_until: (starts_at - now).num_hours(),
                min_notice_hours: self.policy.min_notice_hours,
            });
        }

        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.store.commit_cancellation(appointment_id).await {
                Err(BookingError::StorageContention) if attempts < MAX_COMMIT_ATTEMPTS => {
                    tracing::debug!(
                        "Storage contention committing cancellation (attempt {attempts}), retrying"
                    );
                }
                Ok(cancelled) => {
                    tracing::info!(
                        "Cancelled appointment {} ({} {} at {})",
                        cancelled.id,
                        cancelled.date,
                        cancelled.time,
                        cancelled.location
                    );
                    return Ok(cancelled);
                }
                other => return other,
            }
        }
    }
}
