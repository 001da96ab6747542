//! # Availability Resolver
//!
//! Merges three sources into the set of still-open slots for a day:
//! each trainer's weekly availability template, the reservation ledger
//! (Confirmed entries only) and the trainer's per-slot capacity.
//!
//! The algorithm:
//!
//! 1. Normalize the requested instant to a local calendar day using
//!    the single fixed UTC offset, and derive its weekday.
//! 2. Select candidate trainers by service type and location. When the
//!    requesting customer holds a membership, only trainers whose
//!    package tier matches the membership's entitled tier are visible.
//! 3. Look up each candidate's template for that location and weekday;
//!    a trainer with no template there contributes nothing.
//! 4. Drop every declared hour whose Confirmed count has already
//!    reached the trainer's capacity.
//!
//! Results are grouped per trainer; ordering beyond that grouping is
//! not guaranteed.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::errors::{BookingError, BookingResult};
use crate::models::availability::{AvailabilityResponse, TrainerAvailability};
use crate::models::time_label::TimeLabel;
use crate::models::trainer::{PackageKind, ServiceType};
use crate::store::BookingStore;

pub struct AvailabilityResolver {
    store: Arc<dyn BookingStore>,
    /// Fixed offset applied once per request when turning an instant
    /// into a local calendar day. Passed in explicitly, never ambient.
    utc_offset_hours: i32,
}

impl AvailabilityResolver {
    pub fn new(store: Arc<dyn BookingStore>, utc_offset_hours: i32) -> Self {
        Self {
            store,
            utc_offset_hours,
        }
    }

    /// Resolves availability for the local calendar day containing the
    /// given instant.
    pub async fn resolve_at(
        &self,
        at: DateTime<Utc>,
        service_type: ServiceType,
        location: &str,
        customer_id: Option<Uuid>,
    ) -> BookingResult<AvailabilityResponse> {
        let date = (at + Duration::hours(i64::from(self.utc_offset_hours))).date_naive();
        self.resolve_on(date, service_type, location, customer_id).await
    }

    /// Resolves availability for an explicit calendar day.
    pub async fn resolve_on(
        &self,
        date: NaiveDate,
        service_type: ServiceType,
        location: &str,
        customer_id: Option<Uuid>,
    ) -> BookingResult<AvailabilityResponse> {
        let weekday = date.weekday();
        tracing::debug!(
            "Resolving availability: date={}, weekday={}, service_type={}, location={}",
            date,
            weekday,
            service_type,
            location
        );

        let entitlement = self.entitlement_for(customer_id).await?;

        let mut trainers = Vec::new();
        for trainer in self.store.trainers_for(service_type, location).await? {
            if let Some(kind) = entitlement {
                if trainer.package_kind != kind {
                    continue;
                }
            }

            // No template for this location/day means no slots, not an error.
            let Some(template) = trainer.template_for(location) else {
                continue;
            };
            let declared = template.slots_for(weekday);
            if declared.is_empty() {
                continue;
            }

            let counts = self
                .store
                .confirmed_counts(trainer.id, date, location)
                .await?;
            let open_times: Vec<TimeLabel> = declared
                .iter()
                .copied()
                .filter(|label| counts.get(label).copied().unwrap_or(0) < trainer.capacity)
                .collect();

            trainers.push(TrainerAvailability {
                trainer_id: trainer.id,
                trainer_name: trainer.name,
                day: weekday.to_string(),
                service_type: trainer.service_type,
                open_times,
            });
        }

        Ok(AvailabilityResponse {
            date,
            location: location.to_string(),
            service_type,
            trainers,
        })
    }

    /// Package tier the requesting customer is entitled to book, if
    /// they hold a membership. Callers without a membership see every
    /// candidate trainer; booking still rejects them later.
    async fn entitlement_for(&self, customer_id: Option<Uuid>) -> BookingResult<Option<PackageKind>> {
        let Some(id) = customer_id else {
            return Ok(None);
        };
        let customer = self
            .store
            .find_customer(id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("Customer {id} not found")))?;
        Ok(customer.membership.map(|m| m.package_kind))
    }
}
