use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::errors::BookingResult;
use crate::models::appointment::{Appointment, BookingRequest};
use crate::models::customer::Customer;
use crate::models::time_label::TimeLabel;
use crate::models::trainer::{ServiceType, Trainer};

/// Storage seam for the booking engine.
///
/// `commit_booking` and `commit_cancellation` are the atomic units of
/// the whole system: implementations must recheck the duplicate,
/// capacity and balance guards under isolation, so that two callers
/// racing for the last open slot can never both commit. A rejected
/// commit leaves no partial state. Transient contention is reported as
/// [`BookingError::StorageContention`](crate::errors::BookingError)
/// and retried by the engines, never surfaced raw.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn find_trainer(&self, id: Uuid) -> BookingResult<Option<Trainer>>;

    async fn find_customer(&self, id: Uuid) -> BookingResult<Option<Customer>>;

    async fn find_appointment(&self, id: Uuid) -> BookingResult<Option<Appointment>>;

    /// Trainers matching a service type that work at the location.
    async fn trainers_for(
        &self,
        service_type: ServiceType,
        location: &str,
    ) -> BookingResult<Vec<Trainer>>;

    /// Confirmed reservation counts per hour label for one trainer,
    /// day and location.
    async fn confirmed_counts(
        &self,
        trainer_id: Uuid,
        date: NaiveDate,
        location: &str,
    ) -> BookingResult<HashMap<TimeLabel, u32>>;

    /// Atomically: reject a duplicate booking by the same customer,
    /// recheck `confirmed < capacity` for the slot, debit one session
    /// from the customer's balance and insert the Confirmed entry.
    async fn commit_booking(
        &self,
        request: &BookingRequest,
        capacity: u32,
    ) -> BookingResult<Appointment>;

    /// Atomically: flip a Confirmed entry to Cancelled (terminal) and
    /// credit one session back to the owning customer.
    async fn commit_cancellation(&self, appointment_id: Uuid) -> BookingResult<Appointment>;
}
