//! # Booking Transaction
//!
//! Reserves one open slot as a single atomic unit: the capacity
//! recheck, the duplicate-booking guard, the session-balance debit and
//! the ledger insert all happen inside one
//! [`BookingStore::commit_booking`] call. The engine itself only runs
//! the cheap short-circuiting precondition checks up front; a slot
//! that looks open here can still be lost to a concurrent booker, in
//! which case the store reports the conflict.

use std::sync::Arc;

use crate::clock::Clock;
use crate::errors::{BookingError, BookingResult};
use crate::models::appointment::{Appointment, BookingRequest};
use crate::store::BookingStore;

/// Bounded retry budget for transient storage contention. Retrying a
/// commit is safe: a contended attempt is confirmed not to have
/// committed.
pub(crate) const MAX_COMMIT_ATTEMPTS: u32 = 3;

pub struct BookingEngine {
    store: Arc<dyn BookingStore>,
    clock: Arc<dyn Clock>,
}

impl BookingEngine {
    pub fn new(store: Arc<dyn BookingStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Books one slot for a customer.
    ///
    /// Preconditions, each a short-circuiting rejection in order:
    /// trainer and customer exist; the trainer works at the requested
    /// location; the membership is present and unexpired; at least one
    /// session remains. The capacity check runs inside the store's
    /// atomic commit.
    pub async fn book(&self, request: BookingRequest) -> BookingResult<Appointment> {
        let trainer = self
            .store
            .find_trainer(request.trainer_id)
            .await?
            .ok_or_else(|| {
                BookingError::NotFound(format!("Trainer {} not found", request.trainer_id))
            })?;
        let customer = self
            .store
            .find_customer(request.customer_id)
            .await?
            .ok_or_else(|| {
                BookingError::NotFound(format!("Customer {} not found", request.customer_id))
            })?;

        if !trainer.serves(&request.location) {
            return Err(BookingError::Validation(format!(
                "Trainer {} does not work at {}",
                trainer.name, request.location
            )));
        }

        let membership = customer
            .membership
            .as_ref()
            .ok_or(BookingError::MembershipExpired)?;
        if !membership.is_active_at(self.clock.now()) {
            return Err(BookingError::MembershipExpired);
        }
        if membership.balance.remaining < 1 {
            return Err(BookingError::NoSessionsLeft);
        }

        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.store.commit_booking(&request, trainer.capacity).await {
                Err(BookingError::StorageContention) if attempts < MAX_COMMIT_ATTEMPTS => {
                    tracing::debug!(
                        "Storage contention committing booking (attempt {attempts}), retrying"
                    );
                }
                Ok(appointment) => {
                    tracing::info!(
                        "Booked appointment {} for customer {} with trainer {} at {} {}",
                        appointment.id,
                        appointment.customer_id,
                        appointment.trainer_id,
                        appointment.date,
                        appointment.time
                    );
                    return Ok(appointment);
                }
                other => return other,
            }
        }
    }
}
