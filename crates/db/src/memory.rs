//! In-memory [`BookingStore`] used by tests across the workspace and
//! as a fallback for local development without PostgreSQL.
//!
//! One write guard spans each commit, so the duplicate, capacity and
//! balance guards are applied under the same isolation the PostgreSQL
//! store gets from its transactions.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use gymbook_core::errors::{BookingError, BookingResult};
use gymbook_core::models::appointment::{Appointment, AppointmentStatus, BookingRequest};
use gymbook_core::models::customer::Customer;
use gymbook_core::models::time_label::TimeLabel;
use gymbook_core::models::trainer::{ServiceType, Trainer};
use gymbook_core::store::BookingStore;

#[derive(Default)]
struct Inner {
    trainers: HashMap<Uuid, Trainer>,
    customers: HashMap<Uuid, Customer>,
    appointments: HashMap<Uuid, Appointment>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_trainer(&self, trainer: Trainer) {
        self.write().trainers.insert(trainer.id, trainer);
    }

    pub fn insert_customer(&self, customer: Customer) {
        self.write().customers.insert(customer.id, customer);
    }

    pub fn insert_appointment(&self, appointment: Appointment) {
        self.write().appointments.insert(appointment.id, appointment);
    }

    /// Snapshot of a customer, for asserting balances in tests.
    pub fn customer(&self, id: Uuid) -> Option<Customer> {
        self.read().customers.get(&id).cloned()
    }

    /// Snapshot of an appointment, for asserting statuses in tests.
    pub fn appointment(&self, id: Uuid) -> Option<Appointment> {
        self.read().appointments.get(&id).cloned()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().expect("store lock poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().expect("store lock poisoned")
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn find_trainer(&self, id: Uuid) -> BookingResult<Option<Trainer>> {
        Ok(self.read().trainers.get(&id).cloned())
    }

    async fn find_customer(&self, id: Uuid) -> BookingResult<Option<Customer>> {
        Ok(self.read().customers.get(&id).cloned())
    }

    async fn find_appointment(&self, id: Uuid) -> BookingResult<Option<Appointment>> {
        Ok(self.read().appointments.get(&id).cloned())
    }

    async fn trainers_for(
        &self,
        service_type: ServiceType,
        location: &str,
    ) -> BookingResult<Vec<Trainer>> {
        Ok(self
            .read()
            .trainers
            .values()
            .filter(|t| t.service_type == service_type && t.serves(location))
            .cloned()
            .collect())
    }

    async fn confirmed_counts(
        &self,
        trainer_id: Uuid,
        date: NaiveDate,
        location: &str,
    ) -> BookingResult<HashMap<TimeLabel, u32>> {
        let mut counts: HashMap<TimeLabel, u32> = HashMap::new();
        for appointment in self.read().appointments.values() {
            if appointment.trainer_id == trainer_id
                && appointment.date == date
                && appointment.location == location
                && appointment.status == AppointmentStatus::Confirmed
            {
                *counts.entry(appointment.time).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn commit_booking(
        &self,
        request: &BookingRequest,
        capacity: u32,
    ) -> BookingResult<Appointment> {
        let mut inner = self.write();

        let duplicate = inner.appointments.values().any(|a| {
            a.customer_id == request.customer_id
                && a.trainer_id == request.trainer_id
                && a.date == request.date
                && a.time == request.time
                && a.status == AppointmentStatus::Confirmed
        });
        if duplicate {
            return Err(BookingError::Conflict(
                "Customer already holds this slot".to_string(),
            ));
        }

        let confirmed = inner
            .appointments
            .values()
            .filter(|a| {
                a.trainer_id == request.trainer_id
                    && a.date == request.date
                    && a.time == request.time
                    && a.location == request.location
                    && a.status == AppointmentStatus::Confirmed
            })
            .count() as u32;
        if confirmed >= capacity {
            return Err(BookingError::Conflict("Slot is fully booked".to_string()));
        }

        let customer = inner
            .customers
            .get_mut(&request.customer_id)
            .ok_or_else(|| {
                BookingError::NotFound(format!("Customer {} not found", request.customer_id))
            })?;
        let membership = customer
            .membership
            .as_mut()
            .ok_or(BookingError::MembershipExpired)?;
        membership.balance.debit()?;

        let appointment = Appointment {
            id: Uuid::new_v4(),
            trainer_id: request.trainer_id,
            customer_id: request.customer_id,
            date: request.date,
            time: request.time,
            location: request.location.clone(),
            status: AppointmentStatus::Confirmed,
            created_at: Utc::now(),
        };
        inner
            .appointments
            .insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn commit_cancellation(&self, appointment_id: Uuid) -> BookingResult<Appointment> {
        let mut inner = self.write();

        let (customer_id, status) = match inner.appointments.get(&appointment_id) {
            Some(a) => (a.customer_id, a.status),
            None => {
                return Err(BookingError::NotFound(format!(
                    "Appointment {appointment_id} not found"
                )))
            }
        };
        if status == AppointmentStatus::Cancelled {
            return Err(BookingError::AlreadyCancelled);
        }

        if let Some(membership) = inner
            .customers
            .get_mut(&customer_id)
            .and_then(|c| c.membership.as_mut())
        {
            membership.balance.credit();
        } else {
            tracing::warn!(
                "Cancelled appointment {} has no membership to credit",
                appointment_id
            );
        }

        let appointment = inner
            .appointments
            .get_mut(&appointment_id)
            .expect("appointment present above");
        appointment.status = AppointmentStatus::Cancelled;
        Ok(appointment.clone())
    }
}
