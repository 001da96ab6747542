//! # Appointment Handlers
//!
//! Booking, cancellation and the audit view. The handlers only adapt
//! HTTP to the engines; every invariant (capacity, balance, notice
//! window) is enforced in `gymbook-core` and the store's atomic
//! commits.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use gymbook_core::errors::BookingError;
use gymbook_core::models::actor::Role;
use gymbook_core::models::appointment::{Appointment, BookAppointmentRequest, BookingRequest};

use crate::middleware::{error_handling::AppError, identity::ActorContext};
use crate::ApiState;

/// Books one slot for the calling customer.
///
/// # Endpoint
///
/// ```text
/// POST /api/appointments
/// {"trainer_id": "...", "date": "2024-06-10", "time": 9, "location": "Downtown"}
/// ```
#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<ApiState>>,
    ActorContext(actor): ActorContext,
    Json(payload): Json<BookAppointmentRequest>,
) -> Result<Json<Appointment>, AppError> {
    if actor.role != Role::Customer {
        return Err(AppError(BookingError::Validation(
            "Only customers can book appointments".to_string(),
        )));
    }

    let appointment = state
        .booking
        .book(BookingRequest {
            customer_id: actor.id,
            trainer_id: payload.trainer_id,
            date: payload.date,
            time: payload.time,
            location: payload.location,
        })
        .await?;

    Ok(Json(appointment))
}

/// Cancels an appointment on behalf of the calling actor.
///
/// # Endpoint
///
/// ```text
/// POST /api/appointments/:id/cancel
/// ```
#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<ApiState>>,
    ActorContext(actor): ActorContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Appointment>, AppError> {
    let cancelled = state.cancellation.cancel(id, actor).await?;
    Ok(Json(cancelled))
}

/// Fetches one ledger entry. Customers see their own bookings,
/// trainers their own slots, admins everything.
///
/// # Endpoint
///
/// ```text
/// GET /api/appointments/:id
/// ```
#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<ApiState>>,
    ActorContext(actor): ActorContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Appointment>, AppError> {
    let appointment = state
        .store
        .find_appointment(id)
        .await?
        .filter(|a| actor.may_manage(a))
        .ok_or_else(|| BookingError::NotFound(format!("Appointment {id} not found")))?;

    Ok(Json(appointment))
}
