//! # Availability Handler
//!
//! Thin adapter over the core availability resolver: parses the query,
//! decides which calendar day to resolve, and couples the result to
//! the requesting customer's entitlement when the caller is one.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use gymbook_core::models::actor::Role;
use gymbook_core::models::availability::AvailabilityResponse;
use gymbook_core::models::trainer::ServiceType;

use crate::middleware::{error_handling::AppError, identity::ActorContext};
use crate::ApiState;

/// Query parameters for the availability endpoint.
///
/// `date` is optional; when absent the current day (under the fixed
/// UTC offset) is resolved.
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: Option<NaiveDate>,
    pub service_type: ServiceType,
    pub location: String,
}

/// Lists still-open slots per trainer for a day, service type and
/// location.
///
/// # Endpoint
///
/// ```text
/// GET /api/availability?date=2024-06-10&service_type=Boxing&location=Downtown
/// ```
#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<Arc<ApiState>>,
    actor: Option<ActorContext>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    // Only customer callers are entitlement-filtered; trainers and
    // admins (and anonymous probes) see every candidate.
    let customer_id = actor.and_then(|ActorContext(actor)| {
        (actor.role == Role::Customer).then_some(actor.id)
    });

    let response = match query.date {
        Some(date) => {
            state
                .availability
                .resolve_on(date, query.service_type, &query.location, customer_id)
                .await?
        }
        None => {
            state
                .availability
                .resolve_at(
                    state.clock.now(),
                    query.service_type,
                    &query.location,
                    customer_id,
                )
                .await?
        }
    };

    Ok(Json(response))
}
