//! # Identity Extraction
//!
//! Resolves the calling actor from trusted headers. Authentication
//! happens upstream (gateway or session layer); the engine only needs
//! a pre-authenticated actor reference, so the extractor reads
//! `X-Actor-Id` and `X-Actor-Role` and nothing else.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use gymbook_core::errors::BookingError;
use gymbook_core::models::actor::{Actor, Role};

use super::error_handling::AppError;

const ACTOR_ID_HEADER: &str = "x-actor-id";
const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Extractor for the authenticated actor. Missing or malformed headers
/// reject the request before any handler logic runs.
#[derive(Debug, Clone, Copy)]
pub struct ActorContext(pub Actor);

#[async_trait]
impl<S> FromRequestParts<S> for ActorContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(ACTOR_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError(BookingError::Validation(
                    "Missing X-Actor-Id header".to_string(),
                ))
            })?;
        let id = Uuid::parse_str(id).map_err(|_| {
            AppError(BookingError::Validation(
                "X-Actor-Id must be a UUID".to_string(),
            ))
        })?;

        // Absent role defaults to customer, the common caller.
        let role = match parts.headers.get(ACTOR_ROLE_HEADER) {
            None => Role::Customer,
            Some(value) => value
                .to_str()
                .ok()
                .and_then(|s| s.parse::<Role>().ok())
                .ok_or_else(|| {
                    AppError(BookingError::Validation(
                        "X-Actor-Role must be customer, trainer or admin".to_string(),
                    ))
                })?,
        };

        Ok(Self(Actor::new(id, role)))
    }
}
