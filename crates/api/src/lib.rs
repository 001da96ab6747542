//! # Gymbook API
//!
//! The API crate provides the web server for the gymbook appointment
//! service: availability lookups, booking and cancellation.
//!
//! ## Architecture
//!
//! - **Routes**: Define API endpoints and URL structure
//! - **Handlers**: Thin adapters that call the core engines
//! - **Middleware**: Actor identity extraction and error mapping
//! - **Config**: Environment-driven configuration
//!
//! All business rules live in `gymbook-core`; handlers translate HTTP
//! requests into engine calls and typed rejections into status codes.

/// Configuration module for API settings
pub mod config;
/// Request handlers that call into the booking engines
pub mod handlers;
/// Middleware for identity extraction and error handling
pub mod middleware;
/// Route definitions and API endpoint structure
pub mod routes;

use std::sync::Arc;

use axum::Router;
use eyre::Result;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use gymbook_core::availability::AvailabilityResolver;
use gymbook_core::booking::BookingEngine;
use gymbook_core::cancellation::{CancellationEngine, CancellationPolicy};
use gymbook_core::clock::{Clock, SystemClock};
use gymbook_core::store::BookingStore;

/// Shared application state accessible to all request handlers.
pub struct ApiState {
    pub availability: AvailabilityResolver,
    pub booking: BookingEngine,
    pub cancellation: CancellationEngine,
    pub store: Arc<dyn BookingStore>,
    pub clock: Arc<dyn Clock>,
}

impl ApiState {
    /// Wires the three engines to one store and one clock. The notice
    /// window and UTC offset are passed in explicitly; nothing reads
    /// them ambiently later.
    pub fn new(
        store: Arc<dyn BookingStore>,
        clock: Arc<dyn Clock>,
        min_notice_hours: i64,
        utc_offset_hours: i32,
    ) -> Self {
        Self {
            availability: AvailabilityResolver::new(store.clone(), utc_offset_hours),
            booking: BookingEngine::new(store.clone(), clock.clone()),
            cancellation: CancellationEngine::new(
                store.clone(),
                clock.clone(),
                CancellationPolicy {
                    min_notice_hours,
                    utc_offset_hours,
                },
            ),
            store,
            clock,
        }
    }
}

/// Builds the application router with all routes attached.
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        // Health check endpoints
        .merge(routes::health::routes())
        // Availability resolution endpoints
        .merge(routes::availability::routes())
        // Booking and cancellation endpoints
        .merge(routes::appointment::routes())
        .with_state(state)
}

/// Starts the API server with the provided configuration and store.
pub async fn start_server(config: config::ApiConfig, store: Arc<dyn BookingStore>) -> Result<()> {
    // Initialize tracing for logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let state = Arc::new(ApiState::new(
        store,
        Arc::new(SystemClock),
        config.min_notice_hours,
        config.utc_offset_hours,
    ));

    let app = router(state);

    // Apply CORS configuration if origins are specified
    let app = if let Some(origins) = &config.cors_origins {
        let mut allowed = Vec::with_capacity(origins.len());
        for origin in origins {
            allowed.push(origin.parse()?);
        }
        let cors = tower_http::cors::CorsLayer::new()
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::HeaderName::from_static("x-actor-id"),
                axum::http::header::HeaderName::from_static("x-actor-role"),
            ])
            .allow_origin(allowed)
            .allow_credentials(true);

        app.layer(cors)
    } else {
        app
    };

    // Request tracing and timeout middleware
    let app = app
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::timeout::TimeoutLayer::new(
            std::time::Duration::from_secs(config.request_timeout),
        ));

    // Start the HTTP server
    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
