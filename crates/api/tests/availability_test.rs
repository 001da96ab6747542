
use axum::http::{HeaderName, HeaderValue, StatusCode};
use pretty_assertions::assert_eq;
use uuid::Uuid;

use gymbook_core::models::availability::AvailabilityResponse;
use gymbook_core::models::trainer::PackageKind;

use test_utils::{context, label, seed_customer, seed_trainer, DOWNTOWN};

fn actor_id_header(id: Uuid) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-actor-id"),
        HeaderValue::from_str(&id.to_string()).unwrap(),
    )
}

#[tokio::test]
async fn test_get_availability_lists_open_slots() {
    let ctx = context(24);
    let trainer = seed_trainer(&ctx, 2, PackageKind::Duo);

    let response = ctx
        .server
        .get("/api/availability")
        .add_query_param("date", "2024-06-10")
        .add_query_param("service_type", "Boxing")
        .add_query_param("location", DOWNTOWN)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: AvailabilityResponse = response.json();
    assert_eq!(body.trainers.len(), 1);
    assert_eq!(body.trainers[0].trainer_id, trainer.id);
    assert_eq!(body.trainers[0].day, "Mon");
    assert_eq!(
        body.trainers[0].open_times,
        vec![label(9), label(10), label(11)]
    );
}

#[tokio::test]
async fn test_get_availability_defaults_to_current_day() {
    let ctx = context(24);
    // The clock is pinned to Monday 2024-06-03.
    seed_trainer(&ctx, 1, PackageKind::Solo);

    let response = ctx
        .server
        .get("/api/availability")
        .add_query_param("service_type", "Boxing")
        .add_query_param("location", DOWNTOWN)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: AvailabilityResponse = response.json();
    assert_eq!(body.date.to_string(), "2024-06-03");
    assert_eq!(body.trainers.len(), 1);
}

#[tokio::test]
async fn test_get_availability_filters_by_customer_entitlement() {
    let ctx = context(24);
    let solo_trainer = seed_trainer(&ctx, 1, PackageKind::Solo);
    seed_trainer(&ctx, 2, PackageKind::Duo);
    let customer = seed_customer(&ctx, 5, PackageKind::Solo);

    let (name, value) = actor_id_header(customer.id);
    let response = ctx
        .server
        .get("/api/availability")
        .add_query_param("date", "2024-06-10")
        .add_query_param("service_type", "Boxing")
        .add_query_param("location", DOWNTOWN)
        .add_header(name, value)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: AvailabilityResponse = response.json();
    assert_eq!(body.trainers.len(), 1);
    assert_eq!(body.trainers[0].trainer_id, solo_trainer.id);
}

#[tokio::test]
async fn test_get_availability_rejects_unknown_service_type() {
    let ctx = context(24);
    let response = ctx
        .server
        .get("/api/availability")
        .add_query_param("date", "2024-06-10")
        .add_query_param("service_type", "Zumba")
        .add_query_param("location", DOWNTOWN)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_availability_empty_when_no_trainers_match() {
    let ctx = context(24);
    seed_trainer(&ctx, 2, PackageKind::Duo);

    let response = ctx
        .server
        .get("/api/availability")
        .add_query_param("date", "2024-06-10")
        .add_query_param("service_type", "Pilates")
        .add_query_param("location", DOWNTOWN)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: AvailabilityResponse = response.json();
    assert!(body.trainers.is_empty());
}
