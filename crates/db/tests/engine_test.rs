use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc, Weekday};
use pretty_assertions::assert_eq;
use uuid::Uuid;

use gymbook_core::availability::AvailabilityResolver;
use gymbook_core::booking::BookingEngine;
use gymbook_core::cancellation::{CancellationEngine, CancellationPolicy};
use gymbook_core::clock::FixedClock;
use gymbook_core::errors::BookingError;
use gymbook_core::models::actor::{Actor, Role};
use gymbook_core::models::appointment::{AppointmentStatus, BookingRequest};
use gymbook_core::models::customer::{Customer, Membership, SessionBalance};
use gymbook_core::models::time_label::TimeLabel;
use gymbook_core::models::trainer::{PackageKind, ServiceType, Trainer, WeeklyTemplate};
use gymbook_core::store::BookingStore;
use gymbook_db::memory::MemoryStore;

const DOWNTOWN: &str = "Downtown";

// 2024-06-10 is a Monday.
fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
}

fn label(hour: u8) -> TimeLabel {
    TimeLabel::try_from(hour).unwrap()
}

fn trainer(capacity: u32, package_kind: PackageKind) -> Trainer {
    let mut template = WeeklyTemplate::new();
    for hour in [9, 10, 11] {
        template.declare(Weekday::Mon, label(hour));
    }
    Trainer {
        id: Uuid::new_v4(),
        name: "T1".to_string(),
        service_type: ServiceType::Boxing,
        package_kind,
        capacity,
        templates: [(DOWNTOWN.to_string(), template)].into_iter().collect(),
    }
}

fn customer(remaining: u32, package_kind: PackageKind) -> Customer {
    Customer {
        id: Uuid::new_v4(),
        name: "C1".to_string(),
        membership: Some(Membership {
            package_kind,
            price: 400,
            starts_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            ends_at: Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap(),
            balance: SessionBalance {
                remaining,
                consumed: 0,
                total: remaining,
            },
        }),
    }
}

fn booking_request(customer_id: Uuid, trainer_id: Uuid, hour: u8) -> BookingRequest {
    BookingRequest {
        customer_id,
        trainer_id,
        date: monday(),
        time: label(hour),
        location: DOWNTOWN.to_string(),
    }
}

struct Harness {
    store: Arc<MemoryStore>,
    clock: Arc<FixedClock>,
    booking: BookingEngine,
    cancellation: CancellationEngine,
    resolver: AvailabilityResolver,
}

/// Engines wired to a shared in-memory store with the clock pinned to
/// a week before the test's standard Monday.
fn harness(min_notice_hours: i64) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap(),
    ));
    let booking = BookingEngine::new(store.clone(), clock.clone());
    let cancellation = CancellationEngine::new(
        store.clone(),
        clock.clone(),
        CancellationPolicy {
            min_notice_hours,
            utc_offset_hours: 0,
        },
    );
    let resolver = AvailabilityResolver::new(store.clone(), 0);
    Harness {
        store,
        clock,
        booking,
        cancellation,
        resolver,
    }
}

#[tokio::test]
async fn test_capacity_two_admits_two_then_rejects_third() {
    let h = harness(24);
    let t = trainer(2, PackageKind::Duo);
    let c1 = customer(5, PackageKind::Duo);
    let c2 = customer(5, PackageKind::Duo);
    let c3 = customer(5, PackageKind::Duo);
    h.store.insert_trainer(t.clone());
    for c in [&c1, &c2, &c3] {
        h.store.insert_customer((*c).clone());
    }

    h.booking
        .book(booking_request(c1.id, t.id, 9))
        .await
        .expect("first booking should succeed");
    h.booking
        .book(booking_request(c2.id, t.id, 9))
        .await
        .expect("second booking should succeed");

    let err = h
        .booking
        .book(booking_request(c3.id, t.id, 9))
        .await
        .expect_err("third booking must be rejected");
    assert!(matches!(err, BookingError::Conflict(_)));

    // Rejected booking leaves the third customer's balance untouched.
    let balance = h.store.customer(c3.id).unwrap().membership.unwrap().balance;
    assert_eq!(balance.remaining, 5);
    assert_eq!(balance.consumed, 0);
}

#[tokio::test]
async fn test_duplicate_booking_by_same_customer_is_conflict() {
    let h = harness(24);
    let t = trainer(5, PackageKind::Group);
    let c = customer(5, PackageKind::Group);
    h.store.insert_trainer(t.clone());
    h.store.insert_customer(c.clone());

    h.booking
        .book(booking_request(c.id, t.id, 10))
        .await
        .expect("first booking should succeed");

    let err = h
        .booking
        .book(booking_request(c.id, t.id, 10))
        .await
        .expect_err("re-booking the same slot must be rejected");
    assert!(matches!(err, BookingError::Conflict(_)));

    let balance = h.store.customer(c.id).unwrap().membership.unwrap().balance;
    assert_eq!(balance.remaining, 4);
    assert_eq!(balance.consumed, 1);
}

#[tokio::test]
async fn test_no_sessions_left_leaves_ledger_untouched() {
    let h = harness(24);
    let t = trainer(3, PackageKind::Trio);
    let c = customer(0, PackageKind::Trio);
    h.store.insert_trainer(t.clone());
    h.store.insert_customer(c.clone());

    let err = h
        .booking
        .book(booking_request(c.id, t.id, 9))
        .await
        .expect_err("booking with empty balance must be rejected");
    assert!(matches!(err, BookingError::NoSessionsLeft));

    let counts = h
        .store
        .confirmed_counts(t.id, monday(), DOWNTOWN)
        .await
        .unwrap();
    assert!(counts.is_empty());
}

#[tokio::test]
async fn test_expired_membership_is_rejected() {
    let h = harness(24);
    let t = trainer(3, PackageKind::Solo);
    let mut c = customer(5, PackageKind::Solo);
    c.membership.as_mut().unwrap().ends_at = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
    h.store.insert_trainer(t.clone());
    h.store.insert_customer(c.clone());

    let err = h
        .booking
        .book(booking_request(c.id, t.id, 9))
        .await
        .expect_err("expired membership must be rejected");
    assert!(matches!(err, BookingError::MembershipExpired));
}

#[tokio::test]
async fn test_unknown_trainer_and_customer_are_not_found() {
    let h = harness(24);
    let t = trainer(1, PackageKind::Solo);
    let c = customer(5, PackageKind::Solo);
    h.store.insert_trainer(t.clone());
    h.store.insert_customer(c.clone());

    let err = h
        .booking
        .book(booking_request(c.id, Uuid::new_v4(), 9))
        .await
        .expect_err("unknown trainer");
    assert!(matches!(err, BookingError::NotFound(_)));

    let err = h
        .booking
        .book(booking_request(Uuid::new_v4(), t.id, 9))
        .await
        .expect_err("unknown customer");
    assert!(matches!(err, BookingError::NotFound(_)));
}

#[tokio::test]
async fn test_cancel_outside_window_restores_balance() {
    // minNoticeHours = 24, cancelling 48h before the appointment.
    let h = harness(24);
    let t = trainer(2, PackageKind::Duo);
    let c = customer(5, PackageKind::Duo);
    h.store.insert_trainer(t.clone());
    h.store.insert_customer(c.clone());

    let appointment = h
        .booking
        .book(booking_request(c.id, t.id, 9))
        .await
        .expect("booking should succeed");
    h.clock
        .set(Utc.with_ymd_and_hms(2024, 6, 8, 9, 0, 0).unwrap());

    let cancelled = h
        .cancellation
        .cancel(appointment.id, Actor::new(c.id, Role::Customer))
        .await
        .expect("cancellation 48h ahead should succeed");
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);

    let balance = h.store.customer(c.id).unwrap().membership.unwrap().balance;
    assert_eq!(balance, SessionBalance::purchased(5));
}

#[tokio::test]
async fn test_cancel_inside_window_is_too_late() {
    // minNoticeHours = 24, cancelling 2h before the appointment.
    let h = harness(24);
    let t = trainer(2, PackageKind::Duo);
    let c = customer(5, PackageKind::Duo);
    h.store.insert_trainer(t.clone());
    h.store.insert_customer(c.clone());

    let appointment = h
        .booking
        .book(booking_request(c.id, t.id, 9))
        .await
        .expect("booking should succeed");
    h.clock
        .set(Utc.with_ymd_and_hms(2024, 6, 10, 7, 0, 0).unwrap());

    let err = h
        .cancellation
        .cancel(appointment.id, Actor::new(c.id, Role::Customer))
        .await
        .expect_err("cancellation 2h ahead must be rejected");
    assert!(matches!(err, BookingError::TooLate { .. }));

    // Reservation stays Confirmed, balance stays debited.
    let stored = h.store.appointment(appointment.id).unwrap();
    assert_eq!(stored.status, AppointmentStatus::Confirmed);
    let balance = h.store.customer(c.id).unwrap().membership.unwrap().balance;
    assert_eq!(balance.remaining, 4);
}

#[tokio::test]
async fn test_cancel_exactly_at_notice_boundary_is_accepted() {
    let h = harness(24);
    let t = trainer(2, PackageKind::Duo);
    let c = customer(5, PackageKind::Duo);
    h.store.insert_trainer(t.clone());
    h.store.insert_customer(c.clone());

    let appointment = h
        .booking
        .book(booking_request(c.id, t.id, 9))
        .await
        .expect("booking should succeed");

    // Exactly 24h before 2024-06-10 09:00.
    h.clock
        .set(Utc.with_ymd_and_hms(2024, 6, 9, 9, 0, 0).unwrap());
    h.cancellation
        .cancel(appointment.id, Actor::new(c.id, Role::Customer))
        .await
        .expect("cancellation exactly at the boundary should succeed");
}

#[tokio::test]
async fn test_second_cancel_never_credits_twice() {
    let h = harness(0);
    let t = trainer(2, PackageKind::Duo);
    let c = customer(5, PackageKind::Duo);
    h.store.insert_trainer(t.clone());
    h.store.insert_customer(c.clone());

    let appointment = h
        .booking
        .book(booking_request(c.id, t.id, 9))
        .await
        .expect("booking should succeed");
    let actor = Actor::new(c.id, Role::Customer);

    h.cancellation
        .cancel(appointment.id, actor)
        .await
        .expect("first cancellation should succeed");
    let err = h
        .cancellation
        .cancel(appointment.id, actor)
        .await
        .expect_err("second cancellation must be rejected");
    assert!(matches!(err, BookingError::AlreadyCancelled));

    let balance = h.store.customer(c.id).unwrap().membership.unwrap().balance;
    assert_eq!(balance, SessionBalance::purchased(5));
}

#[tokio::test]
async fn test_customer_cannot_cancel_foreign_appointment() {
    let h = harness(24);
    let t = trainer(2, PackageKind::Duo);
    let owner = customer(5, PackageKind::Duo);
    let intruder = customer(5, PackageKind::Duo);
    h.store.insert_trainer(t.clone());
    h.store.insert_customer(owner.clone());
    h.store.insert_customer(intruder.clone());

    let appointment = h
        .booking
        .book(booking_request(owner.id, t.id, 9))
        .await
        .expect("booking should succeed");

    let err = h
        .cancellation
        .cancel(appointment.id, Actor::new(intruder.id, Role::Customer))
        .await
        .expect_err("foreign cancellation must be rejected");
    assert!(matches!(err, BookingError::NotFound(_)));

    // Admins may cancel anyone's appointment.
    h.cancellation
        .cancel(appointment.id, Actor::new(Uuid::new_v4(), Role::Admin))
        .await
        .expect("admin cancellation should succeed");
}

#[tokio::test]
async fn test_booked_slot_disappears_from_availability() {
    let h = harness(24);
    let t = trainer(1, PackageKind::Solo);
    let c = customer(5, PackageKind::Solo);
    h.store.insert_trainer(t.clone());
    h.store.insert_customer(c.clone());

    let before = h
        .resolver
        .resolve_on(monday(), ServiceType::Boxing, DOWNTOWN, Some(c.id))
        .await
        .expect("resolve should succeed");
    assert_eq!(before.trainers.len(), 1);
    assert_eq!(
        before.trainers[0].open_times,
        vec![label(9), label(10), label(11)]
    );
    assert_eq!(before.trainers[0].day, "Mon");

    h.booking
        .book(booking_request(c.id, t.id, 10))
        .await
        .expect("booking should succeed");

    let after = h
        .resolver
        .resolve_on(monday(), ServiceType::Boxing, DOWNTOWN, Some(c.id))
        .await
        .expect("resolve should succeed");
    assert_eq!(after.trainers[0].open_times, vec![label(9), label(11)]);
}

#[tokio::test]
async fn test_availability_filters_by_entitled_package_kind() {
    let h = harness(24);
    let solo_trainer = trainer(1, PackageKind::Solo);
    let duo_trainer = trainer(2, PackageKind::Duo);
    let c = customer(5, PackageKind::Solo);
    h.store.insert_trainer(solo_trainer.clone());
    h.store.insert_trainer(duo_trainer);
    h.store.insert_customer(c.clone());

    let result = h
        .resolver
        .resolve_on(monday(), ServiceType::Boxing, DOWNTOWN, Some(c.id))
        .await
        .expect("resolve should succeed");
    assert_eq!(result.trainers.len(), 1);
    assert_eq!(result.trainers[0].trainer_id, solo_trainer.id);

    // Without a requesting customer both trainers are visible.
    let unfiltered = h
        .resolver
        .resolve_on(monday(), ServiceType::Boxing, DOWNTOWN, None)
        .await
        .expect("resolve should succeed");
    assert_eq!(unfiltered.trainers.len(), 2);
}

#[tokio::test]
async fn test_availability_skips_days_without_template() {
    let h = harness(24);
    let t = trainer(1, PackageKind::Solo);
    h.store.insert_trainer(t);

    // 2024-06-11 is a Tuesday; the template only declares Monday hours.
    let tuesday = NaiveDate::from_ymd_opt(2024, 6, 11).unwrap();
    let result = h
        .resolver
        .resolve_on(tuesday, ServiceType::Boxing, DOWNTOWN, None)
        .await
        .expect("resolve should succeed");
    assert!(result.trainers.is_empty());
}

#[tokio::test]
async fn test_zero_capacity_trainer_has_no_open_slots() {
    let h = harness(24);
    let t = trainer(0, PackageKind::Solo);
    h.store.insert_trainer(t);

    let result = h
        .resolver
        .resolve_on(monday(), ServiceType::Boxing, DOWNTOWN, None)
        .await
        .expect("resolve should succeed");
    assert_eq!(result.trainers.len(), 1);
    assert!(result.trainers[0].open_times.is_empty());
}

#[tokio::test]
async fn test_resolver_normalizes_instant_with_fixed_offset() {
    let store = Arc::new(MemoryStore::new());
    let t = trainer(1, PackageKind::Solo);
    store.insert_trainer(t);
    let resolver = AvailabilityResolver::new(store, 3);

    // 22:00 UTC on Sunday is already Monday at UTC+3.
    let at = Utc.with_ymd_and_hms(2024, 6, 9, 22, 0, 0).unwrap();
    let result = resolver
        .resolve_at(at, ServiceType::Boxing, DOWNTOWN, None)
        .await
        .expect("resolve should succeed");
    assert_eq!(result.date, monday());
    assert_eq!(result.trainers.len(), 1);
}

#[tokio::test]
async fn test_concurrent_bookings_never_exceed_capacity() {
    let h = harness(24);
    let t = trainer(2, PackageKind::Group);
    h.store.insert_trainer(t.clone());

    let customers: Vec<_> = (0..8).map(|_| customer(5, PackageKind::Group)).collect();
    for c in &customers {
        h.store.insert_customer(c.clone());
    }

    let booking = Arc::new(BookingEngine::new(h.store.clone(), h.clock.clone()));

    let mut handles = Vec::new();
    for c in &customers {
        let booking = booking.clone();
        let request = booking_request(c.id, t.id, 9);
        handles.push(tokio::spawn(async move { booking.book(request).await }));
    }

    let mut successes = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.expect("task must not panic") {
            Ok(_) => successes += 1,
            Err(BookingError::Conflict(_)) => conflicts += 1,
            Err(other) => panic!("unexpected rejection: {other}"),
        }
    }
    assert_eq!(successes, 2);
    assert_eq!(conflicts, 6);

    let counts = h
        .store
        .confirmed_counts(t.id, monday(), DOWNTOWN)
        .await
        .unwrap();
    assert_eq!(counts.get(&label(9)).copied(), Some(2));
}

#[tokio::test]
async fn test_balance_conservation_across_book_cancel_cycles() {
    let h = harness(0);
    let t = trainer(3, PackageKind::Trio);
    let c = customer(3, PackageKind::Trio);
    h.store.insert_trainer(t.clone());
    h.store.insert_customer(c.clone());
    let actor = Actor::new(c.id, Role::Customer);

    for hour in [9, 10, 11] {
        let appointment = h
            .booking
            .book(booking_request(c.id, t.id, hour))
            .await
            .expect("booking should succeed");
        let balance = h.store.customer(c.id).unwrap().membership.unwrap().balance;
        assert_eq!(balance.consumed + balance.remaining, balance.total);

        h.cancellation
            .cancel(appointment.id, actor)
            .await
            .expect("cancellation should succeed");
        let balance = h.store.customer(c.id).unwrap().membership.unwrap().balance;
        assert_eq!(balance.consumed + balance.remaining, balance.total);
    }

    let balance = h.store.customer(c.id).unwrap().membership.unwrap().balance;
    assert_eq!(balance, SessionBalance::purchased(3));
}
