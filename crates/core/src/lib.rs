//! # Gymbook Core
//!
//! Domain models and the booking engine for the gymbook appointment
//! service: resolving which time slots are actually open for a trainer,
//! reserving a slot against a customer's session balance, and reversing
//! a reservation under the cancellation notice window.
//!
//! This crate performs no I/O. Storage is reached through the
//! [`store::BookingStore`] trait and the current instant through the
//! [`clock::Clock`] trait, so every engine can be driven with an
//! in-memory store and a fixed clock in tests.

pub mod availability;
pub mod booking;
pub mod cancellation;
pub mod clock;
pub mod errors;
pub mod models;
pub mod store;
