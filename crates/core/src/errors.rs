use thiserror::Error;

/// Rejection taxonomy for the booking engine. Every precondition
/// failure is a typed variant; only genuine storage failures travel
/// in the opaque `Database` variant.
#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Slot conflict: {0}")]
    Conflict(String),

    #[error("Membership is missing or expired")]
    MembershipExpired,

    #[error("No sessions left on membership")]
    NoSessionsLeft,

    #[error("Too late to cancel: {hours_until}h before appointment, minimum notice is {min_notice_hours}h")]
    TooLate {
        hours_until: i64,
        min_notice_hours: i64,
    },

    #[error("Appointment is already cancelled")]
    AlreadyCancelled,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Transient storage contention")]
    StorageContention,

    #[error("Database error: {0}")]
    Database(#[from] eyre::Report),
}

pub type BookingResult<T> = Result<T, BookingError>;
