use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{BookingError, BookingResult};

use super::trainer::PackageKind;

/// Remaining/consumed/total session counts on a membership.
///
/// `total` is the purchased session count and never changes outside a
/// membership purchase; `consumed + remaining == total` holds after
/// every mutation. Only [`debit`](Self::debit) and
/// [`credit`](Self::credit) may touch the counters, and only from
/// inside the store's atomic booking/cancellation commits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionBalance {
    pub remaining: u32,
    pub consumed: u32,
    pub total: u32,
}

impl SessionBalance {
    /// Fresh balance for a newly purchased pack of `total` sessions.
    pub fn purchased(total: u32) -> Self {
        Self {
            remaining: total,
            consumed: 0,
            total,
        }
    }

    /// Consumes one session. Fails fast with `NoSessionsLeft` when the
    /// balance is exhausted; no partial application.
    pub fn debit(&mut self) -> BookingResult<()> {
        if self.remaining == 0 {
            return Err(BookingError::NoSessionsLeft);
        }
        self.remaining -= 1;
        self.consumed += 1;
        Ok(())
    }

    /// Restores one session after a cancellation. `consumed` floors at
    /// zero so an externally perturbed ledger can never go negative.
    pub fn credit(&mut self) {
        self.remaining += 1;
        self.consumed = self.consumed.saturating_sub(1);
    }
}

/// An active membership: the entitled package tier, its validity
/// window and the depletable session balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    pub package_kind: PackageKind,
    pub price: i64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub balance: SessionBalance,
}

impl Membership {
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        at <= self.ends_at
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub membership: Option<Membership>,
}
