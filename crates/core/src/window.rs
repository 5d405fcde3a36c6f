//! Discount Windows

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::validation::ValidationError;

/// `2099-12-31T23:59:59Z`, stored as the end date of open-ended windows.
pub const NO_EXPIRATION_SENTINEL: Timestamp = Timestamp::constant(4_102_444_799, 0);

/// The period during which a coupon or promotion may be used.
///
/// When `no_expiration` is set the stored `ends_at` is ignored for expiry purposes, however
/// far in the past or future it lies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountWindow {
    /// First instant at which the discount is live.
    pub starts_at: Timestamp,

    /// Last instant at which the discount is live.
    pub ends_at: Timestamp,

    /// Whether the window never closes.
    #[serde(default)]
    pub no_expiration: bool,
}

impl DiscountWindow {
    /// A window closing at `ends_at`.
    pub const fn bounded(starts_at: Timestamp, ends_at: Timestamp) -> Self {
        Self {
            starts_at,
            ends_at,
            no_expiration: false,
        }
    }

    /// A window that never closes, with the sentinel end date.
    pub const fn open_ended(starts_at: Timestamp) -> Self {
        Self {
            starts_at,
            ends_at: NO_EXPIRATION_SENTINEL,
            no_expiration: true,
        }
    }

    /// Whether `now` has not yet reached the start of the window.
    pub fn is_before_start(&self, now: Timestamp) -> bool {
        now < self.starts_at
    }

    /// Whether `now` lies past the end of the window.
    pub fn is_past_end(&self, now: Timestamp) -> bool {
        !self.no_expiration && now > self.ends_at
    }

    /// Whether `now` lies within the window, both ends inclusive.
    pub fn contains(&self, now: Timestamp) -> bool {
        !self.is_before_start(now) && !self.is_past_end(now)
    }

    /// Check that the window is well-formed.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::StartsAfterEnds`] when a bounded window ends before it starts.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.no_expiration && self.starts_at > self.ends_at {
            return Err(ValidationError::StartsAfterEnds {
                starts_at: self.starts_at,
                ends_at: self.ends_at,
            });
        }

        Ok(())
    }
}
