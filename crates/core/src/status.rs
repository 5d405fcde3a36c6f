//! Lifecycle Status
//!
//! The displayed status of a coupon or promotion is always derived from the current instant,
//! its window and its manual pause flag. Usage-cap exhaustion is reported alongside the
//! lifecycle status rather than folded into it: an exhausted discount inside its window is
//! still [`LifecycleStatus::Active`], with [`DiscountState::exhausted`] set.

use std::fmt::{Display, Formatter, Result as FmtResult};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{
    usage::{UsageCap, effective_uses},
    window::DiscountWindow,
};

/// Lifecycle status of a coupon or promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStatus {
    /// The window has not started yet.
    Scheduled,

    /// Inside the window and not paused.
    Active,

    /// The window has closed.
    Expired,

    /// Manually paused by a merchant.
    Paused,
}

impl LifecycleStatus {
    /// Stable string form, matching the serialized value.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Paused => "paused",
        }
    }
}

impl Display for LifecycleStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Derive the lifecycle status at `now`.
///
/// A manual pause wins over everything, including malformed windows. Otherwise the window
/// decides, with `no_expiration` making the stored end date irrelevant.
pub fn resolve_status(now: Timestamp, window: &DiscountWindow, paused: bool) -> LifecycleStatus {
    if paused {
        LifecycleStatus::Paused
    } else if window.is_before_start(now) {
        LifecycleStatus::Scheduled
    } else if window.no_expiration {
        LifecycleStatus::Active
    } else if now > window.ends_at {
        LifecycleStatus::Expired
    } else {
        LifecycleStatus::Active
    }
}

/// Lifecycle status together with usage-cap exhaustion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountState {
    /// Date and pause derived status.
    pub status: LifecycleStatus,

    /// Whether the total usage cap has been reached.
    pub exhausted: bool,

    /// Usage count the exhaustion flag was computed from.
    pub uses: u64,
}

impl DiscountState {
    /// Evaluate status and exhaustion for a record.
    pub fn evaluate(
        now: Timestamp,
        window: &DiscountWindow,
        paused: bool,
        cap: &UsageCap,
        uses: u64,
    ) -> Self {
        Self {
            status: resolve_status(now, window, paused),
            exhausted: cap.is_exhausted(uses),
            uses,
        }
    }

    /// Whether the discount may be applied right now.
    pub fn is_redeemable(&self) -> bool {
        self.status == LifecycleStatus::Active && !self.exhausted
    }
}

/// Behaviour shared by coupons and promotions.
pub trait DiscountRecord {
    /// The validity window.
    fn window(&self) -> &DiscountWindow;

    /// The manual pause flag, the only authoritative piece of status.
    fn is_paused(&self) -> bool;

    /// Usage limits.
    fn usage_cap(&self) -> &UsageCap;

    /// Best-effort usage counter stored on the record.
    fn cached_uses(&self) -> u64;

    /// Lifecycle status at `now`.
    fn status_at(&self, now: Timestamp) -> LifecycleStatus {
        resolve_status(now, self.window(), self.is_paused())
    }

    /// Status and exhaustion at `now`, preferring `live_uses` over the cached counter.
    fn state_at(&self, now: Timestamp, live_uses: Option<u64>) -> DiscountState {
        DiscountState::evaluate(
            now,
            self.window(),
            self.is_paused(),
            self.usage_cap(),
            effective_uses(live_uses, self.cached_uses()),
        )
    }
}
