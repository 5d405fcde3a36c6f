//! Usage caps

use serde::{Deserialize, Serialize};

use crate::validation::ValidationError;

/// Limits on how often a discount may be redeemed. `None` means unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCap {
    /// Total redemptions across all customers.
    #[serde(default)]
    pub max_uses: Option<u64>,

    /// Redemptions allowed per customer.
    #[serde(default)]
    pub uses_per_customer: Option<u64>,
}

impl UsageCap {
    /// No limits.
    pub const fn unlimited() -> Self {
        Self {
            max_uses: None,
            uses_per_customer: None,
        }
    }

    /// Whether `uses` redemptions have consumed the total cap.
    pub fn is_exhausted(&self, uses: u64) -> bool {
        self.max_uses.is_some_and(|max| uses >= max)
    }

    /// Whether a customer with `uses` redemptions has reached their own cap.
    pub fn customer_limit_reached(&self, uses: u64) -> bool {
        self.uses_per_customer.is_some_and(|max| uses >= max)
    }

    /// Redemptions left under the total cap, if capped.
    pub fn remaining(&self, uses: u64) -> Option<u64> {
        self.max_uses.map(|max| max.saturating_sub(uses))
    }

    /// Check both caps are non-zero when present.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ZeroUsageCap`] when either cap is `Some(0)`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_uses == Some(0) || self.uses_per_customer == Some(0) {
            return Err(ValidationError::ZeroUsageCap);
        }

        Ok(())
    }
}

/// The usage count to trust: the live order count when it is available, the cached counter
/// stored on the record otherwise.
pub fn effective_uses(live: Option<u64>, cached: u64) -> u64 {
    live.unwrap_or(cached)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_cap_is_never_exhausted() {
        let cap = UsageCap::unlimited();

        assert!(!cap.is_exhausted(u64::MAX));
        assert!(!cap.customer_limit_reached(u64::MAX));
        assert_eq!(cap.remaining(10), None);
    }

    #[test]
    fn exhausted_at_and_beyond_max_uses() {
        let cap = UsageCap {
            max_uses: Some(3),
            uses_per_customer: None,
        };

        assert!(!cap.is_exhausted(2));
        assert!(cap.is_exhausted(3));
        assert!(cap.is_exhausted(4));
        assert_eq!(cap.remaining(5), Some(0));
    }

    #[test]
    fn live_count_preferred_over_cached() {
        assert_eq!(effective_uses(Some(7), 2), 7);
        assert_eq!(effective_uses(None, 2), 2);
    }

    #[test]
    fn zero_caps_are_rejected() {
        let cap = UsageCap {
            max_uses: None,
            uses_per_customer: Some(0),
        };

        assert_eq!(cap.validate(), Err(ValidationError::ZeroUsageCap));
    }
}
