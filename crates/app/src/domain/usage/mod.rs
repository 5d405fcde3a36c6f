//! Usage
//!
//! Live redemption counts derived from a store's completed orders. Counts are point-in-time
//! queries and nothing reserves a redemption, so concurrent checkouts can push a discount past
//! its cap between a count and the order being written.

mod counter;
mod errors;

pub use counter::*;
pub use errors::UsageError;
