//! Shopifree discount engine.
//!
//! Lifecycle status derivation, usage-cap accounting, promotion conflict resolution and
//! coupon code handling for a store's coupons and promotions. Everything in this crate is
//! pure: time comes from a [`Clock`](clock::Clock), usage counts are supplied by the caller.

pub mod clock;
pub mod coupons;
pub mod discounts;
pub mod prelude;
pub mod promotions;
pub mod status;
pub mod usage;
pub mod validation;
pub mod window;
