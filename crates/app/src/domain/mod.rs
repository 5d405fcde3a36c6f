//! Shopifree Domain Concerns

pub mod coupons;
mod persistence;
pub mod promotions;
pub mod stores;
pub mod usage;
