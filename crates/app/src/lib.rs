//! Shopifree dashboard services: coupons, promotions and the document store behind them.

pub mod context;
pub mod database;
pub mod documents;
pub mod domain;

#[cfg(test)]
mod test;
mod uuids;

pub use uuids::TypedUuid;
