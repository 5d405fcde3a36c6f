//! Coupons

pub mod data;
mod errors;
pub mod records;
pub mod service;

pub use errors::CouponsServiceError;
pub use service::*;
