//! Stores

pub mod records;
