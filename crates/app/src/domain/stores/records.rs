//! Store Records

use crate::uuids::TypedUuid;

/// Store (tenant) UUID. Every coupon, promotion and order belongs to exactly one store.
pub type StoreUuid = TypedUuid<StoreRecord>;

/// Store Record
#[derive(Debug, Clone)]
pub struct StoreRecord {
    pub uuid: StoreUuid,
}
