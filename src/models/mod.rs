//! Business entities, their validation schemas and the [`Resource`]
//! descriptors that let the generic handlers serve them.

pub mod catalog;
pub mod client;
pub mod equipment;
pub mod personnel;
pub mod profile;
pub mod schema;
pub mod service;
pub mod supplier;

use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

pub use catalog::{Brand, Brands, Categories, Category, Product, Products};
pub use client::{Client, Clients};
pub use equipment::{Equipment, EquipmentItem};
pub use personnel::{Personnel, PersonnelMembers, PersonnelPosition, PersonnelPositions, PositionView};
pub use profile::{Profile, ProfileUpdate, Role};
pub use schema::{Reference, Schema};
pub use service::{JobPosition, JobPositions, Service, Services};
pub use supplier::{Supplier, Suppliers};

/// Upper bound for every monetary field
pub const MAX_PRICE: i64 = 100_000;

/// A stored row of some entity
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn id(&self) -> Uuid;
}

/// Describes one owner-scoped REST resource.
pub trait Resource: Send + Sync + 'static {
    /// Store table
    const TABLE: &'static str;
    /// Envelope key for a single record
    const SINGULAR: &'static str;
    /// Envelope key for a list
    const PLURAL: &'static str;
    /// Used in client-facing messages
    const LABEL: &'static str;
    const ORDER_BY: &'static str = "name";
    /// Whether names must be unique per owner
    const UNIQUE_NAME: bool = true;
    /// Columns a PATCH may clear with an explicit `null`
    const NULLABLE: &'static [&'static str] = &[];
    /// `(table, column)` pairs whose rows block deleting a record
    const REFERENCED_BY: &'static [(&'static str, &'static str)] = &[];
    /// `(table, column)` pairs whose rows are deleted along with a record
    const CASCADE: &'static [(&'static str, &'static str)] = &[];

    type Record: Record;
    type Create: Schema;
    type Update: Schema;
}

/// Implements [`Record`] for structs with an `id: Uuid` field
macro_rules! impl_record {
    ($($ty:ty),* $(,)?) => {
        $(impl $crate::models::Record for $ty {
            fn id(&self) -> ::uuid::Uuid {
                self.id
            }
        })*
    };
}
pub(crate) use impl_record;
