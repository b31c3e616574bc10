//! Conversions between domain entities and storage-native records.
//!
//! One stateless mapper per entity and backend. Mappers are the only place
//! where storage representations (column types, enum spellings, timestamp
//! encodings) leak into code; repositories stay generic over them.

pub mod document;
pub mod relational;

use common::AppResult;

use crate::schema::Persistable;

pub trait EntityMapper: Send + Sync + 'static {
    type Domain: Persistable;
    type Persisted: Send + Sync;

    /// Rebuild a domain entity from a stored record.
    fn to_domain(persisted: Self::Persisted) -> AppResult<Self::Domain>;

    /// Storage representation of `domain`. Transient fields are dropped.
    fn to_persistence(domain: &Self::Domain) -> Self::Persisted;
}
