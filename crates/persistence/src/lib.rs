//! Storage-agnostic repository layer.
//!
//! Services talk to [`ports::BaseRepository`] and [`ports::UnitOfWork`] and
//! describe queries with the [`query`] DSL. Two adapters implement the ports:
//! [`relational`] (SeaORM) and [`document`] (SurrealDB). [`factory`] picks one
//! from configuration.

pub mod document;
pub mod factory;
pub mod mappers;
pub mod ports;
pub mod query;
pub mod relational;
pub mod schema;

pub use factory::Repositories;
pub use ports::{BaseRepository, DeleteOptions, RepoCapabilities, RepoCtx, UnitOfWork};
pub use query::{
    CursorDirection, FieldFilter, Filter, OrderBy, Page, Pagination, QueryOptions, SortDirection,
    Specification, Value,
};
pub use schema::{FieldDef, FieldKind, Persistable};

#[cfg(any(test, feature = "test-utils"))]
pub use ports::{MockBaseRepository, MockUnitOfWork};
