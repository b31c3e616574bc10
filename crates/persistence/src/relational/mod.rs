//! Relational adapter (SeaORM).

pub mod compiler;
pub mod db;
pub mod entities;
pub mod field_map;
pub mod migrations;
pub mod repository;
pub mod uow;

pub use db::Database;
pub use field_map::{FieldMap, RelationalEntity};
pub use migrations::Migrator;
pub use repository::RelationalRepository;
pub use uow::{RelationalTx, RelationalUnitOfWork};
