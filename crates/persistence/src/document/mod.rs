//! SurrealDB document-store adapter.
//!
//! Capability gaps compared to the relational adapter: no offset pagination,
//! no substring search, no soft deletes. Paging is keyset based, driven by the
//! id of the last document of the previous page.

mod client;
pub mod codec;
pub mod compiler;
pub mod records;
mod repository;
mod schema;
#[cfg(test)]
mod tagged;
mod uow;

pub use client::{connect, ping, SurrealClient};
pub use repository::DocumentRepository;
pub use schema::init_schema;
pub use uow::{DocumentTx, DocumentUnitOfWork};
