//! Repository ports.
//!
//! Services depend on these traits only; the relational and document adapters
//! implement them and the factory decides which one is wired in.

mod context;
mod unit_of_work;

pub use context::{RepoCtx, TransactionCtx};
pub use unit_of_work::UnitOfWork;
#[cfg(any(test, feature = "test-utils"))]
pub use unit_of_work::MockUnitOfWork;

use async_trait::async_trait;
use common::AppResult;

use crate::query::{Page, QueryOptions};
use crate::schema::Persistable;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Features an adapter honours. Consumers may check these before building
/// queries that depend on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepoCapabilities {
    pub offset_pagination: bool,
    pub cursor_pagination: bool,
    /// `contains` / `endsWith` on text fields
    pub text_search_like: bool,
    pub array_contains: bool,
    pub transactions: bool,
    pub soft_delete: bool,
}

impl RepoCapabilities {
    pub const RELATIONAL: Self = Self {
        offset_pagination: true,
        cursor_pagination: false,
        text_search_like: true,
        array_contains: false,
        transactions: true,
        soft_delete: true,
    };

    pub const DOCUMENT: Self = Self {
        offset_pagination: false,
        cursor_pagination: true,
        text_search_like: false,
        array_contains: true,
        transactions: true,
        soft_delete: false,
    };
}

/// Options of [`BaseRepository::delete`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    /// Remove the record even when the entity supports soft deletes
    pub hard: bool,
}

impl DeleteOptions {
    pub fn hard() -> Self {
        Self { hard: true }
    }

    pub fn soft() -> Self {
        Self { hard: false }
    }
}

/// Storage-agnostic CRUD and query contract for one entity type.
///
/// Every call takes a [`RepoCtx`]; pass `&RepoCtx::default()` outside of a
/// unit of work.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait BaseRepository<D: Persistable>: Send + Sync {
    fn capabilities(&self) -> RepoCapabilities;

    /// Insert a new record. An empty id is replaced by a generated one.
    async fn create(&self, entity: D, ctx: &RepoCtx) -> AppResult<D>;

    /// Insert with a caller-chosen id.
    async fn create_with_id(&self, id: &str, entity: D, ctx: &RepoCtx) -> AppResult<D>;

    /// Create or update by id. Fields left null keep their stored value.
    async fn upsert(&self, id: &str, entity: D, ctx: &RepoCtx) -> AppResult<D>;

    async fn find_by_id(&self, id: &str, ctx: &RepoCtx) -> AppResult<Option<D>>;

    /// First record under the requested order.
    async fn find_one(&self, options: QueryOptions, ctx: &RepoCtx) -> AppResult<Option<D>>;

    async fn find_many(&self, options: QueryOptions, ctx: &RepoCtx) -> AppResult<Page<D>>;

    /// Apply a patch and return the stored record; `NotFound` when the id is unknown.
    async fn update(&self, id: &str, patch: D::Patch, ctx: &RepoCtx) -> AppResult<D>;

    /// Delete by id. A missing id is not an error.
    async fn delete(&self, id: &str, options: DeleteOptions, ctx: &RepoCtx) -> AppResult<()>;
}
