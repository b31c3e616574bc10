//! Unit of Work port.
//!
//! `begin` hands out a [`RepoCtx`]; repository calls that receive it join the
//! transaction, calls that receive `RepoCtx::default()` do not.

use async_trait::async_trait;
use futures::future::BoxFuture;

use common::AppResult;

use super::{RepoCapabilities, RepoCtx};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    fn capabilities(&self) -> RepoCapabilities;

    /// Start a transaction.
    async fn begin(&self) -> AppResult<RepoCtx>;

    async fn commit(&self, ctx: &RepoCtx) -> AppResult<()>;

    async fn rollback(&self, ctx: &RepoCtx) -> AppResult<()>;
}

impl dyn UnitOfWork {
    /// Run `work` inside a transaction.
    ///
    /// Commits when `work` succeeds; rolls back and returns the original error
    /// when it fails. A failing rollback is logged, never returned.
    pub async fn run_in_transaction<T, F>(&self, work: F) -> AppResult<T>
    where
        F: FnOnce(RepoCtx) -> BoxFuture<'static, AppResult<T>> + Send,
        T: Send,
    {
        let ctx = self.begin().await?;

        match work(ctx.clone()).await {
            Ok(result) => {
                self.commit(&ctx).await?;
                Ok(result)
            }
            Err(e) => {
                if let Err(rollback_err) = self.rollback(&ctx).await {
                    tracing::error!("Transaction rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }
}

/// Run a block inside [`UnitOfWork::run_in_transaction`].
///
/// ```ignore
/// let saved = with_transaction!(uow, |ctx| {
///     let c = confirmations.create(confirmation, &ctx).await?;
///     messages.create(message, &ctx).await?;
///     Ok(c)
/// })?;
/// ```
#[macro_export]
macro_rules! with_transaction {
    ($uow:expr, |$ctx:ident| $body:expr) => {
        $uow.run_in_transaction(|$ctx| Box::pin(async move { $body }))
            .await
    };
}
