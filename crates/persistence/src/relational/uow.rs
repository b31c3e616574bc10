//! Relational unit of work.
//!
//! `begin` opens a native transaction and parks it in a [`RelationalTx`]
//! shared through the returned context. Statements issued with that context
//! run on the transaction's connection one at a time.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tokio::sync::{Mutex, MutexGuard};

use common::{AppError, AppResult};

use crate::ports::{RepoCapabilities, RepoCtx, TransactionCtx, UnitOfWork};

pub(crate) enum TxSlot {
    Active(DatabaseTransaction),
    Committed,
    RolledBack,
}

impl TxSlot {
    pub(crate) fn transaction(&self) -> AppResult<&DatabaseTransaction> {
        match self {
            TxSlot::Active(txn) => Ok(txn),
            TxSlot::Committed => Err(AppError::transaction("transaction already committed")),
            TxSlot::RolledBack => Err(AppError::transaction("transaction already rolled back")),
        }
    }
}

/// Transaction handle carried by a [`RepoCtx`].
pub struct RelationalTx {
    slot: Mutex<TxSlot>,
}

impl RelationalTx {
    fn new(txn: DatabaseTransaction) -> Self {
        Self {
            slot: Mutex::new(TxSlot::Active(txn)),
        }
    }

    /// The relational transaction of `ctx`, if any. A document transaction is an error.
    pub(crate) fn from_ctx(ctx: &RepoCtx) -> AppResult<Option<&Arc<RelationalTx>>> {
        match ctx.transaction() {
            None => Ok(None),
            Some(TransactionCtx::Relational(tx)) => Ok(Some(tx)),
            Some(TransactionCtx::Document(_)) => Err(AppError::transaction(
                "document transaction passed to the relational store",
            )),
        }
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, TxSlot> {
        self.slot.lock().await
    }

    async fn commit(&self) -> AppResult<()> {
        let mut slot = self.slot.lock().await;
        match std::mem::replace(&mut *slot, TxSlot::RolledBack) {
            TxSlot::Active(txn) => {
                txn.commit().await.map_err(AppError::from)?;
                *slot = TxSlot::Committed;
                Ok(())
            }
            finished => {
                *slot = finished;
                Err(AppError::transaction("transaction is not active"))
            }
        }
    }

    async fn rollback(&self) -> AppResult<()> {
        let mut slot = self.slot.lock().await;
        match std::mem::replace(&mut *slot, TxSlot::RolledBack) {
            TxSlot::Active(txn) => txn.rollback().await.map_err(AppError::from),
            finished => {
                *slot = finished;
                Err(AppError::transaction("transaction is not active"))
            }
        }
    }
}

/// Unit of work over a SeaORM connection pool.
pub struct RelationalUnitOfWork {
    db: DatabaseConnection,
}

impl RelationalUnitOfWork {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn tx(ctx: &RepoCtx) -> AppResult<&Arc<RelationalTx>> {
        RelationalTx::from_ctx(ctx)?
            .ok_or_else(|| AppError::transaction("context carries no transaction"))
    }
}

#[async_trait]
impl UnitOfWork for RelationalUnitOfWork {
    fn capabilities(&self) -> RepoCapabilities {
        RepoCapabilities::RELATIONAL
    }

    async fn begin(&self) -> AppResult<RepoCtx> {
        let txn = self.db.begin().await.map_err(AppError::from)?;
        tracing::debug!("Relational transaction started");
        Ok(RepoCtx::with_transaction(TransactionCtx::Relational(
            Arc::new(RelationalTx::new(txn)),
        )))
    }

    async fn commit(&self, ctx: &RepoCtx) -> AppResult<()> {
        Self::tx(ctx)?.commit().await?;
        tracing::debug!("Relational transaction committed");
        Ok(())
    }

    async fn rollback(&self, ctx: &RepoCtx) -> AppResult<()> {
        Self::tx(ctx)?.rollback().await?;
        tracing::debug!("Relational transaction rolled back");
        Ok(())
    }
}
