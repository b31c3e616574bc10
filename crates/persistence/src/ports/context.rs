//! Transaction context passed to repository calls.

use std::sync::Arc;

use crate::document::DocumentTx;
use crate::relational::RelationalTx;

/// Native transaction handle of one backend.
#[derive(Clone)]
pub enum TransactionCtx {
    Relational(Arc<RelationalTx>),
    Document(Arc<DocumentTx>),
}

impl std::fmt::Debug for TransactionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionCtx::Relational(_) => f.write_str("TransactionCtx::Relational"),
            TransactionCtx::Document(_) => f.write_str("TransactionCtx::Document"),
        }
    }
}

/// Immutable per-call context.
///
/// The default value runs on the adapter's own connection. Contexts returned by
/// [`UnitOfWork::begin`](super::UnitOfWork::begin) route every call that receives
/// them into the same transaction.
#[derive(Debug, Clone, Default)]
pub struct RepoCtx {
    tx: Option<TransactionCtx>,
}

impl RepoCtx {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transaction(tx: TransactionCtx) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn transaction(&self) -> Option<&TransactionCtx> {
        self.tx.as_ref()
    }

    pub fn in_transaction(&self) -> bool {
        self.tx.is_some()
    }
}
