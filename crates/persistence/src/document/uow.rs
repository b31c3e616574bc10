//! Document unit of work.
//!
//! Writes issued with a transaction context are buffered in the [`DocumentTx`]
//! and sent on commit as a single `BEGIN TRANSACTION ... COMMIT TRANSACTION`
//! query, so either all of them land or none do. Point reads through the same
//! context see the buffered state; queries see committed data only.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use common::{AppError, AppResult};

use super::client::SurrealClient;
use super::compiler::Binds;
use crate::ports::{RepoCapabilities, RepoCtx, TransactionCtx, UnitOfWork};

pub(crate) type Doc = serde_json::Map<String, serde_json::Value>;

/// One buffered write.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum WriteOp {
    /// Create-only; fails if the record exists
    Create { table: &'static str, id: String, data: Doc },
    /// Create or overwrite the whole record
    Replace { table: &'static str, id: String, data: Doc },
    /// Create or merge into the record
    Merge { table: &'static str, id: String, data: Doc },
    /// Merge into an existing record
    Update { table: &'static str, id: String, data: Doc },
    Delete { table: &'static str, id: String },
}

impl WriteOp {
    pub(crate) fn table(&self) -> &'static str {
        match self {
            WriteOp::Create { table, .. }
            | WriteOp::Replace { table, .. }
            | WriteOp::Merge { table, .. }
            | WriteOp::Update { table, .. }
            | WriteOp::Delete { table, .. } => table,
        }
    }

    /// SurrealQL statement for this write; its bindings are suffixed with `n`.
    fn statement(&self, n: usize, binds: &mut Binds) -> String {
        let (table, id, data) = match self {
            WriteOp::Create { table, id, data }
            | WriteOp::Replace { table, id, data }
            | WriteOp::Merge { table, id, data }
            | WriteOp::Update { table, id, data } => (table, id, Some(data)),
            WriteOp::Delete { table, id } => (table, id, None),
        };

        binds.insert(format!("tb_{}", n), serde_json::Value::from(*table));
        binds.insert(format!("id_{}", n), serde_json::Value::from(id.as_str()));
        if let Some(data) = data {
            binds.insert(format!("data_{}", n), serde_json::Value::Object(data.clone()));
        }

        let target = format!("type::thing($tb_{n}, $id_{n})");
        match self {
            WriteOp::Create { .. } => format!("CREATE {} CONTENT $data_{}", target, n),
            WriteOp::Replace { .. } => format!("UPSERT {} CONTENT $data_{}", target, n),
            WriteOp::Merge { .. } => format!("UPSERT {} MERGE $data_{}", target, n),
            WriteOp::Update { .. } => format!("UPDATE {} MERGE $data_{}", target, n),
            WriteOp::Delete { .. } => format!("DELETE {}", target),
        }
    }
}

/// Render `ops` as one query, wrapped in a transaction when there is more than one.
pub(crate) fn render(ops: &[WriteOp]) -> (String, Binds) {
    let mut binds = Binds::new();
    let statements: Vec<_> = ops
        .iter()
        .enumerate()
        .map(|(n, op)| op.statement(n, &mut binds))
        .collect();

    let sql = if statements.len() == 1 {
        statements.join("")
    } else {
        format!(
            "BEGIN TRANSACTION;\n{};\nCOMMIT TRANSACTION;",
            statements.join(";\n")
        )
    };
    (sql, binds)
}

/// Execute writes as one atomic query.
pub(crate) async fn apply(client: &SurrealClient, ops: &[WriteOp]) -> AppResult<()> {
    if ops.is_empty() {
        return Ok(());
    }

    let (sql, binds) = render(ops);
    tracing::debug!(statements = ops.len(), sql = %sql, "Applying document writes");

    let label = match ops {
        [op] => format!("A record in {}", op.table()),
        _ => "A record".to_string(),
    };
    let response = client.query(sql).bind(binds).await?;
    check(response, &label)?;
    Ok(())
}

/// Surface the first statement error of a response.
///
/// Inside a failed transaction every statement reports an error; the one that
/// caused the failure is preferred over the "not executed" ones.
pub(crate) fn check(mut response: surrealdb::Response, label: &str) -> AppResult<surrealdb::Response> {
    let mut errors: Vec<_> = response.take_errors().into_iter().collect();
    if errors.is_empty() {
        return Ok(response);
    }

    errors.sort_by_key(|(index, _)| *index);
    let root = errors
        .iter()
        .position(|(_, e)| !e.to_string().contains("failed transaction"))
        .unwrap_or(0);
    let (_, error) = errors.swap_remove(root);
    Err(store_error(error, label))
}

/// Map a store error; duplicate keys become `Conflict`.
pub(crate) fn store_error(error: surrealdb::Error, label: &str) -> AppError {
    let text = error.to_string();
    if text.contains("already exists") || text.contains("already contains") {
        tracing::debug!(error = %text, "Document write conflict");
        AppError::conflict(label)
    } else {
        AppError::from(error)
    }
}

#[derive(Default)]
pub(crate) struct Pending {
    ops: Vec<WriteOp>,
    /// Record state after the buffered writes; `None` once deleted
    staged: HashMap<(&'static str, String), Option<Doc>>,
}

enum TxState {
    Active(Pending),
    Committed,
    RolledBack,
}

/// Transaction handle carried by a [`RepoCtx`].
pub struct DocumentTx {
    state: Mutex<TxState>,
}

impl DocumentTx {
    fn new() -> Self {
        Self {
            state: Mutex::new(TxState::Active(Pending::default())),
        }
    }

    /// The document transaction of `ctx`, if any. A relational transaction is an error.
    pub(crate) fn from_ctx(ctx: &RepoCtx) -> AppResult<Option<&Arc<DocumentTx>>> {
        match ctx.transaction() {
            None => Ok(None),
            Some(TransactionCtx::Document(tx)) => Ok(Some(tx)),
            Some(TransactionCtx::Relational(_)) => Err(AppError::transaction(
                "relational transaction passed to the document store",
            )),
        }
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, TxState>> {
        self.state
            .lock()
            .map_err(|_| AppError::transaction("transaction state poisoned"))
    }

    fn with_pending<R>(&self, f: impl FnOnce(&mut Pending) -> R) -> AppResult<R> {
        match &mut *self.lock()? {
            TxState::Active(pending) => Ok(f(pending)),
            TxState::Committed => Err(AppError::transaction("transaction already committed")),
            TxState::RolledBack => Err(AppError::transaction("transaction already rolled back")),
        }
    }

    /// Buffer a write and the record state it leaves behind.
    pub(crate) fn stage(&self, op: WriteOp, after: Option<Doc>) -> AppResult<()> {
        let key = match &op {
            WriteOp::Create { table, id, .. }
            | WriteOp::Replace { table, id, .. }
            | WriteOp::Merge { table, id, .. }
            | WriteOp::Update { table, id, .. }
            | WriteOp::Delete { table, id } => (*table, id.clone()),
        };
        self.with_pending(|pending| {
            pending.ops.push(op);
            pending.staged.insert(key, after);
        })
    }

    /// Buffered state of a record: `None` if untouched, `Some(None)` if deleted.
    pub(crate) fn staged(&self, table: &'static str, id: &str) -> AppResult<Option<Option<Doc>>> {
        self.with_pending(|pending| pending.staged.get(&(table, id.to_string())).cloned())
    }

    #[cfg(test)]
    pub(crate) fn pending_ops(&self) -> AppResult<Vec<WriteOp>> {
        self.with_pending(|pending| pending.ops.clone())
    }

    async fn commit(&self, client: &SurrealClient) -> AppResult<()> {
        let ops = {
            let mut state = self.lock()?;
            match std::mem::replace(&mut *state, TxState::Committed) {
                TxState::Active(pending) => pending.ops,
                finished => {
                    *state = finished;
                    return Err(AppError::transaction("transaction is not active"));
                }
            }
        };

        if let Err(e) = apply(client, &ops).await {
            *self.lock()? = TxState::RolledBack;
            return Err(e);
        }
        Ok(())
    }

    fn rollback(&self) -> AppResult<()> {
        let mut state = self.lock()?;
        match std::mem::replace(&mut *state, TxState::RolledBack) {
            TxState::Active(pending) => {
                tracing::debug!(discarded = pending.ops.len(), "Discarding buffered writes");
                Ok(())
            }
            finished => {
                *state = finished;
                Err(AppError::transaction("transaction is not active"))
            }
        }
    }
}

/// Unit of work over a SurrealDB client.
pub struct DocumentUnitOfWork {
    client: SurrealClient,
}

impl DocumentUnitOfWork {
    pub fn new(client: SurrealClient) -> Self {
        Self { client }
    }

    fn tx(ctx: &RepoCtx) -> AppResult<&Arc<DocumentTx>> {
        DocumentTx::from_ctx(ctx)?
            .ok_or_else(|| AppError::transaction("context carries no transaction"))
    }
}

#[async_trait]
impl UnitOfWork for DocumentUnitOfWork {
    fn capabilities(&self) -> RepoCapabilities {
        RepoCapabilities::DOCUMENT
    }

    async fn begin(&self) -> AppResult<RepoCtx> {
        tracing::debug!("Document transaction started");
        Ok(RepoCtx::with_transaction(TransactionCtx::Document(Arc::new(
            DocumentTx::new(),
        ))))
    }

    async fn commit(&self, ctx: &RepoCtx) -> AppResult<()> {
        Self::tx(ctx)?.commit(&self.client).await?;
        tracing::debug!("Document transaction committed");
        Ok(())
    }

    async fn rollback(&self, ctx: &RepoCtx) -> AppResult<()> {
        Self::tx(ctx)?.rollback()?;
        tracing::debug!("Document transaction rolled back");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Doc {
        match value {
            serde_json::Value::Object(map) => map,
            _ => Doc::new(),
        }
    }

    #[test]
    fn single_write_is_not_wrapped() {
        let (sql, binds) = render(&[WriteOp::Delete {
            table: "messages",
            id: "m1".to_string(),
        }]);
        assert_eq!(sql, "DELETE type::thing($tb_0, $id_0)");
        assert_eq!(binds["tb_0"], json!("messages"));
        assert_eq!(binds["id_0"], json!("m1"));
    }

    #[test]
    fn several_writes_form_one_transaction() {
        let (sql, binds) = render(&[
            WriteOp::Create {
                table: "confirmations",
                id: "c1".to_string(),
                data: doc(json!({ "rut": "1" })),
            },
            WriteOp::Update {
                table: "messages",
                id: "m1".to_string(),
                data: doc(json!({ "status": "READ" })),
            },
        ]);
        assert_eq!(
            sql,
            "BEGIN TRANSACTION;\n\
             CREATE type::thing($tb_0, $id_0) CONTENT $data_0;\n\
             UPDATE type::thing($tb_1, $id_1) MERGE $data_1;\n\
             COMMIT TRANSACTION;"
        );
        assert_eq!(binds["data_1"], json!({ "status": "READ" }));
        assert_eq!(binds.len(), 6);
    }

    #[test]
    fn staged_state_tracks_the_last_write() {
        let tx = DocumentTx::new();
        tx.stage(
            WriteOp::Create {
                table: "people",
                id: "p1".to_string(),
                data: doc(json!({ "name": "Ana" })),
            },
            Some(doc(json!({ "name": "Ana" }))),
        )
        .unwrap();
        assert_eq!(
            tx.staged("people", "p1").unwrap(),
            Some(Some(doc(json!({ "name": "Ana" }))))
        );

        tx.stage(
            WriteOp::Delete {
                table: "people",
                id: "p1".to_string(),
            },
            None,
        )
        .unwrap();
        assert_eq!(tx.staged("people", "p1").unwrap(), Some(None));
        assert_eq!(tx.staged("people", "p2").unwrap(), None);
        assert_eq!(tx.pending_ops().unwrap().len(), 2);
    }

    #[test]
    fn finished_transaction_rejects_writes() {
        let tx = DocumentTx::new();
        tx.rollback().unwrap();
        let err = tx
            .stage(
                WriteOp::Delete {
                    table: "people",
                    id: "p1".to_string(),
                },
                None,
            )
            .unwrap_err();
        assert!(matches!(err, AppError::Transaction(_)));
        assert!(tx.rollback().is_err());
    }

    #[test]
    fn default_context_has_no_document_transaction() {
        assert!(DocumentTx::from_ctx(&RepoCtx::default()).unwrap().is_none());
    }
}
