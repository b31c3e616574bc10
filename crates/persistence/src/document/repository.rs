//! Generic SurrealDB-backed repository.
//!
//! Records live in one table per entity, keyed by `type::thing(table, id)`.
//! Queries list every schema field explicitly and read the key back through
//! `record::id(id)`, so stored shapes deserialize straight into the mapper's
//! document type.

use std::marker::PhantomData;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use common::{AppError, AppResult};

use super::client::SurrealClient;
use super::codec::encode_field;
use super::compiler::{field_expr, Compiler};
use super::uow::{apply, check, Doc, DocumentTx, WriteOp};
use crate::mappers::EntityMapper;
use crate::ports::{BaseRepository, DeleteOptions, RepoCapabilities, RepoCtx};
use crate::query::{CursorDirection, Page, QueryOptions, SortDirection};
use crate::schema::{self, Persistable};

pub struct DocumentRepository<M> {
    client: SurrealClient,
    _mapper: PhantomData<fn() -> M>,
}

impl<M> DocumentRepository<M>
where
    M: EntityMapper,
    M::Persisted: Serialize + DeserializeOwned,
{
    pub fn new(client: SurrealClient) -> Self {
        Self {
            client,
            _mapper: PhantomData,
        }
    }

    fn table() -> &'static str {
        <M::Domain as Persistable>::NAME
    }

    fn projection() -> String {
        <M::Domain as Persistable>::fields()
            .iter()
            .map(|f| {
                if f.name == "id" {
                    "record::id(id) AS id".to_string()
                } else {
                    field_expr(f.name)
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Stored content of a document, without its id.
    fn content(doc: &M::Persisted) -> AppResult<Doc> {
        match serde_json::to_value(doc)? {
            serde_json::Value::Object(map) => Ok(map),
            _ => Err(AppError::internal("stored document must serialize to an object")),
        }
    }

    fn decode(id: &str, mut content: Doc) -> AppResult<M::Domain> {
        content.insert("id".to_string(), serde_json::Value::from(id));
        let doc: M::Persisted = serde_json::from_value(serde_json::Value::Object(content))?;
        M::to_domain(doc)
    }

    fn apply_projection(entity: M::Domain, options: &QueryOptions) -> AppResult<M::Domain> {
        match &options.select {
            Some(fields) => schema::project(entity, fields),
            None => Ok(entity),
        }
    }

    /// Committed state of a record.
    async fn fetch(&self, id: &str) -> AppResult<Option<M::Persisted>> {
        let sql = format!("SELECT {} FROM type::thing($tb, $id)", Self::projection());
        let response = self
            .client
            .query(sql)
            .bind(("tb", Self::table()))
            .bind(("id", id.to_string()))
            .await?;
        let mut rows: Vec<M::Persisted> = check(response, Self::table())?.take(0)?;
        Ok(rows.pop())
    }

    /// State of a record as seen from `tx`: buffered writes first, then committed data.
    async fn current(&self, id: &str, tx: Option<&DocumentTx>) -> AppResult<Option<Doc>> {
        if let Some(tx) = tx {
            if let Some(staged) = tx.staged(Self::table(), id)? {
                return Ok(staged);
            }
        }
        self.fetch(id).await?.as_ref().map(Self::content).transpose()
    }

    async fn read(&self, id: &str, tx: Option<&DocumentTx>) -> AppResult<Option<M::Domain>> {
        self.current(id, tx)
            .await?
            .map(|content| Self::decode(id, content))
            .transpose()
    }

    async fn read_back(&self, id: &str, tx: Option<&DocumentTx>) -> AppResult<M::Domain> {
        self.read(id, tx)
            .await?
            .ok_or_else(|| AppError::internal("written document could not be read back"))
    }

    /// Run `op` now, or buffer it in `tx` together with the state it leaves behind.
    async fn write(&self, op: WriteOp, after: Option<Doc>, tx: Option<&DocumentTx>) -> AppResult<()> {
        match tx {
            Some(tx) => tx.stage(op, after),
            None => apply(&self.client, std::slice::from_ref(&op)).await,
        }
    }

    fn patch_content(patch: &<M::Domain as Persistable>::Patch) -> AppResult<Doc> {
        schema::patch_values::<M::Domain>(patch)?
            .into_iter()
            .map(|(def, json)| Ok((def.name.to_string(), encode_field(def.kind, def.name, json)?)))
            .collect()
    }

    fn merged(mut base: Doc, changes: &Doc) -> Doc {
        for (k, v) in changes {
            base.insert(k.clone(), v.clone());
        }
        base
    }

    /// Run a `SELECT` over the table. Returns the rows in the requested order and
    /// whether a cursor was applied.
    async fn query(
        &self,
        options: &QueryOptions,
        limit: Option<u64>,
    ) -> AppResult<(Vec<M::Persisted>, bool)> {
        let table = Self::table();
        let pagination = options.pagination.clone().unwrap_or_default();

        if pagination.offset.is_some() {
            tracing::debug!(table, "Offset pagination is not supported by the document store; ignored");
        }
        if !options.include.is_empty() {
            tracing::debug!(include = ?options.include, "Relation loading is not supported; ignored");
        }
        if let Some(fields) = &options.select {
            for name in fields {
                <M::Domain as Persistable>::field(name)?;
            }
        }

        let mut keys = options.order.with_id_tiebreaker();
        for (field, _) in &keys {
            <M::Domain as Persistable>::field(field)?;
        }

        let mut compiler = Compiler::<M::Domain>::new();
        let mut clauses = Vec::new();
        if let Some(filter) = &options.filter {
            clauses.push(compiler.filter(filter)?);
        }

        let mut reversed = false;
        let mut cursor_applied = false;
        if let Some(cursor) = &pagination.cursor {
            match self.fetch(cursor).await? {
                Some(doc) => {
                    let mut position = Self::content(&doc)?;
                    position.insert("id".to_string(), serde_json::Value::from(cursor.as_str()));
                    if pagination.direction == CursorDirection::Prev {
                        keys = keys.into_iter().map(|(f, d)| (f, d.reverse())).collect();
                        reversed = true;
                    }
                    clauses.push(compiler.after(&keys, &position));
                    cursor_applied = true;
                }
                None => {
                    tracing::warn!(table, cursor = %cursor, "Cursor document not found; listing from the start");
                }
            }
        }

        let mut sql = format!("SELECT {} FROM {}", Self::projection(), table);
        if let Some(index) = &options.index {
            if index.is_empty() || !index.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(AppError::validation(format!("invalid index name `{}`", index)));
            }
            sql.push_str(" WITH INDEX ");
            sql.push_str(index);
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        let order = keys
            .iter()
            .map(|(field, direction)| {
                let expr = if field == "id" { "id".to_string() } else { field_expr(field) };
                match direction {
                    SortDirection::Asc => format!("{} ASC", expr),
                    SortDirection::Desc => format!("{} DESC", expr),
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        sql.push_str(" ORDER BY ");
        sql.push_str(&order);
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        tracing::debug!(table, sql = %sql, "Compiled document query");

        let response = self.client.query(sql).bind(compiler.into_binds()).await?;
        let mut rows: Vec<M::Persisted> = check(response, table)?.take(0)?;
        if reversed {
            rows.reverse();
        }
        Ok((rows, cursor_applied))
    }
}

#[async_trait]
impl<M> BaseRepository<M::Domain> for DocumentRepository<M>
where
    M: EntityMapper,
    M::Persisted: Serialize + DeserializeOwned,
{
    fn capabilities(&self) -> RepoCapabilities {
        RepoCapabilities::DOCUMENT
    }

    async fn create(&self, mut entity: M::Domain, ctx: &RepoCtx) -> AppResult<M::Domain> {
        let tx = DocumentTx::from_ctx(ctx)?.map(|tx| tx.as_ref());
        if entity.id().is_empty() {
            entity.set_id(Uuid::new_v4().simple().to_string());
        }
        let id = entity.id().to_string();
        let data = Self::content(&M::to_persistence(&entity))?;

        if let Some(tx) = tx {
            if matches!(tx.staged(Self::table(), &id)?, Some(Some(_))) {
                return Err(AppError::conflict(format!("A record in {}", Self::table())));
            }
        }

        let op = WriteOp::Create {
            table: Self::table(),
            id: id.clone(),
            data: data.clone(),
        };
        self.write(op, Some(data), tx).await?;
        self.read_back(&id, tx).await
    }

    async fn create_with_id(
        &self,
        id: &str,
        mut entity: M::Domain,
        ctx: &RepoCtx,
    ) -> AppResult<M::Domain> {
        let tx = DocumentTx::from_ctx(ctx)?.map(|tx| tx.as_ref());
        entity.set_id(id.to_string());
        let data = Self::content(&M::to_persistence(&entity))?;

        let op = WriteOp::Replace {
            table: Self::table(),
            id: id.to_string(),
            data: data.clone(),
        };
        self.write(op, Some(data), tx).await?;
        self.read_back(id, tx).await
    }

    async fn upsert(&self, id: &str, mut entity: M::Domain, ctx: &RepoCtx) -> AppResult<M::Domain> {
        let tx = DocumentTx::from_ctx(ctx)?.map(|tx| tx.as_ref());
        entity.set_id(id.to_string());
        let data = Self::content(&M::to_persistence(&entity))?;

        let after = match tx {
            Some(_) => Some(match self.current(id, tx).await? {
                Some(stored) => Self::merged(stored, &data),
                None => data.clone(),
            }),
            None => None,
        };

        let op = WriteOp::Merge {
            table: Self::table(),
            id: id.to_string(),
            data,
        };
        self.write(op, after, tx).await?;
        self.read_back(id, tx).await
    }

    async fn find_by_id(&self, id: &str, ctx: &RepoCtx) -> AppResult<Option<M::Domain>> {
        let tx = DocumentTx::from_ctx(ctx)?.map(|tx| tx.as_ref());
        self.read(id, tx).await
    }

    async fn find_one(
        &self,
        mut options: QueryOptions,
        ctx: &RepoCtx,
    ) -> AppResult<Option<M::Domain>> {
        DocumentTx::from_ctx(ctx)?;
        options.pagination = None;
        let (rows, _) = self.query(&options, Some(1)).await?;
        rows.into_iter()
            .next()
            .map(|doc| Self::apply_projection(M::to_domain(doc)?, &options))
            .transpose()
    }

    async fn find_many(&self, options: QueryOptions, ctx: &RepoCtx) -> AppResult<Page<M::Domain>> {
        DocumentTx::from_ctx(ctx)?;
        let pagination = options.pagination.clone().unwrap_or_default();
        let limit = pagination.limit;

        let (rows, cursor_applied) = self.query(&options, limit).await?;
        let full = limit.is_some_and(|l| rows.len() as u64 >= l && l > 0);

        let data = rows
            .into_iter()
            .map(|doc| Self::apply_projection(M::to_domain(doc)?, &options))
            .collect::<AppResult<Vec<_>>>()?;

        let first = data.first().map(|d| d.id().to_string());
        let last = data.last().map(|d| d.id().to_string());
        let (cursor_next, cursor_prev) = match pagination.direction {
            CursorDirection::Prev if cursor_applied => (last, if full { first } else { None }),
            _ => (if full { last } else { None }, if cursor_applied { first } else { None }),
        };

        Ok(Page {
            data,
            total: None,
            limit,
            offset: None,
            cursor_next,
            cursor_prev,
        })
    }

    async fn update(
        &self,
        id: &str,
        patch: <M::Domain as Persistable>::Patch,
        ctx: &RepoCtx,
    ) -> AppResult<M::Domain> {
        let tx = DocumentTx::from_ctx(ctx)?.map(|tx| tx.as_ref());
        let changes = Self::patch_content(&patch)?;

        let stored = self.current(id, tx).await?.ok_or(AppError::NotFound)?;
        if changes.is_empty() {
            return Self::decode(id, stored);
        }

        let op = WriteOp::Update {
            table: Self::table(),
            id: id.to_string(),
            data: changes.clone(),
        };
        let after = tx.map(|_| Self::merged(stored, &changes));
        self.write(op, after, tx).await?;

        self.read(id, tx).await?.ok_or(AppError::NotFound)
    }

    async fn delete(&self, id: &str, options: DeleteOptions, ctx: &RepoCtx) -> AppResult<()> {
        let tx = DocumentTx::from_ctx(ctx)?.map(|tx| tx.as_ref());
        let table = Self::table();

        if !options.hard && <M::Domain as Persistable>::SOFT_DELETE_FIELD.is_some() {
            return Err(AppError::unsupported(format!(
                "soft delete of {} records is not available on the document store",
                table
            )));
        }

        let op = WriteOp::Delete {
            table,
            id: id.to_string(),
        };
        self.write(op, None, tx).await?;
        tracing::debug!(table, id, "Delete executed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::tagged::{Tagged, TaggedDocMapper};
    use crate::query::{Comparator, Filter};
    use common::DocumentStoreConfig;

    fn tagged(id: &str, tags: &[&str]) -> Tagged {
        Tagged {
            id: id.to_string(),
            name: format!("item {}", id),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn array_contains_matches_list_members() {
        let config = DocumentStoreConfig {
            namespace: "test".to_string(),
            database: "tagged".to_string(),
            max_retries: 0,
            ..Default::default()
        };
        let client = crate::document::connect(&config).await.unwrap();
        let repo = DocumentRepository::<TaggedDocMapper>::new(client);
        assert!(repo.capabilities().array_contains);

        let ctx = RepoCtx::default();
        repo.create(tagged("t1", &["urgent", "new"]), &ctx).await.unwrap();
        repo.create(tagged("t2", &["new"]), &ctx).await.unwrap();
        repo.create(tagged("t3", &[]), &ctx).await.unwrap();

        let page = repo
            .find_many(
                QueryOptions::new()
                    .filter(Filter::new().field("tags", Comparator::new().array_contains("new"))),
                &ctx,
            )
            .await
            .unwrap();
        let mut ids: Vec<&str> = page.data.iter().map(|t| t.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["t1", "t2"]);

        let found = repo
            .find_one(
                QueryOptions::new()
                    .filter(Filter::new().field("tags", Comparator::new().array_contains("urgent"))),
                &ctx,
            )
            .await
            .unwrap();
        assert_eq!(found, Some(tagged("t1", &["urgent", "new"])));
    }
}
