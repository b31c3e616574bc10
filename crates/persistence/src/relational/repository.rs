//! Generic SeaORM-backed repository.
//!
//! One implementation serves every entity: the [`FieldMap`] resolves domain
//! field names to columns and the mapper converts rows to domain values.

use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, NullOrdering, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, IntoActiveModel,
    Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, SqlErr,
};
use uuid::Uuid;

use common::{AppError, AppResult};

use super::compiler::{compile, sea_value};
use super::field_map::{FieldMap, RelationalEntity};
use super::uow::RelationalTx;
use crate::mappers::EntityMapper;
use crate::ports::{BaseRepository, DeleteOptions, RepoCapabilities, RepoCtx};
use crate::query::{Page, QueryOptions, SortDirection, Value};
use crate::schema::{self, FieldDef, FieldKind, Persistable};

/// Stand-in for "no limit" when only an offset is given; SQLite binds it as i64.
const UNBOUNDED_LIMIT: u64 = i64::MAX as u64;

/// Run `$body` on the pool, or on the transaction carried by `$ctx`.
macro_rules! on_conn {
    ($self:ident, $ctx:expr, |$conn:ident| $body:expr) => {
        match RelationalTx::from_ctx($ctx)? {
            None => {
                let $conn = &$self.db;
                $body
            }
            Some(tx) => {
                let slot = tx.lock().await;
                let $conn = slot.transaction()?;
                $body
            }
        }
    };
}

pub struct RelationalRepository<E: RelationalEntity, M> {
    db: DatabaseConnection,
    fields: FieldMap<E>,
    _mapper: PhantomData<fn() -> M>,
}

impl<E, M> RelationalRepository<E, M>
where
    E: RelationalEntity,
    E::Model: IntoActiveModel<E::Active> + Send + Sync,
    M: EntityMapper<Persisted = E::Model>,
{
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            fields: E::field_map(),
            _mapper: PhantomData,
        }
    }

    fn id_column(&self) -> AppResult<E::Column> {
        self.fields.column("id")
    }

    fn soft_delete_column(&self) -> AppResult<Option<E::Column>> {
        <M::Domain as Persistable>::SOFT_DELETE_FIELD
            .map(|f| self.fields.column(f))
            .transpose()
    }

    fn base_select(&self, include_deleted: bool) -> AppResult<Select<E>> {
        let mut select = E::find();
        if !include_deleted {
            if let Some(col) = self.soft_delete_column()? {
                select = select.filter(col.is_null());
            }
        }
        Ok(select)
    }

    /// Filter, soft-delete visibility and order of `options`.
    fn select(&self, options: &QueryOptions) -> AppResult<Select<E>> {
        let mut select = self.base_select(options.include_deleted)?;

        if let Some(filter) = &options.filter {
            let expr = compile::<M::Domain, E>(filter, &self.fields)?;
            tracing::debug!(
                table = <M::Domain as Persistable>::NAME,
                sql = %expr.render(),
                "Compiled filter"
            );
            select = select.filter(expr.to_condition());
        }

        for (field, direction) in options.order.with_id_tiebreaker() {
            <M::Domain as Persistable>::field(&field)?;
            let col = self.fields.column(&field)?;
            select = match direction {
                SortDirection::Asc => select.order_by_with_nulls(col, Order::Asc, NullOrdering::First),
                SortDirection::Desc => select.order_by_with_nulls(col, Order::Desc, NullOrdering::Last),
            };
        }

        if !options.include.is_empty() {
            tracing::debug!(include = ?options.include, "Relation loading is not supported; ignored");
        }
        if let Some(index) = &options.index {
            tracing::debug!(index = %index, "Index hints are not used by the relational store");
        }

        Ok(select)
    }

    fn to_domain_all(
        &self,
        models: Vec<E::Model>,
        select: Option<&[String]>,
    ) -> AppResult<Vec<M::Domain>> {
        models
            .into_iter()
            .map(|m| {
                let entity = M::to_domain(m)?;
                match select {
                    Some(fields) => schema::project(entity, fields),
                    None => Ok(entity),
                }
            })
            .collect()
    }

    fn write_err(e: DbErr) -> AppError {
        let table = <M::Domain as Persistable>::NAME;
        match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                tracing::debug!(table, detail = %detail, "Unique constraint violated");
                AppError::conflict(format!("A record in {}", table))
            }
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
                tracing::debug!(table, detail = %detail, "Foreign key violated");
                AppError::validation(format!("{} record references a missing record", table))
            }
            _ => AppError::from(e),
        }
    }

    async fn fetch<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
        include_deleted: bool,
    ) -> AppResult<Option<M::Domain>> {
        self.base_select(include_deleted)?
            .filter(self.id_column()?.eq(id))
            .one(conn)
            .await?
            .map(M::to_domain)
            .transpose()
    }

    async fn insert<C: ConnectionTrait>(&self, conn: &C, entity: M::Domain) -> AppResult<M::Domain> {
        let id = entity.id().to_string();
        let active = M::to_persistence(&entity).into_active_model().reset_all();

        E::insert(active)
            .exec_without_returning(conn)
            .await
            .map_err(Self::write_err)?;

        self.fetch(conn, &id, true)
            .await?
            .ok_or_else(|| AppError::internal("inserted row could not be read back"))
    }

    async fn upsert_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        entity: M::Domain,
    ) -> AppResult<M::Domain> {
        let id = entity.id().to_string();
        let json = serde_json::to_value(&entity)?;

        // Null fields keep whatever is stored
        let update_columns = <M::Domain as Persistable>::fields()
            .iter()
            .filter(|f| f.name != "id")
            .filter(|f| json.get(f.name).is_some_and(|v| !v.is_null()))
            .map(|f| self.fields.column(f.name))
            .collect::<AppResult<Vec<_>>>()?;

        let mut on_conflict = OnConflict::column(self.id_column()?);
        if update_columns.is_empty() {
            on_conflict.do_nothing();
        } else {
            on_conflict.update_columns(update_columns);
        }

        let active = M::to_persistence(&entity).into_active_model().reset_all();
        E::insert(active)
            .on_conflict(on_conflict)
            .exec_without_returning(conn)
            .await
            .map_err(Self::write_err)?;

        self.fetch(conn, &id, true)
            .await?
            .ok_or_else(|| AppError::internal("upserted row could not be read back"))
    }

    async fn find_one_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        options: &QueryOptions,
    ) -> AppResult<Option<M::Domain>> {
        let model = self.select(options)?.one(conn).await?;
        Ok(self
            .to_domain_all(model.into_iter().collect(), options.select.as_deref())?
            .pop())
    }

    async fn find_many_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        options: &QueryOptions,
    ) -> AppResult<Page<M::Domain>> {
        let pagination = options.pagination.clone().unwrap_or_default();
        if pagination.cursor.is_some() {
            tracing::debug!("Cursor pagination is not supported by the relational store; ignored");
        }

        let select = self.select(options)?;
        let total = select.clone().count(conn).await?;

        // SQLite only accepts OFFSET after a LIMIT
        let offset = pagination.offset.unwrap_or(0);
        let paged = match (pagination.limit, offset) {
            (Some(limit), 0) => select.limit(limit),
            (Some(limit), offset) => select.limit(limit).offset(offset),
            (None, 0) => select,
            (None, offset) => select.limit(UNBOUNDED_LIMIT).offset(offset),
        };

        let models = paged.all(conn).await?;
        let data = self.to_domain_all(models, options.select.as_deref())?;

        Ok(Page {
            data,
            total: Some(total),
            limit: pagination.limit,
            offset: Some(offset),
            cursor_next: None,
            cursor_prev: None,
        })
    }

    async fn update_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
        patch: &<M::Domain as Persistable>::Patch,
    ) -> AppResult<M::Domain> {
        let values = schema::patch_values::<M::Domain>(patch)?;

        let model = self
            .base_select(false)?
            .filter(self.id_column()?.eq(id))
            .one(conn)
            .await?
            .ok_or(AppError::NotFound)?;

        if values.is_empty() {
            return M::to_domain(model);
        }

        let mut active: E::Active = model.into_active_model();
        for (def, json) in values {
            active.set(self.fields.column(def.name)?, stored_value(def, json)?);
        }

        let saved = active.update(conn).await.map_err(Self::write_err)?;
        M::to_domain(saved)
    }

    async fn delete_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
        options: DeleteOptions,
    ) -> AppResult<()> {
        let table = <M::Domain as Persistable>::NAME;
        let id_col = self.id_column()?;

        let rows = match self.soft_delete_column()? {
            Some(col) if !options.hard => {
                E::update_many()
                    .col_expr(col, Expr::value(Utc::now()))
                    .filter(id_col.eq(id))
                    .filter(col.is_null())
                    .exec(conn)
                    .await?
                    .rows_affected
            }
            _ => {
                E::delete_many()
                    .filter(id_col.eq(id))
                    .exec(conn)
                    .await?
                    .rows_affected
            }
        };

        tracing::debug!(table, id, rows, hard = options.hard, "Delete executed");
        Ok(())
    }
}

/// Patch value in domain JSON form -> column value.
fn stored_value(def: &FieldDef, json: serde_json::Value) -> AppResult<sea_orm::Value> {
    if def.kind == FieldKind::Json {
        return Ok(sea_orm::Value::from((!json.is_null()).then_some(json)));
    }
    let value = Value::from_json(&json)?.coerce(def.kind, def.name)?;
    Ok(sea_value(def.kind, &value))
}

#[async_trait]
impl<E, M> BaseRepository<M::Domain> for RelationalRepository<E, M>
where
    E: RelationalEntity,
    E::Model: IntoActiveModel<E::Active> + Send + Sync,
    M: EntityMapper<Persisted = E::Model>,
{
    fn capabilities(&self) -> RepoCapabilities {
        RepoCapabilities::RELATIONAL
    }

    async fn create(&self, mut entity: M::Domain, ctx: &RepoCtx) -> AppResult<M::Domain> {
        if entity.id().is_empty() {
            entity.set_id(Uuid::new_v4().to_string());
        }
        on_conn!(self, ctx, |conn| self.insert(conn, entity).await)
    }

    async fn create_with_id(
        &self,
        id: &str,
        mut entity: M::Domain,
        ctx: &RepoCtx,
    ) -> AppResult<M::Domain> {
        entity.set_id(id.to_string());
        on_conn!(self, ctx, |conn| self.insert(conn, entity).await)
    }

    async fn upsert(&self, id: &str, mut entity: M::Domain, ctx: &RepoCtx) -> AppResult<M::Domain> {
        entity.set_id(id.to_string());
        on_conn!(self, ctx, |conn| self.upsert_on(conn, entity).await)
    }

    async fn find_by_id(&self, id: &str, ctx: &RepoCtx) -> AppResult<Option<M::Domain>> {
        on_conn!(self, ctx, |conn| self.fetch(conn, id, false).await)
    }

    async fn find_one(
        &self,
        options: QueryOptions,
        ctx: &RepoCtx,
    ) -> AppResult<Option<M::Domain>> {
        on_conn!(self, ctx, |conn| self.find_one_on(conn, &options).await)
    }

    async fn find_many(&self, options: QueryOptions, ctx: &RepoCtx) -> AppResult<Page<M::Domain>> {
        on_conn!(self, ctx, |conn| self.find_many_on(conn, &options).await)
    }

    async fn update(
        &self,
        id: &str,
        patch: <M::Domain as Persistable>::Patch,
        ctx: &RepoCtx,
    ) -> AppResult<M::Domain> {
        on_conn!(self, ctx, |conn| self.update_on(conn, id, &patch).await)
    }

    async fn delete(&self, id: &str, options: DeleteOptions, ctx: &RepoCtx) -> AppResult<()> {
        on_conn!(self, ctx, |conn| self.delete_on(conn, id, options).await)
    }
}
