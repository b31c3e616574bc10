//! Mapping from domain field names to SeaORM columns.

use std::collections::HashMap;

use common::{AppError, AppResult};
use sea_orm::{ActiveModelBehavior, ActiveModelTrait, EntityTrait};

/// Domain field name -> column of `E`.
pub struct FieldMap<E: EntityTrait> {
    columns: HashMap<&'static str, E::Column>,
}

impl<E: EntityTrait> FieldMap<E> {
    pub fn new() -> Self {
        Self {
            columns: HashMap::new(),
        }
    }

    pub fn insert(mut self, field: &'static str, column: E::Column) -> Self {
        self.columns.insert(field, column);
        self
    }

    pub fn get(&self, field: &str) -> Option<E::Column> {
        self.columns.get(field).copied()
    }

    /// Like [`get`](Self::get), but an unmapped field is a validation error.
    pub fn column(&self, field: &str) -> AppResult<E::Column> {
        self.get(field)
            .ok_or_else(|| AppError::validation(format!("unknown field `{}`", field)))
    }
}

impl<E: EntityTrait> Default for FieldMap<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// A SeaORM entity whose columns are addressable by domain field name.
pub trait RelationalEntity: EntityTrait {
    type Active: ActiveModelTrait<Entity = Self> + ActiveModelBehavior + Send + Sync + 'static;

    fn field_map() -> FieldMap<Self>;
}
