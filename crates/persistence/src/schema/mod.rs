//! Entity schemas shared by both adapters.
//!
//! Filters, ordering, projection and patches all speak in domain field names.
//! The schema tells each adapter which names exist and how their values are typed.

mod catalog;

use common::{AppError, AppResult};
use serde::{de::DeserializeOwned, Serialize};

/// Storage-independent type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Bool,
    Integer,
    Float,
    DateTime,
    /// Arbitrary JSON; persisted but not filterable
    Json,
    /// List of strings; only `arrayContains` applies
    TextArray,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldDef {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// A domain type that can be stored by the repositories.
pub trait Persistable:
    Serialize + DeserializeOwned + Default + Clone + std::fmt::Debug + Send + Sync + 'static
{
    /// Partial update; fields serialized as absent are left untouched.
    type Patch: Serialize + Clone + std::fmt::Debug + Send + Sync + 'static;

    /// Table / collection name
    const NAME: &'static str;

    /// Timestamp column used for soft deletes, if the entity supports them
    const SOFT_DELETE_FIELD: Option<&'static str> = None;

    /// All persisted fields, `id` first.
    fn fields() -> &'static [FieldDef];

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);

    fn field(name: &str) -> AppResult<&'static FieldDef> {
        Self::fields()
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| {
                AppError::validation(format!("unknown field `{}` on {}", name, Self::NAME))
            })
    }
}

/// Set fields of a patch, paired with their definitions.
pub fn patch_values<D: Persistable>(
    patch: &D::Patch,
) -> AppResult<Vec<(&'static FieldDef, serde_json::Value)>> {
    let json = serde_json::to_value(patch)?;
    let obj = match json {
        serde_json::Value::Object(obj) => obj,
        _ => return Err(AppError::internal("patch must serialize to an object")),
    };

    obj.into_iter()
        .map(|(name, value)| {
            if name == "id" {
                return Err(AppError::validation("the id of a record cannot be patched"));
            }
            Ok((D::field(&name)?, value))
        })
        .collect()
}

/// Keep only the selected fields (and `id`); everything else takes its default.
pub fn project<D: Persistable>(entity: D, select: &[String]) -> AppResult<D> {
    for name in select {
        D::field(name)?;
    }

    let json = serde_json::to_value(&entity)?;
    let serde_json::Value::Object(mut all) = json else {
        return Err(AppError::internal("entity must serialize to an object"));
    };

    let mut kept = serde_json::Map::new();
    for name in std::iter::once("id").chain(select.iter().map(String::as_str)) {
        if let Some(v) = all.remove(name) {
            kept.insert(name.to_string(), v);
        }
    }

    Ok(serde_json::from_value(serde_json::Value::Object(kept))?)
}
