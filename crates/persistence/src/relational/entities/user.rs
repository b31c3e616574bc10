//! User database entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::relational::field_map::{FieldMap, RelationalEntity};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub lastname: String,
    pub username: String,
    pub document_id: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub status: bool,
    pub role: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    /// Soft delete timestamp (NULL = active, set = deleted)
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl RelationalEntity for Entity {
    type Active = ActiveModel;

    fn field_map() -> FieldMap<Self> {
        FieldMap::new()
            .insert("id", Column::Id)
            .insert("name", Column::Name)
            .insert("lastname", Column::Lastname)
            .insert("username", Column::Username)
            .insert("document_id", Column::DocumentId)
            .insert("email", Column::Email)
            .insert("password_hash", Column::PasswordHash)
            .insert("status", Column::Status)
            .insert("role", Column::Role)
            .insert("created_at", Column::CreatedAt)
            .insert("updated_at", Column::UpdatedAt)
            .insert("deleted_at", Column::DeletedAt)
    }
}
