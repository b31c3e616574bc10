//! Person entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::relational::field_map::{FieldMap, RelationalEntity};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "people")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub role: String,
    pub status: bool,
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
            .insert("email", Column::Email)
            .insert("role", Column::Role)
            .insert("status", Column::Status)
    }
}
