//! Generic record entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::relational::field_map::{FieldMap, RelationalEntity};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "generics")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub description: String,
    pub date: DateTimeUtc,
    pub status: String,
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
            .insert("description", Column::Description)
            .insert("date", Column::Date)
            .insert("status", Column::Status)
    }
}
