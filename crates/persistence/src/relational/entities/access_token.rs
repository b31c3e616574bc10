use sea_orm::entity::prelude::*;

use crate::relational::field_map::{FieldMap, RelationalEntity};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "access_tokens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub token: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl RelationalEntity for Entity {
    type Active = ActiveModel;

    fn field_map() -> FieldMap<Self> {
        FieldMap::new()
            .insert("id", Column::Id)
            .insert("token", Column::Token)
            .insert("created_at", Column::CreatedAt)
    }
}
