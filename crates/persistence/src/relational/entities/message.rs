//! Message entity for SeaORM.
//!
//! Rows are removed together with their confirmation (`ON DELETE CASCADE`).

use sea_orm::entity::prelude::*;

use crate::relational::field_map::{FieldMap, RelationalEntity};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "messages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub confirmation_id: String,
    pub sender: String,
    #[sea_orm(column_name = "message_text")]
    pub text: Option<String>,
    pub template_id: Option<String>,
    pub template_text: Option<String>,
    pub variables: Option<Json>,
    pub status: Option<String>,
    pub timestamp: DateTimeUtc,
    #[sea_orm(unique)]
    pub external_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::confirmation::Entity",
        from = "Column::ConfirmationId",
        to = "super::confirmation::Column::Id",
        on_delete = "Cascade"
    )]
    Confirmation,
}

impl Related<super::confirmation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Confirmation.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl RelationalEntity for Entity {
    type Active = ActiveModel;

    fn field_map() -> FieldMap<Self> {
        FieldMap::new()
            .insert("id", Column::Id)
            .insert("confirmation_id", Column::ConfirmationId)
            .insert("sender", Column::Sender)
            .insert("text", Column::Text)
            .insert("template_id", Column::TemplateId)
            .insert("template_text", Column::TemplateText)
            .insert("variables", Column::Variables)
            .insert("status", Column::Status)
            .insert("timestamp", Column::Timestamp)
            .insert("external_id", Column::ExternalId)
    }
}
