//! Confirmation entity for SeaORM. Owns its messages.

use sea_orm::entity::prelude::*;

use crate::relational::field_map::{FieldMap, RelationalEntity};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "confirmations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub session_id: Option<String>,
    pub appointment_id: Option<String>,
    pub patient_name: String,
    pub rut: String,
    pub phone_number: String,
    pub service_name: String,
    pub center_name: Option<String>,
    pub created_datetime: DateTimeUtc,
    pub start_datetime: Option<DateTimeUtc>,
    pub appointment_datetime: Option<DateTimeUtc>,
    pub delivered_datetime: Option<DateTimeUtc>,
    pub template_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::message::Entity")]
    Messages,
}

impl Related<super::message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Messages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl RelationalEntity for Entity {
    type Active = ActiveModel;

    fn field_map() -> FieldMap<Self> {
        FieldMap::new()
            .insert("id", Column::Id)
            .insert("session_id", Column::SessionId)
            .insert("appointment_id", Column::AppointmentId)
            .insert("patient_name", Column::PatientName)
            .insert("rut", Column::Rut)
            .insert("phone_number", Column::PhoneNumber)
            .insert("service_name", Column::ServiceName)
            .insert("center_name", Column::CenterName)
            .insert("created_datetime", Column::CreatedDatetime)
            .insert("start_datetime", Column::StartDatetime)
            .insert("appointment_datetime", Column::AppointmentDatetime)
            .insert("delivered_datetime", Column::DeliveredDatetime)
            .insert("template_id", Column::TemplateId)
    }
}
