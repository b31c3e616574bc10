//! Stored document shapes.
//!
//! `id` is read from `record::id(id)` and never written into the content; the
//! record id lives in the record link. `None` fields are left out, so a missing
//! value is stored as NONE.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::codec::{option_timestamp, timestamp};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserDoc {
    #[serde(skip_serializing)]
    pub id: String,
    pub name: String,
    pub lastname: String,
    pub username: String,
    pub document_id: String,
    pub email: String,
    pub password_hash: String,
    pub status: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(with = "option_timestamp", skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenericDoc {
    #[serde(skip_serializing)]
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(with = "timestamp")]
    pub date: DateTime<Utc>,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmationDoc {
    #[serde(skip_serializing)]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<String>,
    pub patient_name: String,
    pub rut: String,
    pub phone_number: String,
    pub service_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center_name: Option<String>,
    #[serde(with = "timestamp")]
    pub created_datetime: DateTime<Utc>,
    #[serde(with = "option_timestamp", skip_serializing_if = "Option::is_none")]
    pub start_datetime: Option<DateTime<Utc>>,
    #[serde(with = "option_timestamp", skip_serializing_if = "Option::is_none")]
    pub appointment_datetime: Option<DateTime<Utc>>,
    #[serde(with = "option_timestamp", skip_serializing_if = "Option::is_none")]
    pub delivered_datetime: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageDoc {
    #[serde(skip_serializing)]
    pub id: String,
    pub confirmation_id: String,
    pub sender: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_text: Option<String>,
    /// JSON text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonDoc {
    #[serde(skip_serializing)]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub status: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessTokenDoc {
    #[serde(skip_serializing)]
    pub id: String,
    pub token: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}
