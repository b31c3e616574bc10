//! Confirmation: a messaging session with a patient about an appointment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Confirmation domain entity.
///
/// Keyed by the external session/appointment id, it carries the patient identity
/// and the milestones of the conversation. Messages belong to exactly one
/// confirmation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Confirmation {
    pub id: String,
    pub session_id: Option<String>,
    pub appointment_id: Option<String>,
    pub patient_name: String,
    pub rut: String,
    pub phone_number: String,
    pub service_name: String,
    pub center_name: Option<String>,
    pub created_datetime: DateTime<Utc>,
    pub start_datetime: Option<DateTime<Utc>>,
    pub appointment_datetime: Option<DateTime<Utc>>,
    pub delivered_datetime: Option<DateTime<Utc>>,
    pub template_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rut: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_datetime: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_datetime: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_datetime: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
}
