//! Generic record: a free-form entry with a status and a date.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::GENERIC_STATUS_PENDING;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Generic {
    pub id: String,
    pub name: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub status: String,
}

impl Generic {
    /// New record in the pending status, dated now.
    pub fn pending(id: String, name: String, description: String) -> Self {
        Self {
            id,
            name,
            description,
            date: Utc::now(),
            status: GENERIC_STATUS_PENDING.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenericPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}
