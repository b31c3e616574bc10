//! Message exchanged inside a confirmation session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{
    MESSAGE_STATUS_DELIVERED, MESSAGE_STATUS_FAILED, MESSAGE_STATUS_READ, MESSAGE_STATUS_SENT,
    SENDER_BOT, SENDER_PATIENT,
};

/// Who wrote the message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    #[default]
    #[serde(rename = "BOT")]
    Bot,
    #[serde(rename = "PACIENTE")]
    Paciente,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::Bot => SENDER_BOT,
            Sender::Paciente => SENDER_PATIENT,
        }
    }
}

impl From<&str> for Sender {
    fn from(s: &str) -> Self {
        match s {
            SENDER_PATIENT => Sender::Paciente,
            _ => Sender::Bot,
        }
    }
}

/// Delivery status reported by the messaging provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageStatus {
    Sent,
    Delivered,
    Read,
    Failed,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Sent => MESSAGE_STATUS_SENT,
            MessageStatus::Delivered => MESSAGE_STATUS_DELIVERED,
            MessageStatus::Read => MESSAGE_STATUS_READ,
            MessageStatus::Failed => MESSAGE_STATUS_FAILED,
        }
    }

    /// Parse a stored status; unknown values yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            MESSAGE_STATUS_SENT => Some(MessageStatus::Sent),
            MESSAGE_STATUS_DELIVERED => Some(MessageStatus::Delivered),
            MESSAGE_STATUS_READ => Some(MessageStatus::Read),
            MESSAGE_STATUS_FAILED => Some(MessageStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Message {
    pub id: String,
    pub confirmation_id: String,
    pub sender: Sender,
    pub text: Option<String>,
    pub template_id: Option<String>,
    pub template_text: Option<String>,
    pub variables: Option<serde_json::Value>,
    pub status: Option<MessageStatus>,
    pub timestamp: DateTime<Utc>,
    pub external_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessagePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<MessageStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_serializes_to_stored_form() {
        assert_eq!(serde_json::to_value(Sender::Paciente).unwrap(), "PACIENTE");
        assert_eq!(Sender::from("PACIENTE"), Sender::Paciente);
        assert_eq!(Sender::from("unknown"), Sender::Bot);
    }

    #[test]
    fn status_parse_is_strict() {
        assert_eq!(MessageStatus::parse("READ"), Some(MessageStatus::Read));
        assert_eq!(MessageStatus::parse("read"), None);
        assert_eq!(serde_json::to_value(MessageStatus::Failed).unwrap(), "FAILED");
    }
}
