//! Table and index definitions.
//!
//! Tables are schemaless; the indexes mirror the relational ones so the same
//! queries stay cheap on both stores. Every statement is idempotent.

use common::AppResult;

use super::client::SurrealClient;
use super::uow::check;

const DEFINITIONS: &[&str] = &[
    "DEFINE TABLE IF NOT EXISTS users SCHEMALESS",
    "DEFINE INDEX IF NOT EXISTS idx_users_email ON TABLE users FIELDS email UNIQUE",
    "DEFINE INDEX IF NOT EXISTS idx_users_deleted_at ON TABLE users FIELDS deleted_at",
    "DEFINE TABLE IF NOT EXISTS generics SCHEMALESS",
    "DEFINE TABLE IF NOT EXISTS confirmations SCHEMALESS",
    "DEFINE INDEX IF NOT EXISTS idx_confirmations_rut_created ON TABLE confirmations FIELDS rut, created_datetime",
    "DEFINE INDEX IF NOT EXISTS idx_confirmations_phone_created ON TABLE confirmations FIELDS phone_number, created_datetime",
    "DEFINE TABLE IF NOT EXISTS messages SCHEMALESS",
    "DEFINE INDEX IF NOT EXISTS idx_messages_confirmation_timestamp ON TABLE messages FIELDS confirmation_id, `timestamp`",
    "DEFINE TABLE IF NOT EXISTS people SCHEMALESS",
    "DEFINE INDEX IF NOT EXISTS idx_people_email ON TABLE people FIELDS email UNIQUE",
    "DEFINE TABLE IF NOT EXISTS access_tokens SCHEMALESS",
    "DEFINE INDEX IF NOT EXISTS idx_access_tokens_token ON TABLE access_tokens FIELDS token UNIQUE",
];

/// Create every table and index that does not exist yet.
pub async fn init_schema(client: &SurrealClient) -> AppResult<()> {
    let sql = DEFINITIONS.join(";\n");
    let response = client.query(sql).await?;
    check(response, "Schema definition")?;
    tracing::info!(statements = DEFINITIONS.len(), "Document schema initialized");
    Ok(())
}
