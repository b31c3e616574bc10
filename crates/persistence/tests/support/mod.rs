//! Shared fixtures for the adapter suites.
#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use common::{DatabaseConfig, DocumentStoreConfig};
use domain::{Confirmation, Message, MessageStatus, Person, Role, Sender};
use persistence::document;
use persistence::relational::Database;
use persistence::{RepoCtx, Repositories};

/// Fresh in-memory SQLite database, migrated.
///
/// A single pooled connection keeps every statement on the same in-memory database.
pub async fn relational() -> Repositories {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        sql_logging: false,
    };
    let db = Database::connect(&config).await.expect("sqlite connect");
    Repositories::relational(&db)
}

/// Fresh in-memory SurrealDB with the schema defined.
pub async fn document() -> Repositories {
    let config = DocumentStoreConfig {
        url: "mem://".to_string(),
        namespace: "test".to_string(),
        database: "test".to_string(),
        max_retries: 0,
        ..Default::default()
    };
    let client = document::connect(&config).await.expect("surreal connect");
    document::init_schema(&client).await.expect("schema");
    Repositories::document(client)
}

pub fn ctx() -> RepoCtx {
    RepoCtx::default()
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub fn confirmation(id: &str, rut: &str, phone: &str, created: DateTime<Utc>) -> Confirmation {
    Confirmation {
        id: id.to_string(),
        patient_name: format!("Patient {}", id),
        rut: rut.to_string(),
        phone_number: phone.to_string(),
        service_name: "Cardiology".to_string(),
        created_datetime: created,
        ..Default::default()
    }
}

pub fn message(id: &str, confirmation_id: &str, timestamp: DateTime<Utc>) -> Message {
    Message {
        id: id.to_string(),
        confirmation_id: confirmation_id.to_string(),
        sender: Sender::Bot,
        text: Some(format!("text {}", id)),
        status: Some(MessageStatus::Sent),
        timestamp,
        ..Default::default()
    }
}

pub fn person(id: &str, name: &str) -> Person {
    Person::new(
        id.to_string(),
        name.to_string(),
        format!("{}@example.com", id),
        Role::User,
    )
}

/// Six confirmations covering null and non-null optional fields.
pub fn confirmation_dataset() -> Vec<Confirmation> {
    let mut rows = vec![
        confirmation("c1", "11111111-1", "+56911110001", at(2024, 1, 1, 9)),
        confirmation("c2", "11111111-1", "+56911110002", at(2024, 1, 2, 9)),
        confirmation("c3", "22222222-2", "+56911110003", at(2024, 1, 3, 9)),
        confirmation("c4", "33333333-3", "+56911110004", at(2024, 1, 4, 9)),
        confirmation("c5", "44444444-4", "+56922220005", at(2024, 1, 5, 9)),
        confirmation("c6", "55555555-5", "+56922220006", at(2024, 1, 6, 9)),
    ];
    rows[0].center_name = Some("Centro Norte".to_string());
    rows[1].center_name = Some("Centro Sur".to_string());
    rows[2].center_name = Some("Centro Norte".to_string());
    rows[3].start_datetime = Some(at(2024, 2, 1, 10));
    rows[4].start_datetime = Some(at(2024, 2, 2, 10));
    rows
}

pub async fn seed_confirmations(repos: &Repositories) {
    for c in confirmation_dataset() {
        repos.confirmations.create(c, &ctx()).await.expect("seed");
    }
}

pub fn ids<T: persistence::Persistable>(rows: &[T]) -> Vec<String> {
    rows.iter().map(|r| r.id().to_string()).collect()
}

pub fn sorted_ids<T: persistence::Persistable>(rows: &[T]) -> Vec<String> {
    let mut ids = ids(rows);
    ids.sort();
    ids
}

pub mod scenarios;
