//! Relational adapter against in-memory SQLite.

mod support;

use common::AppError;
use chrono::Utc;
use domain::User;
use persistence::{DeleteOptions, Filter, Pagination, QueryOptions, RepoCapabilities, SortDirection};
use serde_json::json;

use support::scenarios;
use support::*;

#[tokio::test]
async fn range_filter_on_confirmations() {
    scenarios::range_filter(&relational().await).await;
}

#[tokio::test]
async fn nested_or_on_rut_and_phone() {
    scenarios::or_filter(&relational().await).await;
}

#[tokio::test]
async fn upsert_is_idempotent() {
    scenarios::upsert_is_idempotent(&relational().await).await;
}

#[tokio::test]
async fn update_merges_and_reports_missing() {
    scenarios::update_merges_and_reports_missing(&relational().await).await;
}

#[tokio::test]
async fn delete_of_missing_id_is_silent() {
    scenarios::delete_of_missing_id_is_silent(&relational().await).await;
}

#[tokio::test]
async fn transactions_are_atomic() {
    scenarios::transactions_are_atomic(&relational().await).await;
}

#[tokio::test]
async fn projection_keeps_id_and_selected_fields() {
    scenarios::projection_keeps_id_and_selected_fields(&relational().await).await;
}

#[tokio::test]
async fn find_one_follows_order() {
    scenarios::find_one_follows_order(&relational().await).await;
}

#[tokio::test]
async fn patch_with_timestamps_round_trips() {
    scenarios::patch_with_timestamps_round_trips(&relational().await).await;
}

#[tokio::test]
async fn message_variables_survive() {
    scenarios::message_variables_survive(&relational().await).await;
}

#[tokio::test]
async fn capabilities_are_relational() {
    let repos = relational().await;
    assert_eq!(repos.capabilities(), RepoCapabilities::RELATIONAL);
    assert_eq!(repos.messages.capabilities(), RepoCapabilities::RELATIONAL);
}

#[tokio::test]
async fn deleting_a_confirmation_cascades_to_its_messages() {
    let repos = relational().await;
    repos
        .confirmations
        .create(confirmation("cc1", "1-9", "+56900000001", at(2024, 1, 1, 8)), &ctx())
        .await
        .unwrap();
    for id in ["cm1", "cm2"] {
        repos
            .messages
            .create(message(id, "cc1", at(2024, 1, 1, 9)), &ctx())
            .await
            .unwrap();
    }

    repos
        .confirmations
        .delete("cc1", DeleteOptions::hard(), &ctx())
        .await
        .unwrap();

    let left = repos
        .messages
        .find_many(QueryOptions::new().filter(Filter::new().eq("confirmation_id", "cc1")), &ctx())
        .await
        .unwrap();
    assert!(left.is_empty());
}

#[tokio::test]
async fn offset_pages_cover_every_row_once() {
    let repos = relational().await;
    for i in 0..7 {
        repos
            .people
            .create(person(&format!("p{}", i), &format!("Person {}", i)), &ctx())
            .await
            .unwrap();
    }

    let mut seen = Vec::new();
    for offset in [0, 3, 6] {
        let page = repos
            .people
            .find_many(
                QueryOptions::new()
                    .order_by("name", SortDirection::Asc)
                    .paginate(Pagination::offset(3, offset)),
                &ctx(),
            )
            .await
            .unwrap();
        assert_eq!(page.total, Some(7));
        assert_eq!(page.offset, Some(offset));
        seen.extend(ids(&page.data));
    }

    assert_eq!(seen, (0..7).map(|i| format!("p{}", i)).collect::<Vec<_>>());
}

#[tokio::test]
async fn unpaginated_find_many_returns_every_match() {
    let repos = relational().await;
    seed_confirmations(&repos).await;

    let page = repos
        .confirmations
        .find_many(
            QueryOptions::new().filter(Filter::new().eq("rut", "11111111-1")),
            &ctx(),
        )
        .await
        .unwrap();
    assert_eq!(sorted_ids(&page.data), vec!["c1", "c2"]);
    assert_eq!(page.total, Some(2));
    assert_eq!(page.limit, None);
}

#[tokio::test]
async fn offset_without_limit_skips_rows() {
    let repos = relational().await;
    seed_confirmations(&repos).await;

    let page = repos
        .confirmations
        .find_many(
            QueryOptions::new()
                .order_by("created_datetime", SortDirection::Asc)
                .offset(4),
            &ctx(),
        )
        .await
        .unwrap();
    assert_eq!(ids(&page.data), vec!["c5", "c6"]);
    assert_eq!(page.total, Some(6));
}

#[tokio::test]
async fn cursor_is_ignored() {
    let repos = relational().await;
    seed_confirmations(&repos).await;

    let page = repos
        .confirmations
        .find_many(
            QueryOptions::new().paginate(Pagination::cursor(10, Some("c3".to_string()))),
            &ctx(),
        )
        .await
        .unwrap();
    assert_eq!(page.len(), 6);
    assert!(page.cursor_next.is_none());
}

#[tokio::test]
async fn text_search_is_case_sensitive_like() {
    let repos = relational().await;
    seed_confirmations(&repos).await;

    let filter = Filter::try_from(json!({ "center_name": { "contains": "Norte" } })).unwrap();
    let page = repos
        .confirmations
        .find_many(QueryOptions::new().filter(filter), &ctx())
        .await
        .unwrap();
    assert_eq!(sorted_ids(&page.data), vec!["c1", "c3"]);

    let filter = Filter::try_from(json!({ "center_name": { "endsWith": "sur" } })).unwrap();
    let page = repos
        .confirmations
        .find_many(QueryOptions::new().filter(filter), &ctx())
        .await
        .unwrap();
    assert!(page.is_empty());
}

#[tokio::test]
async fn like_wildcards_in_operands_are_literal() {
    let repos = relational().await;
    let mut c = confirmation("w1", "1-1", "+56900000009", at(2024, 1, 1, 8));
    c.patient_name = "100% Ana".to_string();
    repos.confirmations.create(c, &ctx()).await.unwrap();
    repos
        .confirmations
        .create(confirmation("w2", "1-2", "+56900000010", at(2024, 1, 1, 8)), &ctx())
        .await
        .unwrap();

    let filter = Filter::try_from(json!({ "patient_name": { "contains": "0% A" } })).unwrap();
    let page = repos
        .confirmations
        .find_many(QueryOptions::new().filter(filter), &ctx())
        .await
        .unwrap();
    assert_eq!(ids(&page.data), vec!["w1"]);
}

#[tokio::test]
async fn duplicate_id_is_a_conflict() {
    let repos = relational().await;
    repos.people.create(person("dup", "Ana"), &ctx()).await.unwrap();
    let err = repos
        .people
        .create_with_id("dup", person("dup", "Otra"), &ctx())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn generated_ids_are_uuids() {
    let repos = relational().await;
    let created = repos.people.create(person("", "Sin Id"), &ctx()).await.unwrap();
    assert!(uuid::Uuid::parse_str(&created.id).is_ok());
}

#[tokio::test]
async fn soft_deleted_users_are_hidden_unless_requested() {
    let repos = relational().await;
    let now = Utc::now();
    let user = User {
        id: "u1".to_string(),
        name: "Ana".to_string(),
        username: "ana".to_string(),
        email: "ana@example.com".to_string(),
        password_hash: "hash".to_string(),
        status: true,
        created_at: now,
        updated_at: now,
        ..Default::default()
    };
    repos.users.create(user, &ctx()).await.unwrap();

    repos.users.delete("u1", DeleteOptions::soft(), &ctx()).await.unwrap();
    assert!(repos.users.find_by_id("u1", &ctx()).await.unwrap().is_none());

    let visible = repos.users.find_many(QueryOptions::new(), &ctx()).await.unwrap();
    assert!(visible.is_empty());

    let all = repos
        .users
        .find_many(QueryOptions::new().include_deleted(true), &ctx())
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
    assert!(all.data[0].deleted_at.is_some());

    repos.users.delete("u1", DeleteOptions::hard(), &ctx()).await.unwrap();
    let all = repos
        .users
        .find_many(QueryOptions::new().include_deleted(true), &ctx())
        .await
        .unwrap();
    assert!(all.is_empty());
}

#[tokio::test]
async fn unknown_fields_are_validation_errors() {
    let repos = relational().await;
    let err = repos
        .confirmations
        .find_many(QueryOptions::new().filter(Filter::new().eq("nickname", "x")), &ctx())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = repos
        .confirmations
        .find_many(QueryOptions::new().order_by("nickname", SortDirection::Asc), &ctx())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}
