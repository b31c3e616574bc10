//! Behaviour both adapters must share.

use common::AppError;
use domain::{ConfirmationPatch, PersonPatch};
use persistence::{
    with_transaction, DeleteOptions, Filter, QueryOptions, Repositories, SortDirection,
};
use serde_json::json;
use tokio_test::assert_ok;

use super::*;

/// Three days of confirmations for one rut; a two-day range returns two.
pub async fn range_filter(repos: &Repositories) {
    for (id, day) in [("r1", 1), ("r2", 2), ("r3", 3)] {
        repos
            .confirmations
            .create(confirmation(id, "12345678-9", "+56900000000", at(2024, 3, day, 12)), &ctx())
            .await
            .unwrap();
    }

    let filter = Filter::try_from(json!({
        "rut": "12345678-9",
        "created_datetime": {
            "between": ["2024-03-01T00:00:00Z", "2024-03-02T23:59:59.999Z"]
        }
    }))
    .unwrap();
    let page = repos
        .confirmations
        .find_many(
            QueryOptions::new()
                .filter(filter)
                .order_by("created_datetime", SortDirection::Desc),
            &ctx(),
        )
        .await
        .unwrap();

    assert_eq!(ids(&page.data), vec!["r2", "r1"]);
}

/// Nested `$or` on rut / phone matches two of three.
pub async fn or_filter(repos: &Repositories) {
    for (id, rut, phone) in [
        ("o1", "10000000-1", "+56910000001"),
        ("o2", "20000000-2", "+56920000002"),
        ("o3", "30000000-3", "+56930000003"),
    ] {
        repos
            .confirmations
            .create(confirmation(id, rut, phone, at(2024, 4, 1, 8)), &ctx())
            .await
            .unwrap();
    }

    let filter = Filter::try_from(json!({
        "$and": [
            { "$or": [ { "rut": "10000000-1" }, { "phone_number": "+56920000002" } ] }
        ]
    }))
    .unwrap();
    let page = repos
        .confirmations
        .find_many(QueryOptions::new().filter(filter), &ctx())
        .await
        .unwrap();

    assert_eq!(sorted_ids(&page.data), vec!["o1", "o2"]);
}

/// Upserting the same record twice leaves one record; unset fields keep their value.
pub async fn upsert_is_idempotent(repos: &Repositories) {
    let mut c = confirmation("u1", "40000000-4", "+56940000004", at(2024, 5, 1, 8));
    c.center_name = Some("Centro Este".to_string());

    let first = repos.confirmations.upsert("u1", c.clone(), &ctx()).await.unwrap();
    let second = repos.confirmations.upsert("u1", c.clone(), &ctx()).await.unwrap();
    assert_eq!(first, second);

    let mut partial = c.clone();
    partial.center_name = None;
    partial.patient_name = "Renamed".to_string();
    let merged = repos.confirmations.upsert("u1", partial, &ctx()).await.unwrap();
    assert_eq!(merged.patient_name, "Renamed");
    assert_eq!(merged.center_name.as_deref(), Some("Centro Este"));

    let all = repos
        .confirmations
        .find_many(QueryOptions::new().filter(Filter::new().eq("rut", "40000000-4")), &ctx())
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
}

pub async fn update_merges_and_reports_missing(repos: &Repositories) {
    repos.people.create(person("p1", "Ana"), &ctx()).await.unwrap();

    let patch = PersonPatch {
        name: Some("Ana María".to_string()),
        ..Default::default()
    };
    let updated = repos.people.update("p1", patch.clone(), &ctx()).await.unwrap();
    assert_eq!(updated.name, "Ana María");
    assert_eq!(updated.email, "p1@example.com");

    let err = repos.people.update("missing", patch, &ctx()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound));
}

pub async fn delete_of_missing_id_is_silent(repos: &Repositories) {
    assert_ok!(
        repos
            .people
            .delete("nobody", DeleteOptions::hard(), &ctx())
            .await
    );

    repos.people.create(person("p2", "Beto"), &ctx()).await.unwrap();
    assert_ok!(repos.people.delete("p2", DeleteOptions::hard(), &ctx()).await);
    assert!(repos.people.find_by_id("p2", &ctx()).await.unwrap().is_none());
}

/// A failing unit of work leaves nothing behind; a succeeding one keeps everything.
pub async fn transactions_are_atomic(repos: &Repositories) {
    let confirmations = repos.confirmations.clone();
    let messages = repos.messages.clone();
    let result: Result<(), AppError> = with_transaction!(repos.uow, |tx| {
        confirmations
            .create(confirmation("t1", "50000000-5", "+56950000005", at(2024, 6, 1, 8)), &tx)
            .await?;
        messages.create(message("tm1", "t1", at(2024, 6, 1, 9)), &tx).await?;
        Err(AppError::validation("abort"))
    });
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(repos.confirmations.find_by_id("t1", &ctx()).await.unwrap().is_none());
    assert!(repos.messages.find_by_id("tm1", &ctx()).await.unwrap().is_none());

    let confirmations = repos.confirmations.clone();
    let messages = repos.messages.clone();
    let saved = with_transaction!(repos.uow, |tx| {
        let c = confirmations
            .create(confirmation("t2", "50000000-5", "+56950000005", at(2024, 6, 2, 8)), &tx)
            .await?;
        messages.create(message("tm2", "t2", at(2024, 6, 2, 9)), &tx).await?;
        Ok(c)
    })
    .unwrap();
    assert_eq!(saved.id, "t2");
    assert!(repos.confirmations.find_by_id("t2", &ctx()).await.unwrap().is_some());
    assert!(repos.messages.find_by_id("tm2", &ctx()).await.unwrap().is_some());
}

pub async fn projection_keeps_id_and_selected_fields(repos: &Repositories) {
    seed_confirmations(repos).await;

    let found = repos
        .confirmations
        .find_one(
            QueryOptions::new()
                .filter(Filter::new().eq("rut", "22222222-2"))
                .select(["rut", "created_datetime"]),
            &ctx(),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(found.id, "c3");
    assert_eq!(found.rut, "22222222-2");
    assert_eq!(found.created_datetime, at(2024, 1, 3, 9));
    assert_eq!(found.patient_name, "");
    assert_eq!(found.center_name, None);
}

pub async fn find_one_follows_order(repos: &Repositories) {
    seed_confirmations(repos).await;

    let latest = repos
        .confirmations
        .find_one(
            QueryOptions::new()
                .filter(Filter::new().eq("rut", "11111111-1"))
                .order_by("created_datetime", SortDirection::Desc),
            &ctx(),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.id, "c2");

    let none = repos
        .confirmations
        .find_one(QueryOptions::new().filter(Filter::new().eq("rut", "0-0")), &ctx())
        .await
        .unwrap();
    assert!(none.is_none());
}

pub async fn patch_with_timestamps_round_trips(repos: &Repositories) {
    repos
        .confirmations
        .create(confirmation("d1", "60000000-6", "+56960000006", at(2024, 7, 1, 8)), &ctx())
        .await
        .unwrap();

    let patch = ConfirmationPatch {
        delivered_datetime: Some(at(2024, 7, 1, 10)),
        ..Default::default()
    };
    let updated = repos.confirmations.update("d1", patch, &ctx()).await.unwrap();
    assert_eq!(updated.delivered_datetime, Some(at(2024, 7, 1, 10)));

    let delivered = repos
        .confirmations
        .find_many(
            QueryOptions::new().filter(
                Filter::try_from(json!({ "delivered_datetime": { "gte": "2024-07-01T09:00:00Z" } }))
                    .unwrap(),
            ),
            &ctx(),
        )
        .await
        .unwrap();
    assert_eq!(ids(&delivered.data), vec!["d1"]);
}

pub async fn message_variables_survive(repos: &Repositories) {
    repos
        .confirmations
        .create(confirmation("v1", "70000000-7", "+56970000007", at(2024, 8, 1, 8)), &ctx())
        .await
        .unwrap();

    let mut m = message("vm1", "v1", at(2024, 8, 1, 9));
    m.variables = Some(json!({ "name": "Ana", "slots": [1, 2] }));
    repos.messages.create(m.clone(), &ctx()).await.unwrap();

    let stored = repos.messages.find_by_id("vm1", &ctx()).await.unwrap().unwrap();
    assert_eq!(stored, m);
}
