//! The same filter selects the same records on both adapters.

mod support;

use persistence::{Filter, QueryOptions, Repositories};
use serde_json::json;

use support::*;

async fn matching(repos: &Repositories, filter: &serde_json::Value) -> Vec<String> {
    let filter = Filter::try_from(filter.clone()).unwrap();
    let page = repos
        .confirmations
        .find_many(QueryOptions::new().filter(filter), &ctx())
        .await
        .unwrap();
    sorted_ids(&page.data)
}

#[tokio::test]
async fn adapters_agree_on_every_portable_operator() {
    let relational = relational().await;
    let document = document().await;
    seed_confirmations(&relational).await;
    seed_confirmations(&document).await;

    let cases = [
        (json!({}), vec!["c1", "c2", "c3", "c4", "c5", "c6"]),
        (json!({ "rut": "11111111-1" }), vec!["c1", "c2"]),
        (json!({ "rut": { "ne": "11111111-1" } }), vec!["c3", "c4", "c5", "c6"]),
        (json!({ "center_name": { "ne": "Centro Norte" } }), vec!["c2"]),
        (json!({ "center_name": null }), vec!["c4", "c5", "c6"]),
        (json!({ "center_name": { "ne": null } }), vec!["c1", "c2", "c3"]),
        (json!({ "center_name": { "exists": false } }), vec!["c4", "c5", "c6"]),
        (json!({ "start_datetime": { "exists": true } }), vec!["c4", "c5"]),
        (
            json!({ "created_datetime": { "gt": "2024-01-02T09:00:00Z", "lte": "2024-01-04T09:00:00Z" } }),
            vec!["c3", "c4"],
        ),
        (
            json!({ "created_datetime": { "between": ["2024-01-05T00:00:00Z", "2024-01-31T00:00:00Z"] } }),
            vec!["c5", "c6"],
        ),
        (json!({ "start_datetime": { "lt": "2024-02-02T00:00:00Z" } }), vec!["c4"]),
        (json!({ "rut": { "in": ["22222222-2", "33333333-3", "0-0"] } }), vec!["c3", "c4"]),
        (json!({ "rut": { "in": [] } }), vec![]),
        (json!({ "center_name": { "nin": ["Centro Sur"] } }), vec!["c1", "c3"]),
        (json!({ "rut": { "nin": [] } }), vec!["c1", "c2", "c3", "c4", "c5", "c6"]),
        (json!({ "phone_number": { "startsWith": "+569222" } }), vec!["c5", "c6"]),
        (
            json!({ "$or": [ { "rut": "22222222-2" }, { "phone_number": "+56922220006" } ] }),
            vec!["c3", "c6"],
        ),
        (
            json!({ "$and": [ { "rut": "11111111-1" }, { "center_name": "Centro Sur" } ] }),
            vec!["c2"],
        ),
        (json!({ "$or": [] }), vec![]),
        (json!({ "$not": { "rut": "11111111-1" } }), vec!["c3", "c4", "c5", "c6"]),
        (json!({ "$not": { "center_name": "Centro Norte" } }), vec!["c2", "c4", "c5", "c6"]),
        (
            json!({ "$not": { "center_name": { "in": ["Centro Norte", "Centro Sur"] } } }),
            vec!["c4", "c5", "c6"],
        ),
        (
            json!({ "$not": { "center_name": { "ne": "Centro Norte" } } }),
            vec!["c1", "c3", "c4", "c5", "c6"],
        ),
        (
            json!({ "$not": { "start_datetime": { "lt": "2024-02-02T00:00:00Z" } } }),
            vec!["c1", "c2", "c3", "c5", "c6"],
        ),
        (
            json!({ "$not": { "start_datetime": { "between": ["2024-02-01T00:00:00Z", "2024-02-01T23:00:00Z"] } } }),
            vec!["c1", "c2", "c3", "c5", "c6"],
        ),
        (json!({ "$not": { "center_name": null } }), vec!["c1", "c2", "c3"]),
        (
            json!({ "$not": { "$not": { "center_name": "Centro Sur" } } }),
            vec!["c2"],
        ),
        (
            json!({
                "service_name": "Cardiology",
                "$or": [
                    { "$and": [ { "rut": "11111111-1" }, { "center_name": "Centro Norte" } ] },
                    { "$not": { "created_datetime": { "lt": "2024-01-06T00:00:00Z" } } }
                ]
            }),
            vec!["c1", "c6"],
        ),
    ];

    for (filter, expected) in cases {
        let expected: Vec<String> = expected.into_iter().map(String::from).collect();
        assert_eq!(matching(&relational, &filter).await, expected, "relational: {}", filter);
        assert_eq!(matching(&document, &filter).await, expected, "document: {}", filter);
    }
}
