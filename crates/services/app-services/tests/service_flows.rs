//! Services running on real in-memory stores of both kinds.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use common::{AppError, DatabaseConfig, DocumentStoreConfig, ServiceConfig};
use domain::{Confirmation, Message, Role, Sender};
use persistence::relational::Database;
use persistence::{document, RepoCtx, Repositories};

use app_services::{
    ConfirmationManager, ConfirmationService, CreatePersonRequest, CreateUserRequest,
    ListMessagesParams, ListPeopleParams, MessageManager, MessageService, NewConversation,
    PeopleManager, PeopleService, SearchConfirmationsParams, SearchMode, UserManager,
    UserService,
};

async fn relational() -> Repositories {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        sql_logging: false,
    };
    let db = Database::connect(&config).await.expect("sqlite connect");
    Repositories::relational(&db)
}

async fn document() -> Repositories {
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

async fn backends() -> Vec<(&'static str, Repositories)> {
    vec![("relational", relational().await), ("document", document().await)]
}

fn confirmation(id: &str, rut: &str, day: u32) -> Confirmation {
    Confirmation {
        id: id.to_string(),
        patient_name: format!("Patient {}", id),
        rut: rut.to_string(),
        phone_number: "+56911111111".to_string(),
        service_name: "Cardiology".to_string(),
        // noon in UTC-3
        created_datetime: Utc.with_ymd_and_hms(2024, 1, day, 15, 0, 0).unwrap(),
        ..Default::default()
    }
}

#[tokio::test]
async fn confirmation_search_by_rut_and_local_days() {
    for (name, repos) in backends().await {
        for (id, day) in [("c1", 1), ("c2", 2), ("c3", 3)] {
            repos
                .confirmations
                .create(confirmation(id, "11.111.111-1", day), &RepoCtx::default())
                .await
                .unwrap();
        }
        repos
            .confirmations
            .create(confirmation("c4", "22.222.222-2", 2), &RepoCtx::default())
            .await
            .unwrap();

        let svc = ConfirmationManager::new(repos.confirmations.clone(), ServiceConfig::default());

        let mut params = SearchConfirmationsParams::new(SearchMode::Rut, "11.111.111-1");
        params.start_date = Some("2024-01-02".to_string());
        params.end_date = Some("2024-01-03".to_string());
        let page = svc.search(params).await.unwrap();
        let ids: Vec<_> = page.data.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c3", "c2"], "{}", name);

        let page = svc
            .search(SearchConfirmationsParams::new(SearchMode::Rut, "11.111.111-1"))
            .await
            .unwrap();
        assert_eq!(page.len(), 3, "{}", name);
    }
}

#[tokio::test]
async fn conversations_are_recorded_and_listed_newest_first() {
    for (name, repos) in backends().await {
        let svc = MessageManager::new(
            repos.messages.clone(),
            repos.confirmations.clone(),
            repos.uow.clone(),
        );

        let messages = (0..3)
            .map(|i| Message {
                sender: Sender::Bot,
                text: Some(format!("hello {}", i)),
                timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 10 + i, 0, 0).unwrap(),
                ..Default::default()
            })
            .collect();
        let (stored, written) = svc
            .record_conversation(NewConversation {
                confirmation: confirmation("", "11.111.111-1", 1),
                messages,
            })
            .await
            .unwrap();
        assert!(!stored.id.is_empty(), "{}", name);
        assert!(written.iter().all(|m| m.confirmation_id == stored.id), "{}", name);

        let page = svc.list(ListMessagesParams::new(stored.id.clone())).await.unwrap();
        let texts: Vec<_> = page.data.iter().filter_map(|m| m.text.as_deref()).collect();
        assert_eq!(texts, vec!["hello 2", "hello 1", "hello 0"], "{}", name);
    }
}

#[tokio::test]
async fn people_search_by_name_or_role() {
    for (name, repos) in backends().await {
        let svc = PeopleManager::new(repos.people.clone());
        for (person, role) in [("Ana", Role::Admin), ("Andres", Role::User), ("Beatriz", Role::User)] {
            svc.create(CreatePersonRequest {
                name: person.to_string(),
                email: format!("{}@example.com", person.to_lowercase()),
                role,
            })
            .await
            .unwrap();
        }

        let found = svc
            .list(ListPeopleParams {
                query: Some("An".to_string()),
                order_by: Some("name".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        let names: Vec<_> = found.data.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Ana", "Andres"], "{}", name);

        let admins = svc
            .list(ListPeopleParams {
                query: Some("admin".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(admins.len(), 1, "{}", name);
        assert_eq!(admins.data[0].name, "Ana", "{}", name);
    }
}

#[tokio::test]
async fn user_lifecycle() {
    for (name, repos) in backends().await {
        let svc = UserManager::new(repos.users.clone());
        let request = CreateUserRequest {
            name: "Ana".to_string(),
            lastname: "Rojas".to_string(),
            username: "arojas".to_string(),
            document_id: "11.111.111-1".to_string(),
            email: "ana@example.com".to_string(),
            password: "correct horse".to_string(),
            role: None,
        };

        let created = svc.create(request.clone()).await.unwrap();
        assert!(created.status, "{}", name);
        assert!(
            matches!(svc.create(request).await, Err(AppError::Conflict(_))),
            "{}",
            name
        );

        svc.delete(&created.id).await.unwrap();
        assert!(
            matches!(svc.get(&created.id).await, Err(AppError::NotFound)),
            "{}",
            name
        );
    }
}

#[tokio::test]
async fn services_share_one_repository_set() {
    let repos = relational().await;
    let people: Arc<dyn PeopleService> = Arc::new(PeopleManager::new(repos.people.clone()));
    let created = people
        .create(CreatePersonRequest {
            name: "Carla".to_string(),
            email: "carla@example.com".to_string(),
            role: Role::User,
        })
        .await
        .unwrap();

    assert_eq!(people.get(&created.id).await.unwrap().name, "Carla");
    people.delete(&created.id).await.unwrap();
    assert!(matches!(people.get(&created.id).await, Err(AppError::NotFound)));
}
