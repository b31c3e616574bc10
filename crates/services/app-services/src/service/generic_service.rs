//! Generic records with a workflow status.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use common::{AppResult, OptionExt};
use domain::{Generic, GenericPatch};
use persistence::{BaseRepository, DeleteOptions, QueryOptions, RepoCtx};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateGenericRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateGenericRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, message = "Status cannot be empty"))]
    pub status: Option<String>,
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait GenericService: Send + Sync {
    /// New record, pending and dated now
    async fn create(&self, request: CreateGenericRequest) -> AppResult<Generic>;

    async fn get(&self, id: &str) -> AppResult<Generic>;

    async fn list(&self) -> AppResult<Vec<Generic>>;

    /// Apply the given fields and move the date to now
    async fn update(&self, id: &str, request: UpdateGenericRequest) -> AppResult<Generic>;

    async fn delete(&self, id: &str) -> AppResult<()>;
}

pub struct GenericManager {
    repo: Arc<dyn BaseRepository<Generic>>,
}

impl GenericManager {
    pub fn new(repo: Arc<dyn BaseRepository<Generic>>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl GenericService for GenericManager {
    async fn create(&self, request: CreateGenericRequest) -> AppResult<Generic> {
        super::validate(&request)?;

        let id = Uuid::new_v4().to_string();
        let generic = Generic::pending(id.clone(), request.name, request.description);
        self.repo
            .create_with_id(&id, generic, &RepoCtx::default())
            .await
    }

    async fn get(&self, id: &str) -> AppResult<Generic> {
        self.repo
            .find_by_id(id, &RepoCtx::default())
            .await?
            .ok_or_not_found()
    }

    async fn list(&self) -> AppResult<Vec<Generic>> {
        let page = self
            .repo
            .find_many(QueryOptions::new(), &RepoCtx::default())
            .await?;
        Ok(page.data)
    }

    async fn update(&self, id: &str, request: UpdateGenericRequest) -> AppResult<Generic> {
        super::validate(&request)?;

        let patch = GenericPatch {
            name: request.name,
            description: request.description,
            date: Some(Utc::now()),
            status: request.status,
        };
        self.repo.update(id, patch, &RepoCtx::default()).await
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        self.repo
            .delete(id, DeleteOptions::hard(), &RepoCtx::default())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::AppError;
    use domain::GENERIC_STATUS_PENDING;
    use persistence::{MockBaseRepository, Page};

    #[tokio::test]
    async fn create_starts_pending() {
        let mut repo = MockBaseRepository::<Generic>::new();
        repo.expect_create_with_id()
            .withf(|id, g, _| g.id == *id && g.status == GENERIC_STATUS_PENDING)
            .times(1)
            .returning(|_, g, _| Ok(g));

        let generic = GenericManager::new(Arc::new(repo))
            .create(CreateGenericRequest {
                name: "Report".to_string(),
                description: "Monthly".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(generic.name, "Report");
    }

    #[tokio::test]
    async fn update_refreshes_the_date() {
        let mut repo = MockBaseRepository::<Generic>::new();
        repo.expect_update()
            .withf(|id, patch, _| {
                id == "g1"
                    && patch.date.is_some()
                    && patch.status.as_deref() == Some("Listo")
                    && patch.name.is_none()
            })
            .times(1)
            .returning(|id, patch, _| {
                Ok(Generic {
                    id: id.to_string(),
                    status: patch.status.unwrap_or_default(),
                    ..Default::default()
                })
            });

        let updated = GenericManager::new(Arc::new(repo))
            .update(
                "g1",
                UpdateGenericRequest {
                    status: Some("Listo".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, "Listo");
    }

    #[tokio::test]
    async fn get_and_list() {
        let mut repo = MockBaseRepository::<Generic>::new();
        repo.expect_find_by_id().returning(|_, _| Ok(None));
        repo.expect_find_many()
            .returning(|_, _| Ok(Page::new(vec![Generic::default(), Generic::default()])));
        let svc = GenericManager::new(Arc::new(repo));

        assert!(matches!(svc.get("g1").await, Err(AppError::NotFound)));
        assert_eq!(svc.list().await.unwrap().len(), 2);
    }
}
