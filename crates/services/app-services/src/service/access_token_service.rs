//! Opaque access tokens.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use common::{AppResult, OptionExt};
use domain::AccessToken;
use persistence::{BaseRepository, DeleteOptions, Filter, QueryOptions, RepoCtx};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AccessTokenService: Send + Sync {
    /// Store and return a fresh random token
    async fn issue(&self) -> AppResult<AccessToken>;

    /// Whether `token` was issued and not revoked
    async fn validate(&self, token: &str) -> AppResult<bool>;

    async fn revoke(&self, token: &str) -> AppResult<()>;
}

pub struct AccessTokenManager {
    repo: Arc<dyn BaseRepository<AccessToken>>,
}

impl AccessTokenManager {
    pub fn new(repo: Arc<dyn BaseRepository<AccessToken>>) -> Self {
        Self { repo }
    }

    async fn find(&self, token: &str) -> AppResult<Option<AccessToken>> {
        if token.is_empty() {
            return Ok(None);
        }
        self.repo
            .find_one(
                QueryOptions::new().filter(Filter::new().eq("token", token)),
                &RepoCtx::default(),
            )
            .await
    }
}

/// 256 random bits, hex encoded.
fn random_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

#[async_trait]
impl AccessTokenService for AccessTokenManager {
    async fn issue(&self) -> AppResult<AccessToken> {
        let id = Uuid::new_v4().to_string();
        let token = AccessToken {
            id: id.clone(),
            token: random_token(),
            created_at: Utc::now(),
        };
        self.repo
            .create_with_id(&id, token, &RepoCtx::default())
            .await
    }

    async fn validate(&self, token: &str) -> AppResult<bool> {
        Ok(self.find(token).await?.is_some())
    }

    async fn revoke(&self, token: &str) -> AppResult<()> {
        let stored = self.find(token).await?.ok_or_not_found()?;
        self.repo
            .delete(&stored.id, DeleteOptions::hard(), &RepoCtx::default())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::AppError;
    use persistence::MockBaseRepository;
    use tokio_test::assert_ok;

    #[test]
    fn tokens_are_long_and_distinct() {
        let a = random_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, random_token());
    }

    #[tokio::test]
    async fn issue_stores_the_token() {
        let mut repo = MockBaseRepository::<AccessToken>::new();
        repo.expect_create_with_id()
            .withf(|id, t, _| t.id == *id && t.token.len() == 64)
            .times(1)
            .returning(|_, t, _| Ok(t));

        let token = AccessTokenManager::new(Arc::new(repo)).issue().await.unwrap();
        assert!(!token.token.is_empty());
    }

    #[tokio::test]
    async fn empty_tokens_never_validate() {
        let mut repo = MockBaseRepository::<AccessToken>::new();
        repo.expect_find_one().never();

        let valid = AccessTokenManager::new(Arc::new(repo)).validate("").await.unwrap();
        assert!(!valid);
    }

    #[tokio::test]
    async fn revoke_deletes_by_id() {
        let mut repo = MockBaseRepository::<AccessToken>::new();
        repo.expect_find_one().returning(|_, _| {
            Ok(Some(AccessToken {
                id: "t1".to_string(),
                token: "abc".to_string(),
                ..Default::default()
            }))
        });
        repo.expect_delete()
            .withf(|id, options, _| id == "t1" && options.hard)
            .times(1)
            .returning(|_, _, _| Ok(()));

        assert_ok!(AccessTokenManager::new(Arc::new(repo)).revoke("abc").await);
    }

    #[tokio::test]
    async fn revoking_an_unknown_token_is_not_found() {
        let mut repo = MockBaseRepository::<AccessToken>::new();
        repo.expect_find_one().returning(|_, _| Ok(None));

        let err = AccessTokenManager::new(Arc::new(repo))
            .revoke("missing")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }
}
