//! User accounts.
//!
//! Passwords are hashed with Argon2 before they reach a repository and are never
//! returned; every read hands out a [`UserResponse`].

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use common::{AppError, AppResult};
use domain::{Password, Role, User, UserPatch, UserResponse, DEFAULT_PAGE_SIZE};
use persistence::{
    BaseRepository, DeleteOptions, Filter, Page, QueryOptions, RepoCtx, SortDirection,
};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
    #[serde(default)]
    pub lastname: String,
    #[validate(length(min = 1, message = "Username cannot be empty"))]
    pub username: String,
    #[serde(default)]
    pub document_id: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
}

/// Fields left empty keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub lastname: Option<String>,
    pub username: Option<String>,
    pub document_id: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub password: Option<String>,
    pub status: Option<bool>,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ListUsersParams {
    pub offset: Option<u64>,
    #[validate(range(min = 1, message = "limit must be at least 1"))]
    pub limit: Option<u64>,
    pub cursor: Option<String>,
    #[serde(default)]
    pub include_deleted: bool,
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserService: Send + Sync {
    /// Register a user; the email must not be taken, even by a deleted user
    async fn create(&self, request: CreateUserRequest) -> AppResult<UserResponse>;

    /// Active user by id
    async fn get(&self, id: &str) -> AppResult<UserResponse>;

    /// Newest first
    async fn list(&self, params: ListUsersParams) -> AppResult<Page<UserResponse>>;

    async fn update(&self, id: &str, request: UpdateUserRequest) -> AppResult<UserResponse>;

    /// Soft delete where the store supports it, hard delete otherwise
    async fn delete(&self, id: &str) -> AppResult<()>;
}

pub struct UserManager {
    repo: Arc<dyn BaseRepository<User>>,
}

impl UserManager {
    pub fn new(repo: Arc<dyn BaseRepository<User>>) -> Self {
        Self { repo }
    }

    async fn email_taken(&self, email: &str) -> AppResult<bool> {
        let options = QueryOptions::new()
            .filter(Filter::new().eq("email", email))
            .include_deleted(true);
        Ok(self
            .repo
            .find_one(options, &RepoCtx::default())
            .await?
            .is_some())
    }
}

/// `Some` only for values that carry something.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[async_trait]
impl UserService for UserManager {
    async fn create(&self, request: CreateUserRequest) -> AppResult<UserResponse> {
        super::validate(&request)?;

        if self.email_taken(&request.email).await? {
            return Err(AppError::conflict("Email"));
        }

        let password = Password::new(&request.password)?;
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();
        let user = User {
            id: id.clone(),
            name: request.name,
            lastname: request.lastname,
            username: request.username,
            document_id: request.document_id,
            email: request.email,
            password_hash: password.into_string(),
            status: true,
            role: request.role,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let created = self
            .repo
            .create_with_id(&id, user, &RepoCtx::default())
            .await?;
        tracing::info!(user_id = %created.id, "User created");
        Ok(created.into())
    }

    async fn get(&self, id: &str) -> AppResult<UserResponse> {
        match self.repo.find_by_id(id, &RepoCtx::default()).await? {
            Some(user) if !user.is_deleted() => Ok(user.into()),
            _ => Err(AppError::NotFound),
        }
    }

    async fn list(&self, params: ListUsersParams) -> AppResult<Page<UserResponse>> {
        super::validate(&params)?;

        let options = QueryOptions::new()
            .order_by("created_at", SortDirection::Desc)
            .include_deleted(params.include_deleted)
            .paginate(super::pagination(
                params.limit,
                params.offset,
                params.cursor,
                DEFAULT_PAGE_SIZE,
            ));
        let page = self.repo.find_many(options, &RepoCtx::default()).await?;
        Ok(page.map(UserResponse::from))
    }

    async fn update(&self, id: &str, request: UpdateUserRequest) -> AppResult<UserResponse> {
        super::validate(&request)?;

        let password_hash = match non_empty(request.password) {
            Some(plain) => Some(Password::new(&plain)?.into_string()),
            None => None,
        };
        let patch = UserPatch {
            name: non_empty(request.name),
            lastname: non_empty(request.lastname),
            username: non_empty(request.username),
            document_id: non_empty(request.document_id),
            email: non_empty(request.email),
            password_hash,
            status: request.status,
            role: request.role,
            updated_at: Some(Utc::now()),
        };

        let updated = self.repo.update(id, patch, &RepoCtx::default()).await?;
        Ok(updated.into())
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let options = if self.repo.capabilities().soft_delete {
            DeleteOptions::soft()
        } else {
            DeleteOptions::hard()
        };
        self.repo.delete(id, options, &RepoCtx::default()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use persistence::{MockBaseRepository, RepoCapabilities};
    use tokio_test::assert_ok;

    fn request() -> CreateUserRequest {
        CreateUserRequest {
            name: "Ana".to_string(),
            lastname: "Rojas".to_string(),
            username: "arojas".to_string(),
            document_id: "11.111.111-1".to_string(),
            email: "ana@example.com".to_string(),
            password: "correct horse".to_string(),
            role: Some(Role::Admin),
        }
    }

    #[tokio::test]
    async fn create_hashes_the_password() {
        let mut repo = MockBaseRepository::<User>::new();
        repo.expect_find_one()
            .withf(|options, _| options.include_deleted)
            .returning(|_, _| Ok(None));
        repo.expect_create_with_id()
            .withf(|id, user, _| {
                user.id == *id
                    && user.status
                    && user.password_hash != "correct horse"
                    && Password::from_hash(user.password_hash.clone()).verify("correct horse")
            })
            .times(1)
            .returning(|_, u, _| Ok(u));

        let created = UserManager::new(Arc::new(repo)).create(request()).await.unwrap();
        assert_eq!(created.email, "ana@example.com");
    }

    #[tokio::test]
    async fn create_rejects_taken_email() {
        let mut repo = MockBaseRepository::<User>::new();
        repo.expect_find_one()
            .returning(|_, _| Ok(Some(User::default())));
        repo.expect_create_with_id().never();

        let err = UserManager::new(Arc::new(repo)).create(request()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(m) if m == "Email"));
    }

    #[tokio::test]
    async fn create_rejects_short_password() {
        let mut repo = MockBaseRepository::<User>::new();
        repo.expect_find_one().returning(|_, _| Ok(None));

        let mut req = request();
        req.password = "short".to_string();
        let err = UserManager::new(Arc::new(repo)).create(req).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn deleted_users_are_not_found() {
        let mut repo = MockBaseRepository::<User>::new();
        repo.expect_find_by_id().returning(|_, _| {
            Ok(Some(User {
                deleted_at: Some(Utc::now()),
                ..Default::default()
            }))
        });

        let err = UserManager::new(Arc::new(repo)).get("u1").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[tokio::test]
    async fn update_skips_empty_fields() {
        let mut repo = MockBaseRepository::<User>::new();
        repo.expect_update()
            .withf(|_, patch, _| {
                patch.name.is_none()
                    && patch.password_hash.is_none()
                    && patch.lastname.as_deref() == Some("Soto")
                    && patch.updated_at.is_some()
            })
            .times(1)
            .returning(|_, _, _| Ok(User::default()));

        UserManager::new(Arc::new(repo))
            .update(
                "u1",
                UpdateUserRequest {
                    name: Some("  ".to_string()),
                    lastname: Some("Soto".to_string()),
                    password: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn delete_follows_store_capabilities() {
        let mut relational = MockBaseRepository::<User>::new();
        relational
            .expect_capabilities()
            .return_const(RepoCapabilities::RELATIONAL);
        relational
            .expect_delete()
            .withf(|_, options, _| !options.hard)
            .times(1)
            .returning(|_, _, _| Ok(()));
        assert_ok!(UserManager::new(Arc::new(relational)).delete("u1").await);

        let mut document = MockBaseRepository::<User>::new();
        document
            .expect_capabilities()
            .return_const(RepoCapabilities::DOCUMENT);
        document
            .expect_delete()
            .withf(|_, options, _| options.hard)
            .times(1)
            .returning(|_, _, _| Ok(()));
        assert_ok!(UserManager::new(Arc::new(document)).delete("u1").await);
    }
}
