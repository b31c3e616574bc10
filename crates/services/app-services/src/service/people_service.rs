//! People management.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use common::{AppResult, OptionExt};
use domain::{Person, PersonPatch, Role};
use persistence::query::Comparator;
use persistence::{
    BaseRepository, DeleteOptions, Filter, Page, QueryOptions, RepoCtx, SortDirection,
};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

const DEFAULT_PEOPLE_PAGE: u64 = 20;
const ORDERABLE: &[&str] = &["id", "name", "email", "role", "status"];

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePersonRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdatePersonRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub role: Option<Role>,
    pub status: Option<bool>,
}

impl From<UpdatePersonRequest> for PersonPatch {
    fn from(req: UpdatePersonRequest) -> Self {
        Self {
            name: req.name,
            email: req.email,
            role: req.role,
            status: req.status,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ListPeopleParams {
    /// Matched against name, email and role
    pub query: Option<String>,
    pub offset: Option<u64>,
    #[validate(range(min = 1, message = "limit must be at least 1"))]
    pub limit: Option<u64>,
    pub cursor: Option<String>,
    pub order_by: Option<String>,
    pub order: Option<String>,
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait PeopleService: Send + Sync {
    async fn create(&self, request: CreatePersonRequest) -> AppResult<Person>;

    async fn list(&self, params: ListPeopleParams) -> AppResult<Page<Person>>;

    async fn get(&self, id: &str) -> AppResult<Person>;

    async fn update(&self, id: &str, request: UpdatePersonRequest) -> AppResult<Person>;

    /// Permanently remove a person
    async fn delete(&self, id: &str) -> AppResult<()>;
}

pub struct PeopleManager {
    repo: Arc<dyn BaseRepository<Person>>,
}

impl PeopleManager {
    pub fn new(repo: Arc<dyn BaseRepository<Person>>) -> Self {
        Self { repo }
    }

    /// Free-text search over name, email and role.
    ///
    /// Stores without substring matching fall back to prefix matching.
    fn search_filter(&self, query: &str) -> Filter {
        let like = self.repo.capabilities().text_search_like;
        let text = |field: &str| {
            let condition = if like {
                Comparator::new().contains(query)
            } else {
                Comparator::new().starts_with(query)
            };
            Filter::new().field(field, condition)
        };

        let mut branches = vec![text("name"), text("email")];
        let roles = Role::matching(query);
        if !roles.is_empty() {
            branches.push(Filter::new().field(
                "role",
                Comparator::new().is_in(roles.iter().map(|r| r.as_str())),
            ));
        }
        Filter::new().or(branches)
    }
}

#[async_trait]
impl PeopleService for PeopleManager {
    async fn create(&self, request: CreatePersonRequest) -> AppResult<Person> {
        super::validate(&request)?;

        let id = Uuid::new_v4().to_string();
        let person = Person::new(id.clone(), request.name, request.email, request.role);
        self.repo.create_with_id(&id, person, &RepoCtx::default()).await
    }

    async fn list(&self, params: ListPeopleParams) -> AppResult<Page<Person>> {
        super::validate(&params)?;

        let order_by = super::order_field(params.order_by.as_deref(), ORDERABLE, "id")?;
        let direction = super::sort_direction(params.order.as_deref(), SortDirection::Asc)?;

        let mut options = QueryOptions::new()
            .order_by(order_by, direction)
            .paginate(super::pagination(
                params.limit,
                params.offset,
                params.cursor,
                DEFAULT_PEOPLE_PAGE,
            ));
        if let Some(query) = params.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            options = options.filter(self.search_filter(query));
        }

        self.repo.find_many(options, &RepoCtx::default()).await
    }

    async fn get(&self, id: &str) -> AppResult<Person> {
        self.repo
            .find_by_id(id, &RepoCtx::default())
            .await?
            .ok_or_not_found()
    }

    async fn update(&self, id: &str, request: UpdatePersonRequest) -> AppResult<Person> {
        super::validate(&request)?;
        self.repo
            .update(id, request.into(), &RepoCtx::default())
            .await
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        self.repo
            .delete(id, DeleteOptions::hard(), &RepoCtx::default())
            .await
    }
}
