//! Backend selection.
//!
//! [`Repositories`] bundles one repository per entity plus the matching unit of
//! work, all behind the port traits. Which adapter backs them is decided once,
//! from [`PersistenceConfig::backend`].

use std::sync::Arc;

use common::{AppError, AppResult, PersistenceConfig, StorageBackend};
use domain::{AccessToken, Confirmation, Generic, Message, Person, User};

use crate::document::{self, DocumentRepository, DocumentUnitOfWork, SurrealClient};
use crate::mappers::document::{
    AccessTokenDocMapper, ConfirmationDocMapper, GenericDocMapper, MessageDocMapper,
    PersonDocMapper, UserDocMapper,
};
use crate::mappers::relational::{
    AccessTokenMapper, ConfirmationMapper, GenericMapper, MessageMapper, PersonMapper, UserMapper,
};
use crate::ports::{BaseRepository, RepoCapabilities, UnitOfWork};
use crate::relational::entities::{access_token, confirmation, generic, message, person, user};
use crate::relational::{Database, RelationalRepository, RelationalUnitOfWork};

#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn BaseRepository<User>>,
    pub generics: Arc<dyn BaseRepository<Generic>>,
    pub confirmations: Arc<dyn BaseRepository<Confirmation>>,
    pub messages: Arc<dyn BaseRepository<Message>>,
    pub people: Arc<dyn BaseRepository<Person>>,
    pub access_tokens: Arc<dyn BaseRepository<AccessToken>>,
    pub uow: Arc<dyn UnitOfWork>,
}

impl Repositories {
    /// Connect to the configured backend and wire every repository to it.
    ///
    /// The relational store is migrated and the document store has its schema
    /// initialised before the repositories are handed out.
    pub async fn connect(config: &PersistenceConfig) -> AppResult<Self> {
        tracing::info!(backend = %config.backend, "Initializing persistence");
        match config.backend {
            StorageBackend::Relational => {
                let db = Database::connect(&config.database)
                    .await
                    .map_err(|e| AppError::service_unavailable(format!("database: {}", e)))?;
                Ok(Self::relational(&db))
            }
            StorageBackend::Document => {
                let client = document::connect(&config.document).await?;
                document::init_schema(&client).await?;
                Ok(Self::document(client))
            }
        }
    }

    pub fn relational(db: &Database) -> Self {
        let conn = db.get_connection();
        Self {
            users: Arc::new(RelationalRepository::<user::Entity, UserMapper>::new(conn.clone())),
            generics: Arc::new(RelationalRepository::<generic::Entity, GenericMapper>::new(
                conn.clone(),
            )),
            confirmations: Arc::new(
                RelationalRepository::<confirmation::Entity, ConfirmationMapper>::new(conn.clone()),
            ),
            messages: Arc::new(RelationalRepository::<message::Entity, MessageMapper>::new(
                conn.clone(),
            )),
            people: Arc::new(RelationalRepository::<person::Entity, PersonMapper>::new(
                conn.clone(),
            )),
            access_tokens: Arc::new(
                RelationalRepository::<access_token::Entity, AccessTokenMapper>::new(conn.clone()),
            ),
            uow: Arc::new(RelationalUnitOfWork::new(conn)),
        }
    }

    pub fn document(client: SurrealClient) -> Self {
        Self {
            users: Arc::new(DocumentRepository::<UserDocMapper>::new(client.clone())),
            generics: Arc::new(DocumentRepository::<GenericDocMapper>::new(client.clone())),
            confirmations: Arc::new(DocumentRepository::<ConfirmationDocMapper>::new(
                client.clone(),
            )),
            messages: Arc::new(DocumentRepository::<MessageDocMapper>::new(client.clone())),
            people: Arc::new(DocumentRepository::<PersonDocMapper>::new(client.clone())),
            access_tokens: Arc::new(DocumentRepository::<AccessTokenDocMapper>::new(
                client.clone(),
            )),
            uow: Arc::new(DocumentUnitOfWork::new(client)),
        }
    }

    pub fn capabilities(&self) -> RepoCapabilities {
        self.uow.capabilities()
    }
}
