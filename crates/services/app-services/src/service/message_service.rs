//! Conversation messages of a confirmation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use common::{AppError, AppResult};
use domain::{Confirmation, Message, DEFAULT_PAGE_SIZE};
use persistence::{
    with_transaction, BaseRepository, Filter, Page, QueryOptions, RepoCtx, SortDirection,
    UnitOfWork,
};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ListMessagesParams {
    #[validate(length(min = 1, message = "confirmation_id is required"))]
    pub confirmation_id: String,
    pub offset: Option<u64>,
    #[validate(range(min = 1, message = "limit must be at least 1"))]
    pub limit: Option<u64>,
    pub cursor: Option<String>,
}

impl ListMessagesParams {
    pub fn new(confirmation_id: impl Into<String>) -> Self {
        Self {
            confirmation_id: confirmation_id.into(),
            offset: None,
            limit: None,
            cursor: None,
        }
    }
}

/// A confirmation together with the messages exchanged for it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewConversation {
    pub confirmation: Confirmation,
    pub messages: Vec<Message>,
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait MessageService: Send + Sync {
    /// Messages of one confirmation, newest first.
    async fn list(&self, params: ListMessagesParams) -> AppResult<Page<Message>>;

    /// Store a confirmation and its messages atomically.
    ///
    /// Message `confirmation_id`s are overwritten with the id of the stored confirmation.
    async fn record_conversation(
        &self,
        conversation: NewConversation,
    ) -> AppResult<(Confirmation, Vec<Message>)>;
}

pub struct MessageManager {
    messages: Arc<dyn BaseRepository<Message>>,
    confirmations: Arc<dyn BaseRepository<Confirmation>>,
    uow: Arc<dyn UnitOfWork>,
}

impl MessageManager {
    pub fn new(
        messages: Arc<dyn BaseRepository<Message>>,
        confirmations: Arc<dyn BaseRepository<Confirmation>>,
        uow: Arc<dyn UnitOfWork>,
    ) -> Self {
        Self {
            messages,
            confirmations,
            uow,
        }
    }
}

#[async_trait]
impl MessageService for MessageManager {
    async fn list(&self, params: ListMessagesParams) -> AppResult<Page<Message>> {
        super::validate(&params)?;

        let options = QueryOptions::new()
            .filter(Filter::new().eq("confirmation_id", params.confirmation_id.as_str()))
            .order_by("timestamp", SortDirection::Desc)
            .paginate(super::pagination(
                params.limit,
                params.offset,
                params.cursor,
                DEFAULT_PAGE_SIZE,
            ));
        self.messages.find_many(options, &RepoCtx::default()).await
    }

    async fn record_conversation(
        &self,
        conversation: NewConversation,
    ) -> AppResult<(Confirmation, Vec<Message>)> {
        if conversation.confirmation.rut.trim().is_empty() {
            return Err(AppError::validation("confirmation rut is required"));
        }

        let confirmations = Arc::clone(&self.confirmations);
        let messages = Arc::clone(&self.messages);
        let NewConversation {
            confirmation,
            messages: pending,
        } = conversation;

        let (stored, written) = with_transaction!(self.uow, |ctx| {
            let stored = confirmations.create(confirmation, &ctx).await?;
            let mut written = Vec::with_capacity(pending.len());
            for mut message in pending {
                message.confirmation_id = stored.id.clone();
                written.push(messages.create(message, &ctx).await?);
            }
            Ok((stored, written))
        })?;

        tracing::info!(
            confirmation_id = %stored.id,
            messages = written.len(),
            "Conversation recorded"
        );
        Ok((stored, written))
    }
}
