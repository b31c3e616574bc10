//! Service traits and their repository-backed implementations.

mod access_token_service;
mod confirmation_service;
mod generic_service;
mod message_service;
mod people_service;
mod user_service;

pub use access_token_service::{AccessTokenManager, AccessTokenService};
pub use confirmation_service::{
    ConfirmationManager, ConfirmationService, DateField, SearchConfirmationsParams, SearchMode,
};
pub use generic_service::{
    CreateGenericRequest, GenericManager, GenericService, UpdateGenericRequest,
};
pub use message_service::{ListMessagesParams, MessageManager, MessageService, NewConversation};
pub use people_service::{
    CreatePersonRequest, ListPeopleParams, PeopleManager, PeopleService, UpdatePersonRequest,
};
pub use user_service::{
    CreateUserRequest, ListUsersParams, UpdateUserRequest, UserManager, UserService,
};

#[cfg(any(test, feature = "test-utils"))]
pub use access_token_service::MockAccessTokenService;
#[cfg(any(test, feature = "test-utils"))]
pub use confirmation_service::MockConfirmationService;
#[cfg(any(test, feature = "test-utils"))]
pub use generic_service::MockGenericService;
#[cfg(any(test, feature = "test-utils"))]
pub use message_service::MockMessageService;
#[cfg(any(test, feature = "test-utils"))]
pub use people_service::MockPeopleService;
#[cfg(any(test, feature = "test-utils"))]
pub use user_service::MockUserService;

use common::{AppError, AppResult};
use domain::MAX_PAGE_SIZE;
use persistence::{Pagination, SortDirection};
use validator::Validate;

/// Run the derived validations and report the first failing message.
pub(crate) fn validate<T: Validate>(value: &T) -> AppResult<()> {
    value.validate().map_err(|e| {
        let message = e
            .field_errors()
            .values()
            .next()
            .and_then(|errors| errors.first())
            .and_then(|error| error.message.as_ref())
            .map(|msg| msg.to_string())
            .unwrap_or_else(|| "Validation failed".to_string());
        AppError::validation(message)
    })
}

/// Offset and cursor together; each adapter uses the one it supports.
///
/// Only what the caller sent is forwarded, so stores without offsets are not
/// handed one by default.
pub(crate) fn pagination(
    limit: Option<u64>,
    offset: Option<u64>,
    cursor: Option<String>,
    default_limit: u64,
) -> Pagination {
    Pagination {
        limit: Some(limit.unwrap_or(default_limit).min(MAX_PAGE_SIZE)),
        offset,
        cursor: cursor.filter(|c| !c.is_empty()),
        ..Default::default()
    }
}

/// `order` as sent by clients; absent means `default`.
pub(crate) fn sort_direction(order: Option<&str>, default: SortDirection) -> AppResult<SortDirection> {
    match order {
        None => Ok(default),
        Some(s) => SortDirection::parse(s)
            .ok_or_else(|| AppError::validation("order must be ASC or DESC")),
    }
}

/// `order_by` checked against a whitelist; absent means `default`.
pub(crate) fn order_field(
    order_by: Option<&str>,
    allowed: &[&'static str],
    default: &'static str,
) -> AppResult<&'static str> {
    match order_by {
        None => Ok(default),
        Some(name) => allowed.iter().copied().find(|f| *f == name).ok_or_else(|| {
            AppError::validation(format!(
                "order_by must be one of: {}",
                allowed.join(", ")
            ))
        }),
    }
}
