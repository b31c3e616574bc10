//! Application services.
//!
//! Each service turns request parameters into repository calls. Services only
//! see the port traits from `persistence`, so the same code runs on either backend.

pub mod date;
pub mod service;

pub use service::{
    AccessTokenManager, AccessTokenService, ConfirmationManager, ConfirmationService,
    CreateGenericRequest, CreatePersonRequest, CreateUserRequest, DateField, GenericManager,
    GenericService, ListMessagesParams, ListPeopleParams, ListUsersParams, MessageManager,
    MessageService, NewConversation, PeopleManager, PeopleService, SearchConfirmationsParams,
    SearchMode, UpdateGenericRequest, UpdatePersonRequest, UpdateUserRequest, UserManager,
    UserService,
};
