//! Domain layer - entities, patches and value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies.
//! Storage adapters in the `persistence` crate map these types to rows and documents.

pub mod access_token;
pub mod confirmation;
pub mod constants;
pub mod error;
pub mod generic;
pub mod message;
pub mod password;
pub mod person;
pub mod user;

pub use access_token::{AccessToken, AccessTokenPatch};
pub use confirmation::{Confirmation, ConfirmationPatch};
pub use constants::*;
pub use error::{DomainError, DomainResult};
pub use generic::{Generic, GenericPatch};
pub use message::{Message, MessagePatch, MessageStatus, Sender};
pub use password::Password;
pub use person::{Person, PersonPatch, Role};
pub use user::{User, UserPatch, UserResponse};
