//! SeaORM entities, one per table.

pub mod access_token;
pub mod confirmation;
pub mod generic;
pub mod message;
pub mod person;
pub mod user;
