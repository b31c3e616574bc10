//! Domain-level constants.
//!
//! These constants define business rules and the string forms stored by both backends.

// =============================================================================
// Roles
// =============================================================================

/// Default role assigned to new people and users
pub const ROLE_USER: &str = "USER";

/// Administrator role with elevated privileges
pub const ROLE_ADMIN: &str = "ADMIN";

// =============================================================================
// Messages
// =============================================================================

pub const SENDER_BOT: &str = "BOT";
pub const SENDER_PATIENT: &str = "PACIENTE";

pub const MESSAGE_STATUS_SENT: &str = "SENT";
pub const MESSAGE_STATUS_DELIVERED: &str = "DELIVERED";
pub const MESSAGE_STATUS_READ: &str = "READ";
pub const MESSAGE_STATUS_FAILED: &str = "FAILED";

// =============================================================================
// Generic records
// =============================================================================

/// Status every new generic record starts with
pub const GENERIC_STATUS_PENDING: &str = "Pendiente";

// =============================================================================
// Validation
// =============================================================================

/// Minimum password length requirement
pub const MIN_PASSWORD_LENGTH: usize = 8;

// =============================================================================
// Pagination
// =============================================================================

/// Default number of items per page
pub const DEFAULT_PAGE_SIZE: u64 = 50;

/// Maximum allowed items per page
pub const MAX_PAGE_SIZE: u64 = 500;
