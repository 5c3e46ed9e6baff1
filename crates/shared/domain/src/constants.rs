//! Domain-level constants.
//!
//! These constants define business rules and the wire descriptions of
//! enumerated values.

// =============================================================================
// User Roles
// =============================================================================

/// Administrator role description
pub const ROLE_ADMIN: &str = "Admin";

/// Manager role description (owns projects)
pub const ROLE_MANAGER: &str = "Manager";

/// Employee role description (owns tasks)
pub const ROLE_EMPLOYEE: &str = "Employee";

/// All valid role descriptions
pub const VALID_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_MANAGER, ROLE_EMPLOYEE];

/// Check if a role description is valid (case-insensitive)
pub fn is_valid_role(role: &str) -> bool {
    VALID_ROLES.iter().any(|r| r.eq_ignore_ascii_case(role))
}

// =============================================================================
// Work item status
// =============================================================================

pub const STATUS_OPEN: &str = "Open";

pub const STATUS_IN_PROGRESS: &str = "In Progress";

pub const STATUS_COMPLETED: &str = "Completed";

// =============================================================================
// Deletion
// =============================================================================

/// Reason reported when the deletion-safety policy denies a delete
pub const DELETION_BLOCKED_MESSAGE: &str = "User can not be deleted";

/// Separator between the original user name and the id on soft delete
pub const DELETED_NAME_SEPARATOR: char = '-';
