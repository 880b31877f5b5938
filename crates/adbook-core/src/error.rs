//! # Error Types
//!
//! Domain-specific error types for adbook-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  adbook-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  adbook-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  adbook-engine errors (separate crate)                                 │
//! │  └── EngineError      - The external taxonomy callers see              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → EngineError → Caller    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (order id, slot key, role)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

use crate::policy::Role;
use crate::types::OrderStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors: authorization denials and illegal state
/// transitions. These never mutate state.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The actor is not allowed to decide on this order.
    ///
    /// ## When This Occurs
    /// - Internal track attempted without an administrative role
    /// - Client track attempted by someone who is not the registered
    ///   client contact, or on an order that does not require client
    ///   approval
    #[error("Actor with role {role:?} is not authorized: {reason}")]
    NotAuthorized { role: Role, reason: String },

    /// The order is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Deciding an order that is already Approved or Rejected
    /// - Deciding an order still in Draft (conversion not finished)
    #[error("Order {order_id} is {current_status}, cannot perform operation")]
    InvalidOrderStatus {
        order_id: String,
        current_status: OrderStatus,
    },

    /// Summing item rates overflowed i64 cents. A schedule that large is
    /// corrupt input, not a real campaign.
    #[error("Order total overflows for schedule {schedule_id}")]
    TotalOverflow { schedule_id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors. Used for early validation before business
/// logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Collection size out of bounds.
    #[error("{field} must contain between {min} and {max} entries")]
    BadCount {
        field: String,
        min: usize,
        max: usize,
    },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g. malformed id).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InvalidOrderStatus {
            order_id: "o-42".to_string(),
            current_status: OrderStatus::Approved,
        };
        assert_eq!(
            err.to_string(),
            "Order o-42 is approved, cannot perform operation"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "schedule_id".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
