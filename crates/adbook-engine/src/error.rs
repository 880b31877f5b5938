//! # Engine Error Types
//!
//! The taxonomy external callers see. Every failure from the layers below
//! is folded into exactly one of these categories.
//!
//! ## Category Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Error Categories                                   │
//! │                                                                         │
//! │  Validation    - malformed input, caller should fix the request        │
//! │  NotFound      - referenced entity does not exist                      │
//! │  Conflict      - legal request, illegal state (already converted,      │
//! │                  already decided) - includes the lost UNIQUE race      │
//! │  Unavailable   - one or more slots lacked capacity; lists every        │
//! │                  shortage so the caller can adjust and retry           │
//! │  Authorization - actor may not perform the operation                   │
//! │  Persistence   - storage failed; retriable, nothing half-applied       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use adbook_core::{CoreError, SlotShortage, ValidationError};
use adbook_db::DbError;

/// Errors surfaced by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input validation failed; the request itself is malformed.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The request is well-formed but the current state forbids it:
    /// the schedule already has an order, the order is already decided,
    /// or a concurrent conversion won the unique-index race.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// One or more slots lacked capacity. The batch applied nothing;
    /// every short slot is listed with its availability at decision time.
    #[error("Insufficient inventory for {} slot(s)", .0.len())]
    Unavailable(Vec<SlotShortage>),

    /// The actor is not allowed to perform the operation.
    #[error("Not authorized: {0}")]
    Authorization(String),

    /// Storage failed. Safe to retry: compensation guarantees nothing was
    /// half-applied.
    #[error("Persistence failure: {0}")]
    Persistence(String),
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Validation(err.to_string())
    }
}

impl From<CoreError> for EngineError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotAuthorized { .. } => EngineError::Authorization(err.to_string()),
            CoreError::InvalidOrderStatus { .. } => EngineError::Conflict(err.to_string()),
            CoreError::TotalOverflow { .. } => EngineError::Validation(err.to_string()),
            CoreError::Validation(v) => EngineError::Validation(v.to_string()),
        }
    }
}

impl From<DbError> for EngineError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            // The one-order-per-schedule race loses here.
            DbError::UniqueViolation { .. } => EngineError::Conflict(err.to_string()),
            other => EngineError::Persistence(other.to_string()),
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Unit Tests
// =============================================================================
