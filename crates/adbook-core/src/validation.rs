//! # Validation Module
//!
//! Input validation for conversion and decision requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (HTTP/API layer, out of scope)                        │
//! │  └── Shape checks, deserialization                                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints (counter invariant)                  │
//! │  ├── UNIQUE constraints (one order per schedule)                       │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::ScheduleItem;
use crate::{MAX_NOTE_LENGTH, MAX_SCHEDULE_ITEMS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Id Validators
// =============================================================================

/// Validates an entity reference id (schedule id, order id, actor id).
///
/// ## Rules
/// - Must not be empty after trimming
/// - Must be at most 64 characters (UUID v4 is 36)
pub fn validate_reference_id(field: &str, id: &str) -> ValidationResult<()> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if id.len() > 64 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 64,
        });
    }

    Ok(())
}

// =============================================================================
// Free-Text Validators
// =============================================================================

/// Validates optional free text (rejection reasons, payment terms,
/// special instructions).
pub fn validate_note(field: &str, note: Option<&str>) -> ValidationResult<()> {
    if let Some(note) = note {
        if note.len() > MAX_NOTE_LENGTH {
            return Err(ValidationError::TooLong {
                field: field.to_string(),
                max: MAX_NOTE_LENGTH,
            });
        }
    }
    Ok(())
}

// =============================================================================
// Schedule Item Validators
// =============================================================================

/// Validates the item list of a schedule about to be converted.
///
/// ## Rules
/// - At least one item, at most [`MAX_SCHEDULE_ITEMS`]
/// - Every rate non-negative
/// - Every episode reference present
pub fn validate_schedule_items(items: &[ScheduleItem]) -> ValidationResult<()> {
    if items.is_empty() || items.len() > MAX_SCHEDULE_ITEMS {
        return Err(ValidationError::BadCount {
            field: "schedule items".to_string(),
            min: 1,
            max: MAX_SCHEDULE_ITEMS,
        });
    }

    for item in items {
        if item.episode_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: format!("episode_id on schedule item {}", item.id),
            });
        }
        if item.rate_cents < 0 {
            return Err(ValidationError::Negative {
                field: format!("rate on schedule item {}", item.id),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PlacementType;
    use chrono::Utc;

    fn item(episode_id: &str, rate_cents: i64) -> ScheduleItem {
        ScheduleItem {
            id: "si1".to_string(),
            schedule_id: "s1".to_string(),
            show_id: None,
            episode_id: episode_id.to_string(),
            placement_type: PlacementType::PreRoll,
            air_date: "2026-09-01".to_string(),
            length_seconds: 30,
            rate_cents,
            position: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_reference_id() {
        assert!(validate_reference_id("schedule_id", "s-123").is_ok());
        assert!(validate_reference_id("schedule_id", "  ").is_err());
        assert!(validate_reference_id("schedule_id", &"x".repeat(65)).is_err());
    }

    #[test]
    fn test_note_length() {
        assert!(validate_note("reason", None).is_ok());
        assert!(validate_note("reason", Some("Budget exceeded")).is_ok());
        assert!(validate_note("reason", Some(&"x".repeat(MAX_NOTE_LENGTH + 1))).is_err());
    }

    #[test]
    fn test_schedule_items() {
        assert!(validate_schedule_items(&[item("e1", 2500)]).is_ok());
        assert!(validate_schedule_items(&[]).is_err());
        assert!(validate_schedule_items(&[item("", 2500)]).is_err());
        assert!(validate_schedule_items(&[item("e1", -1)]).is_err());
    }
}
