//! # adbook-db: Database Layer for Adbook
//!
//! This crate provides database access for the reservation and approval
//! engine. It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Adbook Data Flow                                 │
//! │                                                                         │
//! │  Engine call (create_order_from_schedule)                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     adbook-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ inventory.rs  │    │  (embedded)  │  │   │
//! │  │   │               │    │ order.rs      │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ schedule.rs   │    │ 001_init.sql │  │   │
//! │  │   │ Transactions  │    │ audit.rs      │    │              │  │   │
//! │  │   └───────────────┘    │ notification  │    └──────────────┘  │   │
//! │  │                        └───────────────┘                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (WAL mode, CHECK-constrained slot counters)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (inventory ledger, orders, ...)

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::audit::ChangeLogRepository;
pub use repository::inventory::{HoldOutcome, InventoryLedger};
pub use repository::notification::NotificationRepository;
pub use repository::order::OrderRepository;
pub use repository::schedule::ScheduleRepository;
