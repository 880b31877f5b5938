//! # Database Migrations
//!
//! Embedded SQL migrations for Adbook.
//!
//! ## How Migrations Work
//! The `sqlx::migrate!()` macro embeds all SQL files from the migrations
//! directory into the binary at compile time. At startup we compare the
//! embedded set against the `_sqlx_migrations` table and apply what is
//! pending, in filename order, each in its own transaction.
//!
//! ## Adding New Migrations
//!
//! 1. Create a new file in `migrations/sqlite/` with the next sequence number
//! 2. Name format: `NNN_description.sql` (e.g., `002_add_makegoods.sql`)
//! 3. Write idempotent SQL (use `IF NOT EXISTS` where possible)
//! 4. **NEVER** modify existing migrations - always add new ones

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Embedded migrations from the `migrations/sqlite` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending database migrations.
///
/// ## Safety
/// - Idempotent: safe to run multiple times
/// - Transactional: each migration runs in a transaction
/// - Ordered: migrations run in filename order (001, 002, ...)
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Applying embedded migrations");
    MIGRATOR.run(pool).await?;
    Ok(())
}
