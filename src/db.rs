//! Database pool management
//!
//! A single process-wide SeaORM connection pool, initialized once at
//! startup (or by the test harness) and handed out as a static reference.

use once_cell::sync::OnceCell;
use sea_orm::{Database, DatabaseConnection};

static DB_POOL: OnceCell<DatabaseConnection> = OnceCell::new();

/// Connect and store the global pool. Panics when the database is
/// unreachable; a second call is a no-op so test binaries can share one
/// pool.
pub async fn init_db(database_url: String) {
    let pool = Database::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    if DB_POOL.set(pool).is_err() {
        log::debug!("Database pool was already initialized");
    }
}

/// The global pool. Panics if `init_db` has not run.
pub fn get_db_pool() -> &'static DatabaseConnection {
    DB_POOL.get().expect("Database pool is not initialized")
}
