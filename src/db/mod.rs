//! Database module for document persistence.
//!
//! SQLite holds every collection as JSON documents in a single table.

mod document;
mod repository;
mod sqlite;
mod store;

pub use document::*;
pub use repository::*;
pub use sqlite::SqliteStore;
pub use store::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await?;

    // Run embedded migrations
    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            collection TEXT NOT NULL,
            id TEXT NOT NULL UNIQUE,
            data TEXT NOT NULL CHECK (json_valid(data)),
            folded TEXT NOT NULL DEFAULT '{}' CHECK (json_valid(folded))
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection);")
        .execute(pool)
        .await?;

    add_folded_column(pool).await?;

    Ok(())
}

/// Upgrade a database created before the `folded` search column existed.
async fn add_folded_column(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let present: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM pragma_table_info('documents') WHERE name = 'folded'",
    )
    .fetch_one(pool)
    .await?;
    if present > 0 {
        return Ok(());
    }

    let mut tx = pool.begin().await?;
    sqlx::query("ALTER TABLE documents ADD COLUMN folded TEXT NOT NULL DEFAULT '{}'")
        .execute(&mut *tx)
        .await?;

    let rows: Vec<(String, String)> = sqlx::query_as("SELECT id, data FROM documents")
        .fetch_all(&mut *tx)
        .await?;
    for (id, data) in &rows {
        let document: Document =
            serde_json::from_str(data).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        let folded = serde_json::to_string(&sqlite::fold_case(&document))
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        sqlx::query("UPDATE documents SET folded = ? WHERE id = ?")
            .bind(folded)
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    tracing::info!("Added search column to {} documents", rows.len());
    Ok(())
}

/// Fresh store over a temporary database file.
#[cfg(test)]
pub(crate) async fn test_store() -> (tempfile::TempDir, SqliteStore) {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let pool = init_database(&temp_dir.path().join("test.sqlite"))
        .await
        .unwrap();
    (temp_dir, SqliteStore::new(pool, Duration::from_secs(5)))
}
