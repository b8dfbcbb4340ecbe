//! The library database.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::borrow::Cow;
use std::path::Path;
use std::time::Duration;
use tracing::instrument;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Pipelines for different items share the pool; each holds at most one
/// connection at a time.
const POOL_SIZE: u32 = 4;
/// An attachment import keeps its transaction open while the PDF is copied
/// into storage, so writers may have to wait that long.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Migrated connection pool over the library's SQLite file.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the library database at `path` and bring its schema
    /// up to date. A missing parent directory is created.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).or_raise(|| ErrorKind::Database)?;
        }
        let options = Self::options()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("wal_autocheckpoint", Cow::Borrowed("800"));
        Self::open(options, SqlitePoolOptions::new().max_connections(POOL_SIZE)).await
    }

    /// A private, empty database that lives as long as the pool.
    ///
    /// Not `#[cfg(test)]`: other crates use this in their tests too.
    pub async fn connect_in_memory() -> Result<Self> {
        // Every in-memory connection is a database of its own, and the data
        // goes when its connection closes: keep exactly one, forever.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
        Self::open(Self::options().filename(":memory:"), pool).await
    }

    fn options() -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT)
            .pragma("temp_store", Cow::Borrowed("MEMORY"))
    }

    async fn open(options: SqliteConnectOptions, pool: SqlitePoolOptions) -> Result<Self> {
        let pool = pool.connect_with(options).await.or_raise(|| ErrorKind::Database)?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    #[instrument("migrating library database", skip(self))]
    async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await.or_raise(|| ErrorKind::Migration)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Wait for every connection to be returned, then close the pool.
    pub async fn close(&self) {
        _ = sqlx::query("PRAGMA optimize").execute(&self.pool).await;
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn pragma(db: &Database, name: &str) -> i64 {
        let (value,): (i64,) = sqlx::query_as(&format!("PRAGMA {name}")).fetch_one(db.pool()).await.unwrap();
        value
    }

    #[tokio::test]
    async fn test_connect_in_memory() {
        let db = Database::connect_in_memory().await.unwrap();
        assert_eq!(pragma(&db, "foreign_keys").await, 1);
        // Running the migrations again is a no-op.
        db.migrate().await.unwrap();
        db.close().await;
        assert!(db.pool().is_closed());
    }

    #[tokio::test]
    async fn test_in_memory_connection_is_never_recycled() {
        let db = Database::connect_in_memory().await.unwrap();
        let options = db.pool().options();
        assert_eq!(options.get_idle_timeout(), None);
        assert_eq!(options.get_max_lifetime(), None);
        assert_eq!((options.get_min_connections(), options.get_max_connections()), (1, 1));

        sqlx::query("CREATE TABLE kept (id INTEGER)").execute(db.pool()).await.unwrap();
        // A second, independent acquire still sees the same database.
        let mut conn = db.pool().acquire().await.unwrap();
        let (tables,): (i64,) = sqlx::query_as("SELECT count(*) FROM sqlite_master WHERE name = 'kept'")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(tables, 1);
    }

    #[tokio::test]
    async fn test_connect_creates_file_and_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("data/library.sqlite");
        let db = Database::connect(&path).await.unwrap();
        assert!(path.is_file());
        assert_eq!(pragma(&db, "wal_autocheckpoint").await, 800);
        let (mode,): (String,) = sqlx::query_as("PRAGMA journal_mode").fetch_one(db.pool()).await.unwrap();
        assert_eq!(mode, "wal");
        db.close().await;

        // Reopening an existing database keeps it.
        Database::connect(&path).await.unwrap().close().await;
    }
}
