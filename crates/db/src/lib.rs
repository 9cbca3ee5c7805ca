//! Embedded SQLite storage handle and migration runner.
//!
//! A [`Database`] owns one SQLite connection living on a dedicated background
//! thread. Every call is queued to that thread and executed in order, so
//! statements issued through the same handle never run concurrently.

use thiserror::Error;

const IN_MEMORY: &str = ":memory:";

/// Errors raised by the storage layer.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("failed to open database at '{path}'")]
    Open {
        path: String,
        #[source]
        source: tokio_rusqlite::Error,
    },

    #[error("migration '{module}/{id}' failed")]
    Migration {
        module: String,
        id: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error(transparent)]
    Sqlite(#[from] tokio_rusqlite::Error),
}

/// Migration definition contributed by a module.
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

/// Shared handle to the embedded database.
///
/// Cloning is cheap and every clone talks to the same connection.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open the database at `path`, or a private in-memory database for `:memory:`.
    pub async fn open(path: &str) -> Result<Self, DbError> {
        let conn = if path == IN_MEMORY {
            tokio_rusqlite::Connection::open_in_memory().await
        } else {
            tokio_rusqlite::Connection::open(path).await
        }
        .map_err(|source| DbError::Open {
            path: path.to_string(),
            source,
        })?;

        tracing::info!(target: "bookshelf-db", path, "database opened");

        Ok(Self { conn })
    }

    /// Open a fresh in-memory database.
    pub async fn open_in_memory() -> Result<Self, DbError> {
        Self::open(IN_MEMORY).await
    }

    /// Run `f` against the connection on the storage thread.
    pub async fn call<F, R>(&self, f: F) -> Result<R, DbError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> rusqlite::Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let value = self
            .conn
            .call(move |conn| f(conn).map_err(tokio_rusqlite::Error::from))
            .await?;
        Ok(value)
    }

    /// Round-trip a trivial statement to check the connection is alive.
    pub async fn ping(&self) -> Result<(), DbError> {
        self.call(|conn| conn.query_row("SELECT 1", [], |_| Ok(())))
            .await
    }

    /// Apply every migration not yet recorded in `_migrations`.
    ///
    /// Each migration runs in its own transaction together with its bookkeeping
    /// row, so a failing batch leaves nothing behind. Returns how many were applied.
    pub async fn migrate(&self, migrations: Vec<(String, Migration)>) -> Result<usize, DbError> {
        let outcome = self
            .call(move |conn| {
                conn.execute_batch(
                    "CREATE TABLE IF NOT EXISTS _migrations (
                        module     TEXT NOT NULL,
                        id         TEXT NOT NULL,
                        applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                        PRIMARY KEY (module, id)
                    )",
                )?;

                let mut applied = 0;
                for (module, migration) in migrations {
                    let done: bool = conn.query_row(
                        "SELECT EXISTS(SELECT 1 FROM _migrations WHERE module = ?1 AND id = ?2)",
                        rusqlite::params![module, migration.id],
                        |row| row.get(0),
                    )?;
                    if done {
                        continue;
                    }

                    if let Err(source) = apply(conn, &module, &migration) {
                        return Ok(Err(DbError::Migration {
                            module,
                            id: migration.id.to_string(),
                            source,
                        }));
                    }

                    tracing::info!(
                        target: "bookshelf-db",
                        module = %module,
                        migration = migration.id,
                        "migration applied"
                    );
                    applied += 1;
                }

                Ok(Ok(applied))
            })
            .await?;

        outcome
    }
}

fn apply(
    conn: &mut rusqlite::Connection,
    module: &str,
    migration: &Migration,
) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(migration.up)?;
    tx.execute(
        "INSERT INTO _migrations (module, id) VALUES (?1, ?2)",
        rusqlite::params![module, migration.id],
    )?;
    tx.commit()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widgets() -> Vec<(String, Migration)> {
        vec![
            (
                "widgets".to_string(),
                Migration {
                    id: "001_init",
                    up: "CREATE TABLE widgets (id INTEGER PRIMARY KEY, label TEXT);",
                },
            ),
            (
                "widgets".to_string(),
                Migration {
                    id: "002_seed",
                    up: "INSERT INTO widgets (label) VALUES ('a'), ('b');",
                },
            ),
        ]
    }

    #[tokio::test]
    async fn ping_in_memory() {
        let db = Database::open_in_memory().await.unwrap();
        db.ping().await.unwrap();
    }

    #[tokio::test]
    async fn migrations_apply_once() {
        let db = Database::open_in_memory().await.unwrap();

        assert_eq!(db.migrate(widgets()).await.unwrap(), 2);
        assert_eq!(db.migrate(widgets()).await.unwrap(), 0);

        let rows: i64 = db
            .call(|conn| conn.query_row("SELECT COUNT(*) FROM widgets", [], |row| row.get(0)))
            .await
            .unwrap();
        assert_eq!(rows, 2);

        let recorded: i64 = db
            .call(|conn| conn.query_row("SELECT COUNT(*) FROM _migrations", [], |row| row.get(0)))
            .await
            .unwrap();
        assert_eq!(recorded, 2);
    }

    #[tokio::test]
    async fn failed_migration_is_not_recorded() {
        let db = Database::open_in_memory().await.unwrap();
        let broken = vec![(
            "widgets".to_string(),
            Migration {
                id: "001_broken",
                up: "CREATE TABLE ok (id INTEGER); THIS IS NOT SQL;",
            },
        )];

        let err = db.migrate(broken).await.unwrap_err();
        match err {
            DbError::Migration { module, id, .. } => {
                assert_eq!(module, "widgets");
                assert_eq!(id, "001_broken");
            }
            other => panic!("expected migration error, got {other:?}"),
        }

        let tables: i64 = db
            .call(|conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE name = 'ok'",
                    [],
                    |row| row.get(0),
                )
            })
            .await
            .unwrap();
        assert_eq!(tables, 0);
    }

    #[tokio::test]
    async fn open_rejects_unreachable_path() {
        let err = Database::open("/nonexistent-dir/for/sure/books.db")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, DbError::Open { .. }));
    }
}
