//! SQLite implementation of the ChainStore trait.
//!
//! This is the primary storage backend. It uses rusqlite with bundled
//! SQLite, wrapped in async via `tokio::task::spawn_blocking`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use sigchain_core::now_millis;

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{ChainStore, StoreStatus, StoredChain};

/// Where the database lives.
#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    Memory,
}

/// SQLite-based store implementation.
///
/// The connection exists only while the store is open. An in-memory
/// database is discarded on `close`.
pub struct SqliteChainStore {
    location: Location,
    conn: Arc<Mutex<Option<Connection>>>,
}

impl SqliteChainStore {
    /// A store backed by the database file at `path`. Nothing is opened yet.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_location(Location::File(path.as_ref().to_path_buf()))
    }

    /// A store backed by a private in-memory database.
    pub fn in_memory() -> Self {
        Self::with_location(Location::Memory)
    }

    fn with_location(location: Location) -> Self {
        Self {
            location,
            conn: Arc::new(Mutex::new(None)),
        }
    }

    /// Run `f` against the open connection on the blocking pool.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = lock(&conn)?;
            let conn = guard.as_mut().ok_or(StoreError::Closed)?;
            f(conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn lock(conn: &Mutex<Option<Connection>>) -> Result<MutexGuard<'_, Option<Connection>>> {
    conn.lock().map_err(|e| StoreError::Poisoned(e.to_string()))
}

#[async_trait]
impl ChainStore for SqliteChainStore {
    fn status(&self) -> StoreStatus {
        match self.conn.lock() {
            Ok(guard) if guard.is_some() => StoreStatus::Open,
            _ => StoreStatus::Closed,
        }
    }

    async fn open(&self) -> Result<()> {
        let conn = self.conn.clone();
        let location = self.location.clone();

        tokio::task::spawn_blocking(move || {
            let mut guard = lock(&conn)?;
            if guard.is_some() {
                return Ok(());
            }

            let mut connection = match &location {
                Location::File(path) => Connection::open(path)?,
                Location::Memory => Connection::open_in_memory()?,
            };
            migration::migrate(&mut connection)?;
            *guard = Some(connection);

            debug!(location = ?location, "opened chain store");
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    async fn close(&self) -> Result<()> {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let mut guard = lock(&conn)?;
            if let Some(connection) = guard.take() {
                connection.close().map_err(|(_, e)| StoreError::Database(e))?;
                debug!("closed chain store");
            }
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    async fn get_chain(&self, name: &str) -> Result<Option<StoredChain>> {
        let name = name.to_string();

        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT serialized_team, context, team_keyring
                 FROM sigchains WHERE team_name = ?1",
                params![name],
                |row| {
                    Ok(StoredChain {
                        serialized_team: row.get(0)?,
                        context: row.get(1)?,
                        team_keyring: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn set_chain(&self, name: &str, chain: &StoredChain) -> Result<()> {
        let name = name.to_string();
        let chain = chain.clone();

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO sigchains (team_name, serialized_team, context, team_keyring, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(team_name) DO UPDATE SET
                    serialized_team = excluded.serialized_team,
                    context = excluded.context,
                    team_keyring = excluded.team_keyring,
                    updated_at = excluded.updated_at",
                params![
                    name,
                    chain.serialized_team,
                    chain.context,
                    chain.team_keyring,
                    now_millis(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn delete_chain(&self, name: &str) -> Result<()> {
        let name = name.to_string();

        self.with_conn(move |conn| {
            conn.execute("DELETE FROM sigchains WHERE team_name = ?1", params![name])?;
            Ok(())
        })
        .await
    }

    async fn list_chains(&self) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT team_name FROM sigchains ORDER BY team_name")?;
            let names = stmt
                .query_map([], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(names)
        })
        .await
    }
}
