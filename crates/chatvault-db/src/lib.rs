pub mod migrations;
pub mod models;
pub mod store;

use std::path::Path;
use std::sync::Mutex;

use chatvault_crypto::CryptoError;
use chatvault_types::AuthError;
use rusqlite::Connection;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A credential-bearing column failed authenticated decryption.
    #[error("stored credential is corrupt")]
    CorruptCredential,
    #[error("credential encryption failed")]
    Crypto(#[source] CryptoError),
    #[error("db lock poisoned")]
    Poisoned,
    #[error(transparent)]
    Db(#[from] rusqlite::Error),
}

impl From<CryptoError> for StoreError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::Corrupt => Self::CorruptCredential,
            other => Self::Crypto(other),
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::CorruptCredential => Self::CorruptCredential,
            other => Self::Storage(anyhow::Error::new(other)),
        }
    }
}

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        f(&conn)
    }
}

fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}
