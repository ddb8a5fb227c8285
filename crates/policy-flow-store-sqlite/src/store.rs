// crates/policy-flow-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Policy Store
// Description: Durable PolicyStore backed by SQLite.
// Purpose: Persist policy documents with canonical serialization and hashes.
// Dependencies: policy-flow-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! This module implements a durable [`PolicyStore`] using `SQLite`. Each put
//! writes one row per policy holding its RFC 8785 canonical JSON and the
//! digest of those bytes. Loads verify the digest, the size limit, and that
//! the embedded identifier matches the row key, and fail closed otherwise.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use policy_flow_core::Policy;
use policy_flow_core::PolicyId;
use policy_flow_core::PolicyStore;
use policy_flow_core::StoreError;
use policy_flow_core::hashing::DEFAULT_HASH_ALGORITHM;
use policy_flow_core::hashing::HashAlgorithm;
use policy_flow_core::hashing::canonical_json_bytes;
use policy_flow_core::hashing::hash_bytes;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum canonical policy document size accepted by the store.
pub const MAX_POLICY_BYTES: usize = 1024 * 1024;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` policy store.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Creates a config for the path with default pragmas.
    #[must_use]
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store corruption or hash mismatch.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Policy document exceeded the size limit.
    #[error("sqlite store payload too large: {actual_bytes} bytes (max {max_bytes})")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual payload size in bytes.
        actual_bytes: usize,
    },
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
            SqliteStoreError::TooLarge {
                max_bytes,
                actual_bytes,
            } => Self::Invalid(format!(
                "policy_json exceeds size limit: {actual_bytes} bytes (max {max_bytes})"
            )),
        }
    }
}

/// Maps a `rusqlite` error into a store error.
#[allow(clippy::needless_pass_by_value, reason = "Used directly as a map_err adapter.")]
fn db_error(err: rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::Db(err.to_string())
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed policy store.
#[derive(Clone)]
pub struct SqlitePolicyStore {
    /// Shared `SQLite` connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqlitePolicyStore {
    /// Opens an `SQLite`-backed policy store, creating the schema if needed.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized, or its schema version is not supported.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Locks the shared connection.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection.lock().map_err(|_| SqliteStoreError::Db("mutex poisoned".to_string()))
    }

    /// Loads and verifies a policy row.
    fn load_policy(&self, id: &PolicyId) -> Result<Option<Policy>, SqliteStoreError> {
        let row = {
            let guard = self.lock()?;
            let metadata = guard
                .query_row(
                    "SELECT length(policy_json), policy_hash, hash_algorithm FROM policies WHERE \
                     policy_id = ?1",
                    params![id.as_str()],
                    |row| {
                        let length: i64 = row.get(0)?;
                        let hash: String = row.get(1)?;
                        let algorithm: String = row.get(2)?;
                        Ok((length, hash, algorithm))
                    },
                )
                .optional()
                .map_err(db_error)?;
            match metadata {
                None => None,
                Some((length, hash, algorithm)) => {
                    let length = usize::try_from(length).map_err(|_| {
                        SqliteStoreError::Invalid(format!("negative policy length for {id}"))
                    })?;
                    if length > MAX_POLICY_BYTES {
                        return Err(SqliteStoreError::TooLarge {
                            max_bytes: MAX_POLICY_BYTES,
                            actual_bytes: length,
                        });
                    }
                    let bytes: Vec<u8> = guard
                        .query_row(
                            "SELECT policy_json FROM policies WHERE policy_id = ?1",
                            params![id.as_str()],
                            |row| row.get(0),
                        )
                        .map_err(db_error)?;
                    Some((bytes, hash, algorithm))
                }
            }
        };
        let Some((bytes, hash_value, hash_algorithm)) = row else {
            return Ok(None);
        };
        let algorithm = parse_hash_algorithm(&hash_algorithm)?;
        if hash_bytes(algorithm, &bytes).value != hash_value {
            return Err(SqliteStoreError::Corrupt(format!("hash mismatch for policy {id}")));
        }
        let policy: Policy = serde_json::from_slice(&bytes)
            .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        if policy.id != *id {
            return Err(SqliteStoreError::Invalid(
                "policy_id mismatch between key and payload".to_string(),
            ));
        }
        Ok(Some(policy))
    }

    /// Writes a policy row, replacing any previous row with the same id.
    fn save_policy(&self, policy: &Policy) -> Result<(), SqliteStoreError> {
        let canonical_json = canonical_json_bytes(policy)
            .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        if canonical_json.len() > MAX_POLICY_BYTES {
            return Err(SqliteStoreError::TooLarge {
                max_bytes: MAX_POLICY_BYTES,
                actual_bytes: canonical_json.len(),
            });
        }
        let digest = hash_bytes(DEFAULT_HASH_ALGORITHM, &canonical_json);
        let saved_at = unix_millis();
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO policies (policy_id, policy_json, policy_hash, hash_algorithm, \
                 saved_at) VALUES (?1, ?2, ?3, ?4, ?5) ON CONFLICT(policy_id) DO UPDATE SET \
                 policy_json = excluded.policy_json, policy_hash = excluded.policy_hash, \
                 hash_algorithm = excluded.hash_algorithm, saved_at = excluded.saved_at",
                params![
                    policy.id.as_str(),
                    canonical_json,
                    digest.value,
                    digest.algorithm.label(),
                    saved_at
                ],
            )
            .map_err(db_error)?;
        drop(guard);
        Ok(())
    }

    /// Deletes a policy row.
    fn delete_policy(&self, id: &PolicyId) -> Result<bool, SqliteStoreError> {
        let removed = self
            .lock()?
            .execute("DELETE FROM policies WHERE policy_id = ?1", params![id.as_str()])
            .map_err(db_error)?;
        Ok(removed > 0)
    }

    /// Lists policy identifiers in ascending order.
    fn list_policies(&self) -> Result<Vec<PolicyId>, SqliteStoreError> {
        let guard = self.lock()?;
        let mut statement =
            guard.prepare("SELECT policy_id FROM policies ORDER BY policy_id").map_err(db_error)?;
        let ids = statement
            .query_map(params![], |row| row.get::<_, String>(0))
            .map_err(db_error)?
            .map(|id| id.map(PolicyId::new).map_err(db_error))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}

impl PolicyStore for SqlitePolicyStore {
    fn get(&self, id: &PolicyId) -> Result<Option<Policy>, StoreError> {
        self.load_policy(id).map_err(StoreError::from)
    }

    fn put(&self, policy: &Policy) -> Result<(), StoreError> {
        self.save_policy(policy).map_err(StoreError::from)
    }

    fn delete(&self, id: &PolicyId) -> Result<bool, StoreError> {
        self.delete_policy(id).map_err(StoreError::from)
    }

    fn list(&self) -> Result<Vec<PolicyId>, StoreError> {
        self.list_policies().map_err(StoreError::from)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with the configured pragmas.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags).map_err(db_error)?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(db_error)?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(db_error)?;
    connection.busy_timeout(Duration::from_millis(config.busy_timeout_ms)).map_err(db_error)?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(db_error)?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(db_error)?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(db_error)?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(db_error)?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS policies (
                    policy_id TEXT PRIMARY KEY,
                    policy_json BLOB NOT NULL,
                    policy_hash TEXT NOT NULL,
                    hash_algorithm TEXT NOT NULL,
                    saved_at INTEGER NOT NULL
                );",
            )
            .map_err(db_error)?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(db_error)?;
    Ok(())
}

/// Returns the current unix epoch in milliseconds.
fn unix_millis() -> i64 {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}

/// Parses a stored hash algorithm label.
fn parse_hash_algorithm(label: &str) -> Result<HashAlgorithm, SqliteStoreError> {
    HashAlgorithm::from_label(label)
        .ok_or_else(|| SqliteStoreError::Invalid(format!("unsupported hash algorithm: {label}")))
}
