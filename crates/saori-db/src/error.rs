//! # Database Errors
//!
//! Error types for storage operations and workflows.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DbError                                                                │
//! │  ├── Core(CoreError)        ← business rule failed before/inside a tx  │
//! │  ├── NotFound               ← row missing                              │
//! │  ├── UniqueViolation        ← UNIQUE index rejected the write          │
//! │  ├── ForeignKeyViolation    ← referenced row missing                   │
//! │  ├── Busy                   ← SQLITE_BUSY / SQLITE_LOCKED              │
//! │  ├── ConnectionFailed       ← cannot open the file                     │
//! │  ├── MigrationFailed                                                   │
//! │  ├── QueryFailed            ← any other database error                 │
//! │  └── Internal                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed workflow drops its `sqlx::Transaction`, so any of these leaves
//! the database exactly as it was before the call.

use saori_core::CoreError;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// A business rule rejected the operation.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// `field` is `table.column` as reported by SQLite.
    #[error("Duplicate value for {field}")]
    UniqueViolation { field: String },

    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Another writer holds the database lock.
    #[error("Database is busy, retry the operation")]
    Busy,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
        }
    }

    /// Whether repeating the same call may succeed.
    ///
    /// Lock contention always qualifies. A unique violation qualifies only on
    /// allocated sequence columns, where a concurrent writer took the number
    /// first.
    pub fn is_retryable(&self) -> bool {
        match self {
            DbError::Busy | DbError::PoolExhausted => true,
            DbError::UniqueViolation { field } => {
                field.ends_with(".folio") || field == "employees.code"
            }
            _ => false,
        }
    }
}

// SQLite primary and extended result codes.
const SQLITE_BUSY: &str = "5";
const SQLITE_LOCKED: &str = "6";
const SQLITE_BUSY_RECOVERY: &str = "261";
const SQLITE_LOCKED_SHAREDCACHE: &str = "262";
const SQLITE_BUSY_SNAPSHOT: &str = "517";
const SQLITE_CONSTRAINT_FOREIGNKEY: &str = "787";
const SQLITE_CONSTRAINT_PRIMARYKEY: &str = "1555";
const SQLITE_CONSTRAINT_UNIQUE: &str = "2067";

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → code / message decide:
///                                 busy or locked  → Busy
///                                 UNIQUE          → UniqueViolation
///                                 FOREIGN KEY     → ForeignKeyViolation
///                                 other           → QueryFailed
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.into_owned()).unwrap_or_default();
                let msg = db_err.message();

                match code.as_str() {
                    SQLITE_BUSY | SQLITE_LOCKED | SQLITE_BUSY_RECOVERY
                    | SQLITE_LOCKED_SHAREDCACHE | SQLITE_BUSY_SNAPSHOT => DbError::Busy,
                    _ if msg.contains("database is locked") => DbError::Busy,
                    SQLITE_CONSTRAINT_UNIQUE | SQLITE_CONSTRAINT_PRIMARYKEY => {
                        DbError::UniqueViolation {
                            field: unique_field(msg),
                        }
                    }
                    _ if msg.contains("UNIQUE constraint failed") => DbError::UniqueViolation {
                        field: unique_field(msg),
                    },
                    SQLITE_CONSTRAINT_FOREIGNKEY => DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    },
                    _ if msg.contains("FOREIGN KEY constraint failed") => {
                        DbError::ForeignKeyViolation {
                            message: msg.to_string(),
                        }
                    }
                    _ => DbError::QueryFailed(msg.to_string()),
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

/// `"UNIQUE constraint failed: users.email"` → `"users.email"`.
fn unique_field(msg: &str) -> String {
    msg.split("constraint failed: ")
        .nth(1)
        .unwrap_or("unknown")
        .trim()
        .to_string()
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<saori_core::ValidationError> for DbError {
    fn from(err: saori_core::ValidationError) -> Self {
        DbError::Core(err.into())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Internal(format!("JSON column: {err}"))
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
