//! Error types for tm-db

use thiserror::Error;

/// Storage backend errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Transaction management error (D002)
    #[error("[D002] Transaction failed: {0}")]
    TransactionError(String),

    /// Legacy checkpoints block the metadata upgrade (D003)
    #[error("[D003] Cannot upgrade metadata schema: {count} checkpoint(s) from an unfinished run remain; finish that run with the previous tool version first")]
    UpgradeBlocked { count: i64 },

    /// No upgrade step exists from this version (D004)
    #[error("[D004] No metadata schema upgrade step from version {from}")]
    UnsupportedUpgrade { from: u32 },

    /// Backend not compiled into this build (D005)
    #[error("[D005] Backend '{backend}' is not available in this build (enable the '{backend}' feature)")]
    BackendUnavailable { backend: String },

    /// Mutex poisoned (D006)
    #[error("[D006] Database mutex poisoned: {0}")]
    MutexPoisoned(String),

    /// Stored value could not be interpreted (D007)
    #[error("[D007] Invalid stored value: {0}")]
    InvalidData(String),

    /// DuckDB driver error (D008)
    #[error("[D008] DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// SQLite driver error (D009)
    #[error("[D009] SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// PostgreSQL driver error (D010)
    #[cfg(feature = "postgres")]
    #[error("[D010] PostgreSQL error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// MySQL driver error (D011)
    #[cfg(feature = "mysql")]
    #[error("[D011] MySQL error: {0}")]
    MySql(#[from] mysql::Error),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl<T> From<std::sync::PoisonError<T>> for DbError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        DbError::MutexPoisoned(err.to_string())
    }
}
