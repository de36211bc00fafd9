use shared::message::Collection;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{collection} record not found: {id}")]
    NotFound { collection: Collection, id: String },

    #[error("{collection} record already exists: {id}")]
    AlreadyExists { collection: Collection, id: String },

    /// The caller's copy is stale: someone else committed a newer version first
    #[error("{collection} record {id} was modified concurrently (expected version {expected}, found {actual})")]
    VersionConflict {
        collection: Collection,
        id: String,
        expected: u64,
        actual: u64,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;
