//! Database-specific error types and conversions.

use filigate_core::error::FiligateError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Malformed row: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Record already exists: {entity}")]
    AlreadyExists { entity: String },
}

impl From<DbError> for FiligateError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => FiligateError::NotFound { entity, id },
            DbError::AlreadyExists { entity } => FiligateError::AlreadyExists { entity },
            other => FiligateError::Database(other.to_string()),
        }
    }
}

/// Parse a UUID stored as a string column.
pub(crate) fn parse_uuid(field: &str, raw: &str) -> Result<uuid::Uuid, DbError> {
    uuid::Uuid::parse_str(raw).map_err(|e| DbError::Decode(format!("invalid {field} UUID: {e}")))
}

/// Parse an optional UUID column.
pub(crate) fn parse_opt_uuid(field: &str, raw: Option<&str>) -> Result<Option<uuid::Uuid>, DbError> {
    raw.map(|r| parse_uuid(field, r)).transpose()
}
