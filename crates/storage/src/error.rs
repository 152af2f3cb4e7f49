use engine::error::{EngineError, Entity, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("{0} not found")]
    NotFound(Entity),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Invalid stored row: {0}")]
    InvalidRow(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("23505")
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::NotFound(_) | StorageError::Engine(EngineError::NotFound(_))
        )
    }

    /// Family of a domain refusal, `None` for infrastructure failures.
    pub fn engine_kind(&self) -> Option<ErrorKind> {
        match self {
            StorageError::Engine(e) => Some(e.kind()),
            StorageError::NotFound(_) => Some(ErrorKind::NotFound),
            StorageError::Validation(_) => Some(ErrorKind::Validation),
            StorageError::ConstraintViolation(_) => Some(ErrorKind::Conflict),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use engine::error::ConflictError;

    use super::*;

    #[test]
    fn test_engine_kind_classification() {
        let err = StorageError::from(EngineError::from(ConflictError::RulerAlreadyReturned));
        assert_eq!(err.engine_kind(), Some(ErrorKind::Conflict));
        assert!(!err.is_not_found());

        let err = StorageError::NotFound(Entity::Capture);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "capture not found");

        let err = StorageError::InvalidRow("bad species".to_string());
        assert_eq!(err.engine_kind(), None);
    }
}
