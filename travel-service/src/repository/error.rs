//! Repository error types
//!
//! Storage failures are classified once, here, so that services can match on
//! a [`RepositoryErrorKind`] instead of inspecting driver errors.
//!
//! # Example
//!
//! ```rust
//! use travel_service::repository::{RepositoryError, RepositoryErrorKind};
//!
//! let error = RepositoryError::not_found("product", 42);
//! assert!(matches!(error.kind, RepositoryErrorKind::NotFound));
//! assert_eq!(error.entity_id.as_deref(), Some("42"));
//! ```

use std::fmt;

use sqlx::postgres::PgDatabaseError;

use super::constraint::UniqueViolation;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const NOT_NULL_VIOLATION: &str = "23502";
const CHECK_VIOLATION: &str = "23514";
const CONNECTION_EXCEPTION_CLASS: &str = "08";

/// Operation being performed when the repository error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryOperation {
    /// Listing entities with filters and pagination
    FindAll,
    /// Counting entities matching filters
    Count,
    /// Finding a single entity by ID
    FindById,
    /// Inserting a new entity
    Save,
    /// Upserting an entity by primary key
    Update,
    /// Soft deleting an entity
    Delete,
    /// Transaction and savepoint control
    Transaction,
}

impl fmt::Display for RepositoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FindAll => write!(f, "find_all"),
            Self::Count => write!(f, "count"),
            Self::FindById => write!(f, "find_by_id"),
            Self::Save => write!(f, "save"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
            Self::Transaction => write!(f, "transaction"),
        }
    }
}

/// Category of repository error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryErrorKind {
    /// No live row matched
    NotFound,
    /// A unique constraint rejected the write (SQLSTATE 23505)
    UniqueViolation,
    /// SQLSTATE 23503
    ForeignKeyViolation,
    /// SQLSTATE 23502
    NotNullViolation,
    /// SQLSTATE 23514
    CheckViolation,
    /// A filter or sort referenced something that cannot be rendered as SQL
    Configuration,
    /// Connection could not be used (I/O, pool, finished transaction)
    Connection,
    /// Any other database error
    Database,
}

impl fmt::Display for RepositoryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::UniqueViolation => write!(f, "unique_violation"),
            Self::ForeignKeyViolation => write!(f, "foreign_key_violation"),
            Self::NotNullViolation => write!(f, "not_null_violation"),
            Self::CheckViolation => write!(f, "check_violation"),
            Self::Configuration => write!(f, "configuration"),
            Self::Connection => write!(f, "connection"),
            Self::Database => write!(f, "database"),
        }
    }
}

/// Structured repository error with operation context
#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryError {
    /// The operation being performed when the error occurred
    pub operation: RepositoryOperation,
    /// The category of error
    pub kind: RepositoryErrorKind,
    /// Human-readable error message
    pub message: String,
    /// The entity involved (e.g. "product")
    pub entity_type: Option<String>,
    /// The ID of the entity involved
    pub entity_id: Option<String>,
    /// Parsed details of a unique violation
    pub unique: Option<UniqueViolation>,
}

impl RepositoryError {
    /// Create a new repository error
    pub fn new(
        operation: RepositoryOperation,
        kind: RepositoryErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            entity_type: None,
            entity_id: None,
            unique: None,
        }
    }

    /// Create a "not found" error with entity context
    pub fn not_found(entity_type: impl Into<String>, entity_id: impl ToString) -> Self {
        Self::new(
            RepositoryOperation::FindById,
            RepositoryErrorKind::NotFound,
            "record not found",
        )
        .with_entity(entity_type, entity_id)
    }

    /// Create a configuration error, raised before any SQL is sent
    pub fn configuration(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::Configuration, message)
    }

    /// Create a connection error
    pub fn connection(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::Connection, message)
    }

    /// Classify a driver error
    ///
    /// Constraint violations are recognised by SQLSTATE. A unique violation
    /// also keeps the constraint name and the conflicting key/value pairs
    /// reported by PostgreSQL.
    pub fn from_sqlx(operation: RepositoryOperation, err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => {
                Self::new(operation, RepositoryErrorKind::NotFound, "record not found")
            }
            sqlx::Error::Database(db) => {
                let code = db.code().map(|c| c.into_owned()).unwrap_or_default();
                match code.as_str() {
                    UNIQUE_VIOLATION => {
                        let detail = db
                            .try_downcast_ref::<PgDatabaseError>()
                            .and_then(PgDatabaseError::detail);
                        let violation = UniqueViolation::parse(db.constraint(), detail);
                        let mut error = Self::new(
                            operation,
                            RepositoryErrorKind::UniqueViolation,
                            violation.message(),
                        );
                        error.unique = Some(violation);
                        error
                    }
                    FOREIGN_KEY_VIOLATION => Self::new(
                        operation,
                        RepositoryErrorKind::ForeignKeyViolation,
                        db.message(),
                    ),
                    NOT_NULL_VIOLATION => Self::new(
                        operation,
                        RepositoryErrorKind::NotNullViolation,
                        db.message(),
                    ),
                    CHECK_VIOLATION => Self::new(
                        operation,
                        RepositoryErrorKind::CheckViolation,
                        db.message(),
                    ),
                    c if c.starts_with(CONNECTION_EXCEPTION_CLASS) => {
                        Self::connection(operation, db.message())
                    }
                    _ => Self::new(operation, RepositoryErrorKind::Database, db.message()),
                }
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::connection(operation, err.to_string()),
            _ => Self::new(operation, RepositoryErrorKind::Database, err.to_string()),
        }
    }

    /// Add entity context to an existing error
    #[must_use]
    pub fn with_entity(mut self, entity_type: impl Into<String>, entity_id: impl ToString) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id.to_string());
        self
    }

    /// Add only the entity name
    #[must_use]
    pub fn with_entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    /// Name of the violated unique constraint, if any
    pub fn constraint(&self) -> Option<&str> {
        self.unique.as_ref().and_then(|u| u.constraint.as_deref())
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == RepositoryErrorKind::NotFound
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Repository {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        match (&self.entity_type, &self.entity_id) {
            (Some(entity_type), Some(entity_id)) => write!(f, " [{}: {}]", entity_type, entity_id)?,
            (Some(entity_type), None) => write!(f, " [{}]", entity_type)?,
            _ => {}
        }
        Ok(())
    }
}

impl std::error::Error for RepositoryError {}

/// Result alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_operation_display() {
        assert_eq!(RepositoryOperation::FindAll.to_string(), "find_all");
        assert_eq!(RepositoryOperation::FindById.to_string(), "find_by_id");
        assert_eq!(RepositoryOperation::Save.to_string(), "save");
        assert_eq!(RepositoryOperation::Transaction.to_string(), "transaction");
    }

    #[test]
    fn test_not_found_convenience() {
        let error = RepositoryError::not_found("user", 7);
        assert_eq!(error.operation, RepositoryOperation::FindById);
        assert!(error.is_not_found());
        assert_eq!(error.entity_type.as_deref(), Some("user"));
        assert_eq!(error.entity_id.as_deref(), Some("7"));
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let error = RepositoryError::from_sqlx(RepositoryOperation::FindById, sqlx::Error::RowNotFound);
        assert_eq!(error.kind, RepositoryErrorKind::NotFound);
    }

    #[test]
    fn test_pool_errors_are_connection_errors() {
        let error = RepositoryError::from_sqlx(RepositoryOperation::Count, sqlx::Error::PoolTimedOut);
        assert_eq!(error.kind, RepositoryErrorKind::Connection);
        assert_eq!(error.operation, RepositoryOperation::Count);
    }

    #[test]
    fn test_display_with_entity() {
        let error = RepositoryError::not_found("product", 3);
        let display = error.to_string();
        assert!(display.contains("not_found"));
        assert!(display.contains("find_by_id"));
        assert!(display.contains("[product: 3]"));
    }

    #[test]
    fn test_display_with_entity_type_only() {
        let error = RepositoryError::configuration(RepositoryOperation::FindAll, "bad column")
            .with_entity_type("user");
        assert!(error.to_string().ends_with("bad column [user]"));
    }
}
