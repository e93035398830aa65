use std::fmt;

/// Result type for hgcollect-store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the persistence layer
#[derive(Debug)]
pub enum Error {
    /// Database operation failed
    Database(rusqlite::Error),
}

impl Error {
    /// Whether retrying the operation may succeed (SQLite busy/locked).
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Database(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            Error::Database(_) => false,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Database(err) => write!(f, "database error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Database(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_and_locked_are_transient() {
        for code in [5, 6] {
            let err = Error::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(code),
                Some("database is locked".to_string()),
            ));
            assert!(err.is_transient(), "code {code} should be transient");
        }
    }

    #[test]
    fn other_failures_are_not_transient() {
        let err = Error::Database(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(19), // constraint violation
            Some("NOT NULL constraint failed".to_string()),
        ));
        assert!(!err.is_transient());

        let err = Error::Database(rusqlite::Error::InvalidQuery);
        assert!(!err.is_transient());
    }
}
