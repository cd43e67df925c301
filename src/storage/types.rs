use thiserror::Error;

/// Database errors with messages fit for the terminal.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Another instance of newsdesk appears to be running. Please close it and try again.")]
    InstanceLocked,

    #[error("Database migration failed: {0}")]
    Migration(String),

    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Classifies lock and open failures (SQLITE_BUSY, SQLITE_LOCKED,
    /// SQLITE_CANTOPEN) as another running instance.
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        let message = err.to_string().to_lowercase();
        let locked = [
            "database is locked",
            "database table is locked",
            "sqlite_busy",
            "sqlite_locked",
            "unable to open database file",
        ]
        .iter()
        .any(|needle| message.contains(needle));

        if locked {
            DatabaseError::InstanceLocked
        } else {
            DatabaseError::Other(err)
        }
    }
}
