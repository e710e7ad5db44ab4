use sqlx::error::ErrorKind;

/// Storage errors, classified into the categories callers branch on
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Record not found")]
    NotFound,

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("Check constraint violated: {0}")]
    CheckViolation(String),

    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Database error: {0}")]
    Other(sqlx::Error),
}

impl DbError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::UniqueViolation(_))
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        let classified = err
            .as_database_error()
            .map(|db_err| (db_err.kind(), db_err.message().to_string()));

        match classified {
            Some((ErrorKind::UniqueViolation, msg)) => DbError::UniqueViolation(msg),
            Some((ErrorKind::ForeignKeyViolation, msg)) => DbError::ForeignKeyViolation(msg),
            Some((ErrorKind::CheckViolation, msg)) | Some((ErrorKind::NotNullViolation, msg)) => {
                DbError::CheckViolation(msg)
            }
            Some(_) => DbError::Other(err),
            None => match err {
                sqlx::Error::RowNotFound => DbError::NotFound,
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                    DbError::Connection(err.to_string())
                }
                other => DbError::Other(other),
            },
        }
    }
}
