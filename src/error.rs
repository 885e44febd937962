use sea_orm::{DbErr, RuntimeErr, SqlErr};

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by schema operations.
///
/// Constraint failures are reported by the storage engine; this type only
/// sorts them into the kinds callers usually care about.
#[derive(Debug, derive_more::Display)]
pub enum Error {
    /// A UNIQUE constraint rejected the row (duplicate email or username).
    #[display(fmt = "unique constraint violated: {}", _0)]
    UniqueViolation(String),
    /// A FOREIGN KEY constraint rejected the row (dangling owner reference).
    #[display(fmt = "foreign key constraint violated: {}", _0)]
    ForeignKeyViolation(String),
    /// A CHECK constraint rejected the row (i.e. unknown media type).
    #[display(fmt = "check constraint violated: {}", _0)]
    CheckViolation(String),
    #[display(fmt = "database error: {}", _0)]
    Database(DbErr),
    #[display(fmt = "password hashing failed: {}", _0)]
    Password(String),
    #[display(fmt = "configuration error: {}", _0)]
    Config(String),
    #[display(fmt = "invalid media type: {}", _0)]
    InvalidMediaType(String),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Database(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DbErr> for Error {
    fn from(e: DbErr) -> Self {
        match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => return Error::UniqueViolation(msg),
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => {
                return Error::ForeignKeyViolation(msg)
            }
            _ => {}
        }

        // sea-orm does not classify CHECK failures, so look at the driver message.
        if let DbErr::Exec(RuntimeErr::SqlxError(inner)) | DbErr::Query(RuntimeErr::SqlxError(inner)) =
            &e
        {
            let msg = inner.to_string();
            if msg.to_ascii_lowercase().contains("check constraint") {
                return Error::CheckViolation(msg);
            }
        }

        Error::Database(e)
    }
}

impl From<argon2::password_hash::Error> for Error {
    fn from(e: argon2::password_hash::Error) -> Self {
        Error::Password(e.to_string())
    }
}
