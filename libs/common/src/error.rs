//! Error types of the recipe database layer

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Failure while setting up or talking to the SQLite database
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// The database file could not be opened
    #[error("Could not open the database: {0}")]
    Connection(#[source] SqlxError),

    /// A statement failed
    #[error("Database query failed: {0}")]
    Query(#[source] SqlxError),

    /// A schema statement failed; `statement` holds its first line
    #[error("Schema migration failed at `{statement}`: {source}")]
    Migration {
        statement: String,
        #[source]
        source: SqlxError,
    },

    /// `DATABASE_URL` is not a usable SQLite URL
    #[error("Invalid database URL: {0}")]
    Configuration(#[source] SqlxError),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;
