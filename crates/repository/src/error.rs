//! Error types for the repository layer.
//!
//! Driver failures are carried through unchanged in [`RepositoryError::Driver`];
//! the remaining variants cover problems the repository detects itself before
//! or after handing work to the driver.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use mongodb::error::{ErrorKind, WriteFailure};
use thiserror::Error;

/// The primary error type for all repository operations.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// An error reported by the MongoDB driver, passed through as-is.
    #[error(transparent)]
    Driver(#[from] mongodb::error::Error),

    /// A value could not be converted into BSON.
    #[error("serialization error: {message}")]
    Serialization { message: String },

    /// A BSON value returned by the driver could not be decoded.
    #[error("deserialization error: {message}")]
    Deserialization { message: String },

    /// The caller cancelled the operation before the driver call completed.
    #[error("operation {operation} was cancelled")]
    Cancelled { operation: &'static str },

    /// The caller supplied an argument the repository cannot use.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// The document key was left unset and its type cannot be generated.
    #[error("cannot generate a key of type {key_type}; set the document id before inserting")]
    KeyGeneration { key_type: &'static str },

    /// Configuration errors.
    #[error(transparent)]
    Configuration(#[from] ConfigError),
}

/// Errors raised while validating a [`MongoDbConfig`](crate::config::MongoDbConfig).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("connection string must not be empty")]
    EmptyConnectionString,

    #[error("connection string must start with mongodb:// or mongodb+srv://: {connection_string}")]
    InvalidScheme { connection_string: String },

    #[error("invalid database name '{name}': {reason}")]
    InvalidDatabaseName { name: String, reason: String },

    #[error("min_pool_size ({min}) exceeds max_pool_size ({max})")]
    PoolSizeMismatch { min: u32, max: u32 },

    #[error("invalid value for {variable}: {value}")]
    InvalidEnvValue { variable: String, value: String },
}

impl RepositoryError {
    /// Returns `true` if the driver rejected a write because of a unique index.
    ///
    /// The error itself is left untouched; this only inspects it.
    pub fn is_duplicate_key(&self) -> bool {
        const DUPLICATE_KEY: i32 = 11000;

        let RepositoryError::Driver(err) = self else {
            return false;
        };
        match err.kind.as_ref() {
            ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
                write_error.code == DUPLICATE_KEY
            }
            ErrorKind::InsertMany(insert_many) => insert_many
                .write_errors
                .as_ref()
                .is_some_and(|errors| errors.iter().any(|e| e.code == DUPLICATE_KEY)),
            ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY,
            _ => false,
        }
    }

    /// Returns `true` if the operation was cancelled by the caller.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RepositoryError::Cancelled { .. })
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        RepositoryError::InvalidArgument {
            message: message.into(),
        }
    }
}

/// Result type alias for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

impl From<mongodb::bson::ser::Error> for RepositoryError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        RepositoryError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<mongodb::bson::de::Error> for RepositoryError {
    fn from(err: mongodb::bson::de::Error) -> Self {
        RepositoryError::Deserialization {
            message: err.to_string(),
        }
    }
}
