use hospital_model::{Collection, TransitionError, ValidationError};
use std::io;
use thiserror::Error;
use tokio::task::JoinError;
use tokio::time::error::Elapsed;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database connection timed out")]
    ConnectionTimeout(#[from] Elapsed),

    #[error("Error creating database connection after {retries} retries")]
    DatabaseConnection { retries: u32 },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("{} not found", collection.label())]
    NotFound { collection: Collection },

    #[error(transparent)]
    Prometheus(#[from] metrics_exporter_prometheus::BuildError),

    #[error("Server task failed")]
    ServerTask(#[from] JoinError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Persistence check failed for {email}: {reason}")]
    Verification { email: String, reason: String },

    #[error("Unknown error")]
    Unknown,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Database url {url} could not be parsed")]
    InvalidDatabaseUrl { url: String },

    #[error("Invalid parameter {name}: {value}")]
    InvalidParameter { name: String, value: String },

    #[error("Missing field {name} from configuration file or environment")]
    MissingParameter { name: String },

    #[error(transparent)]
    Certificate(#[from] rustls::Error),

    #[error(transparent)]
    FileOrEnvironment(#[from] config::ConfigError),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] tokio_postgres::Error),

    #[error("Document in {collection} has no valid id")]
    MissingId { collection: Collection },

    #[error("Document was modified concurrently, {field} is no longer {expected}")]
    PreconditionFailed { field: String, expected: String },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error("Duplicate value for unique field {field}")]
    UniqueViolation { field: String },
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Session token is missing or expired")]
    Unauthenticated,

    #[error("User already exists")]
    UserExists,

    #[error("Stored password hash is malformed")]
    MalformedHash,

    #[error("Password hashing did not complete")]
    Hashing(#[from] JoinError),
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::Config(e.into())
    }
}

impl From<tokio_postgres::Error> for Error {
    fn from(e: tokio_postgres::Error) -> Self {
        Error::Store(e.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Validation(e.into())
    }
}

impl From<rustls::Error> for Error {
    fn from(e: rustls::Error) -> Self {
        Error::Config(e.into())
    }
}

impl Error {
    pub fn not_found(collection: Collection) -> Self {
        Error::NotFound { collection }
    }
}
