use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Not signed in")]
    NotSignedIn,
}

#[derive(Error, Debug)]
pub enum ApiError {
    /// The server answered with a non-2xx status
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Connection error: {0}")]
    Connection(#[from] reqwest::Error),

    #[error("Invalid API url {url}")]
    InvalidUrl { url: String },
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Rejected { status, .. } => Some(*status),
            ApiError::Connection(err) => err.status().map(|s| s.as_u16()),
            ApiError::InvalidUrl { .. } => None,
        }
    }
}

impl Error {
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api(err) => err.status(),
            _ => None,
        }
    }
}
