//! Error types for restline-github.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    pub kind: ErrorKind,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// The session error behind this one, if any.
    pub fn client_error(&self) -> Option<&restline_client::Error> {
        self.source
            .as_deref()
            .and_then(|source| source.downcast_ref::<restline_client::Error>())
    }

    /// The HTTP status GitHub answered with, if the request got that far.
    pub fn status(&self) -> Option<u16> {
        self.client_error()
            .and_then(restline_client::Error::api_error)
            .map(|err| err.status)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    #[error("Client error: {0}")]
    Client(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl From<restline_client::Error> for Error {
    fn from(err: restline_client::Error) -> Self {
        Error {
            kind: ErrorKind::Client(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}
