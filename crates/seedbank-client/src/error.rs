use std::fmt;
use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("connect to {addr} failed: {source}")]
    Connection {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("secure channel failed: {0}")]
    Channel(String),
    #[error("remote returned an empty response")]
    EmptyResponse,
    #[error("credential verification failed: {0}")]
    Verification(#[from] jsonwebtoken::errors::Error),
    #[error("no {0} negotiated yet")]
    MissingSession(&'static str),
}

pub type ExchangeResult<T> = Result<T, ExchangeError>;

/// Coarse failure category, for logs and for callers that branch on cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Connection,
    Channel,
    EmptyResponse,
    Verification,
    Precondition,
}

impl ExchangeError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ExchangeError::Connection { .. } => FailureKind::Connection,
            ExchangeError::Channel(_) => FailureKind::Channel,
            ExchangeError::EmptyResponse => FailureKind::EmptyResponse,
            ExchangeError::Verification(_) => FailureKind::Verification,
            ExchangeError::MissingSession(_) => FailureKind::Precondition,
        }
    }

    pub(crate) fn channel(err: impl fmt::Display) -> Self {
        ExchangeError::Channel(err.to_string())
    }
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Connection => "connection",
            FailureKind::Channel => "channel",
            FailureKind::EmptyResponse => "empty_response",
            FailureKind::Verification => "verification",
            FailureKind::Precondition => "precondition",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
