//! Error types for the news client.

use thiserror::Error;

/// Errors produced while building the client or talking to the news API.
#[derive(Debug, Error)]
pub enum Error {
    /// The response cache could not be opened or written.
    #[error("Cache error: {0}")]
    Cache(String),
    /// Filesystem error underneath the cache.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The request never produced a response (DNS, connection reset, timeout).
    #[error("Transport error: {0}")]
    Transport(String),
    /// The server answered with a non-success status.
    #[error("HTTP error ({status})")]
    Status {
        /// HTTP status code
        status: u16,
    },
    /// A success response whose body decoded to `null`.
    #[error("Response had no body")]
    EmptyBody,
    /// The response body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
    /// The request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
    /// The worker runtime could not be started.
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            Error::Status {
                status: status.as_u16(),
            }
        } else {
            Error::Transport(err.to_string())
        }
    }
}

impl From<reqwest_middleware::Error> for Error {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(e) => e.into(),
            // Middleware in this crate report failures as `Error`.
            reqwest_middleware::Error::Middleware(e) => match e.downcast::<Error>() {
                Ok(err) => err,
                Err(e) => Error::Transport(e.to_string()),
            },
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn middleware_errors_keep_their_variant() {
        let wrapped = reqwest_middleware::Error::middleware(Error::Status { status: 418 });
        assert!(matches!(Error::from(wrapped), Error::Status { status: 418 }));
    }

    #[test]
    fn foreign_middleware_errors_become_transport_errors() {
        let wrapped = reqwest_middleware::Error::Middleware(anyhow::anyhow!("dns lookup failed"));
        match Error::from(wrapped) {
            Error::Transport(message) => assert!(message.contains("dns lookup failed")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
