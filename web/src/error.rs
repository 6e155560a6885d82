use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub type Result<T> = core::result::Result<T, Error>;

/// Errors surfaced by the web layer, either as HTTP responses or as the
/// reason the server could not start.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: WebErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum WebErrorKind {
    /// No route matches the request path.
    NotFound,
    /// The listening socket could not be bound.
    Bind { addr: String },
    Internal,
}

impl Error {
    pub fn not_found() -> Self {
        Self {
            source: None,
            error_kind: WebErrorKind::NotFound,
        }
    }

    pub fn bind(addr: &str, err: std::io::Error) -> Self {
        Self {
            source: Some(Box::new(err)),
            error_kind: WebErrorKind::Bind {
                addr: addr.to_string(),
            },
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        match (&self.error_kind, &self.source) {
            (WebErrorKind::Bind { addr }, Some(source)) => {
                write!(fmt, "failed to bind {addr}: {source}")
            }
            (WebErrorKind::Bind { addr }, None) => write!(fmt, "failed to bind {addr}"),
            (kind, Some(source)) => write!(fmt, "{kind:?}: {source}"),
            (kind, None) => write!(fmt, "{kind:?}"),
        }
    }
}

// List of possible StatusCode variants https://docs.rs/http/latest/http/status/struct.StatusCode.html
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self.error_kind {
            WebErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT FOUND").into_response(),
            WebErrorKind::Bind { .. } | WebErrorKind::Internal => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR").into_response()
            }
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self {
            source: Some(Box::new(err)),
            error_kind: WebErrorKind::Internal,
        }
    }
}
