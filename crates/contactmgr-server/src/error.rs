//! Server error types.

use std::io;

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use contactmgr_core::{ContactError, ContactErrorKind};
use thiserror::Error;

use crate::views;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur while starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// IO error (listener, file, etc.).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Could not bind the listener.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Provider could not be initialized.
    #[error("Provider error: {0}")]
    Provider(#[from] contactmgr_providers::ProviderError),

    /// Tracing could not be initialized.
    #[error("Tracing error: {0}")]
    Tracing(#[from] contactmgr_core::TracingError),
}

impl ServerError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a bind error.
    pub fn bind(addr: impl Into<String>, source: io::Error) -> Self {
        Self::Bind {
            addr: addr.into(),
            source,
        }
    }
}

/// Path of the login page; unauthenticated requests are sent here.
pub const LOGIN_PATH: &str = "/contacts/login";

/// Error returned by request handlers and middleware.
#[derive(Debug, Error)]
pub enum AppError {
    /// A contact operation failed.
    #[error(transparent)]
    Contact(#[from] ContactError),

    /// The OAuth sign-in could not be completed.
    #[error("sign-in failed: {0}")]
    SignIn(String),
}

impl AppError {
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Contact(ContactError::unauthenticated(message))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::SignIn(_) => Redirect::to(&format!("{LOGIN_PATH}?error")).into_response(),
            Self::Contact(err) => {
                let status = match err.kind() {
                    ContactErrorKind::Unauthenticated => {
                        return Redirect::to(LOGIN_PATH).into_response();
                    }
                    ContactErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
                    ContactErrorKind::NotFound => StatusCode::NOT_FOUND,
                    ContactErrorKind::RemoteService => StatusCode::BAD_GATEWAY,
                    ContactErrorKind::Transport => StatusCode::SERVICE_UNAVAILABLE,
                };
                let message = match err.kind() {
                    ContactErrorKind::Transport => "Service temporarily unavailable",
                    _ => err.message(),
                };
                (status, Html(views::error_page(message))).into_response()
            }
        }
    }
}
