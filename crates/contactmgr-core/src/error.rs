//! Error taxonomy for contact operations.
//!
//! Every operation the web layer performs ends in either a value or a
//! [`ContactError`]. The [`ContactErrorKind`] decides how the failure is
//! surfaced to the user (redirect to login, flash message, error page).

use std::fmt;

use thiserror::Error;

/// The category of a contact operation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactErrorKind {
    /// No valid session or access token at the time of the operation.
    Unauthenticated,
    /// The contact identifier does not resolve upstream.
    NotFound,
    /// The remote service rejected the request (stale etag, invalid value).
    RemoteService,
    /// Network or transport setup failure.
    Transport,
    /// Malformed local input.
    InvalidRequest,
}

impl ContactErrorKind {
    /// Returns a stable machine-readable name for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::NotFound => "not_found",
            Self::RemoteService => "remote_service_error",
            Self::Transport => "transport_error",
            Self::InvalidRequest => "invalid_request",
        }
    }
}

impl fmt::Display for ContactErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error produced by a contact operation.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct ContactError {
    kind: ContactErrorKind,
    message: String,
}

impl ContactError {
    /// Creates a new error with the given kind and message.
    pub fn new(kind: ContactErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Creates an unauthenticated error.
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(ContactErrorKind::Unauthenticated, message)
    }

    /// Creates a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ContactErrorKind::NotFound, message)
    }

    /// Creates a remote service error.
    pub fn remote(message: impl Into<String>) -> Self {
        Self::new(ContactErrorKind::RemoteService, message)
    }

    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ContactErrorKind::Transport, message)
    }

    /// Creates an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ContactErrorKind::InvalidRequest, message)
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ContactErrorKind {
        self.kind
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns true if the user has to sign in again.
    pub fn is_unauthenticated(&self) -> bool {
        self.kind == ContactErrorKind::Unauthenticated
    }
}

/// A specialized Result type for contact operations.
pub type ContactResult<T> = Result<T, ContactError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_are_stable() {
        assert_eq!(ContactErrorKind::Unauthenticated.as_str(), "unauthenticated");
        assert_eq!(ContactErrorKind::RemoteService.as_str(), "remote_service_error");
        assert_eq!(ContactErrorKind::Transport.to_string(), "transport_error");
    }

    #[test]
    fn display_includes_kind_and_message() {
        let err = ContactError::not_found("people/c42");
        assert_eq!(err.to_string(), "not_found: people/c42");
        assert_eq!(err.message(), "people/c42");
        assert!(!err.is_unauthenticated());
    }

    #[test]
    fn unauthenticated_flag() {
        assert!(ContactError::unauthenticated("no session").is_unauthenticated());
    }
}
