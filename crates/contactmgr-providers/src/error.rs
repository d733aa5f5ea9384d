//! Error types for contact provider operations.
//!
//! Provider errors keep the fine-grained HTTP-level classification; the web
//! layer only sees the coarser [`ContactErrorKind`] they convert into.

use std::fmt;

use contactmgr_core::{ContactError, ContactErrorKind};
use thiserror::Error;

/// The category of a provider error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// Authentication failed or the access token is invalid/expired.
    AuthenticationFailed,
    /// The token lacks permission for the resource (403).
    AuthorizationFailed,
    /// Connection failed, timeout, DNS resolution, etc.
    NetworkError,
    /// Too many requests (429).
    RateLimited,
    /// Server returned a 5xx status.
    ServerError,
    /// Response body could not be parsed.
    InvalidResponse,
    /// Resource not found (404).
    NotFound,
    /// Request was rejected as invalid (400).
    BadRequest,
    /// The etag sent with an update is no longer current.
    PreconditionFailed,
    /// Missing or invalid configuration.
    ConfigurationError,
    /// Unexpected state in the provider itself.
    InternalError,
}

impl ProviderErrorCode {
    /// Returns a human-readable name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::AuthorizationFailed => "authorization_failed",
            Self::NetworkError => "network_error",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::NotFound => "not_found",
            Self::BadRequest => "bad_request",
            Self::PreconditionFailed => "precondition_failed",
            Self::ConfigurationError => "configuration_error",
            Self::InternalError => "internal_error",
        }
    }

    /// Maps this code onto the operation-level error taxonomy.
    pub fn kind(&self) -> ContactErrorKind {
        match self {
            Self::AuthenticationFailed => ContactErrorKind::Unauthenticated,
            Self::NotFound => ContactErrorKind::NotFound,
            Self::NetworkError | Self::ConfigurationError | Self::InternalError => {
                ContactErrorKind::Transport
            }
            Self::AuthorizationFailed
            | Self::RateLimited
            | Self::ServerError
            | Self::InvalidResponse
            | Self::BadRequest
            | Self::PreconditionFailed => ContactErrorKind::RemoteService,
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error that occurred while talking to a contact provider.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    /// The provider that generated this error (e.g. "google").
    provider: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    /// Creates a new provider error with the given code and message.
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider: None,
            source: None,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthenticationFailed, message)
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthorizationFailed, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::RateLimited, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ServerError, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::BadRequest, message)
    }

    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::PreconditionFailed, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ConfigurationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InternalError, message)
    }

    /// Sets the provider name for this error.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref provider) = self.provider {
            write!(f, "[{}] ", provider)?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl From<ProviderError> for ContactError {
    fn from(err: ProviderError) -> Self {
        ContactError::new(err.code.kind(), err.message)
    }
}

/// A specialized Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_display() {
        assert_eq!(
            ProviderErrorCode::AuthenticationFailed.as_str(),
            "authentication_failed"
        );
        assert_eq!(
            ProviderErrorCode::PreconditionFailed.to_string(),
            "precondition_failed"
        );
    }

    #[test]
    fn codes_map_onto_taxonomy() {
        assert_eq!(
            ProviderErrorCode::AuthenticationFailed.kind(),
            ContactErrorKind::Unauthenticated
        );
        assert_eq!(ProviderErrorCode::NotFound.kind(), ContactErrorKind::NotFound);
        assert_eq!(ProviderErrorCode::NetworkError.kind(), ContactErrorKind::Transport);
        assert_eq!(
            ProviderErrorCode::PreconditionFailed.kind(),
            ContactErrorKind::RemoteService
        );
        assert_eq!(
            ProviderErrorCode::BadRequest.kind(),
            ContactErrorKind::RemoteService
        );
    }

    #[test]
    fn provider_error_with_provider() {
        let err = ProviderError::network("connection timeout").with_provider("google");
        assert_eq!(err.code(), ProviderErrorCode::NetworkError);
        assert_eq!(err.provider(), Some("google"));
        assert_eq!(err.to_string(), "[google] network_error: connection timeout");
    }

    #[test]
    fn conversion_keeps_message() {
        let err: ContactError = ProviderError::bad_request("Invalid phone number").into();
        assert_eq!(err.kind(), ContactErrorKind::RemoteService);
        assert_eq!(err.message(), "Invalid phone number");
    }

    #[test]
    fn provider_error_with_source() {
        use std::error::Error;
        let io_err = std::io::Error::other("tls handshake");
        let err = ProviderError::network("request failed").with_source(io_err);
        assert!(err.source().is_some());
    }
}
