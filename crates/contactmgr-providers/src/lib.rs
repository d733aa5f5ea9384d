//! ContactProvider trait and the Google People implementation.
//!
//! - [`ContactProvider`] - The trait the web layer talks to
//! - [`ProviderError`] - Error types for provider operations
//! - [`google`] - People API client and the OAuth 2.0 web flow
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐      ┌──────────────────┐
//! │  People API v1   │      │  Google OAuth 2  │
//! └────────┬─────────┘      └────────┬─────────┘
//!          │                         │
//!          ▼                         ▼
//! ┌──────────────────┐      ┌──────────────────┐
//! │ GooglePeopleClient│     │   OAuthClient    │
//! └────────┬─────────┘      └────────┬─────────┘
//!          │                         │
//!          ▼                         │ TokenInfo
//! ┌──────────────────┐               │
//! │  GoogleProvider  │◄──────────────┘ (access token per call)
//! └────────┬─────────┘
//!          │  ContactProvider
//!          ▼
//!     ContactRecord
//! ```

pub mod error;
pub mod google;
pub mod provider;

// Re-export main types at crate root
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use provider::{
    BoxFuture, ContactProvider, DEFAULT_PAGE_SIZE, DEFAULT_PERSON_FIELDS, ListOptions,
    validate_resource_name,
};
