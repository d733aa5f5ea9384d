//! Google People provider implementation.
//!
//! # Features
//!
//! - OAuth 2.0 Authorization Code flow with PKCE for a web application
//! - Access token refresh
//! - Contact list (paginated), get, create, partial update, delete
//! - People API error envelope mapped onto [`ProviderError`](crate::ProviderError)
//!
//! # Example
//!
//! ```ignore
//! use contactmgr_providers::google::{GoogleConfig, GoogleProvider, OAuthCredentials};
//!
//! let credentials = OAuthCredentials::new(
//!     "your-client-id.apps.googleusercontent.com",
//!     "your-client-secret",
//! );
//! let provider = GoogleProvider::new(GoogleConfig::new(credentials, "http://localhost:8080"))?;
//! let contacts = provider.list_connections(&access_token, provider.list_options()).await?;
//! ```

mod client;
mod config;
mod oauth;
mod provider;
mod tokens;

pub use client::GooglePeopleClient;
pub use config::{GoogleConfig, GoogleEndpoints, OAuthCredentials};
pub use oauth::{OAuthClient, PkceFlow, UserInfo, random_token, verify_state};
pub use provider::{GoogleProvider, PROVIDER_NAME};
pub use tokens::TokenInfo;
