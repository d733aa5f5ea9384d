//! Web application: routes, sessions, sign-in, configuration.
//!
//! This crate provides the contactmgr web server that handles:
//! - Google sign-in (authorization code + PKCE) and server-side sessions
//! - The contact list, add, edit and delete pages
//! - Method override for HTML forms
//! - TOML configuration and the `contactmgr` command line
//!
//! # Example
//!
//! ```rust,no_run
//! use contactmgr_server::{ServerConfig, commands};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::load(None)?;
//!     commands::serve(&config).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod contacts;
pub mod error;
pub mod method_override;
pub mod routes;
pub mod secret;
pub mod session;
pub mod state;
pub mod views;

pub use auth::CurrentIdentity;
pub use config::ServerConfig;
pub use contacts::{ContactService, UpdateOutcome};
pub use error::{AppError, ServerError, ServerResult};
pub use method_override::{MethodOverride, MethodOverrideLayer};
pub use session::{Flash, Session, SessionStore};
pub use state::AppState;
