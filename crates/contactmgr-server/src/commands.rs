//! Command implementations.

use std::sync::Arc;

use axum::ServiceExt;
use axum::extract::Request;
use contactmgr_providers::ContactProvider;
use contactmgr_providers::google::GoogleProvider;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::contacts::ContactService;
use crate::error::{ServerError, ServerResult};
use crate::routes;
use crate::session::SessionStore;
use crate::state::AppState;

/// Builds the application state from the configuration.
pub fn build_state(config: &ServerConfig) -> ServerResult<AppState> {
    let google = GoogleProvider::new(config.google_config()?)?;
    let oauth = google.oauth().clone();
    let list_options = google.list_options();
    info!(provider = google.name(), "Provider registered");

    let provider: Arc<dyn ContactProvider> = Arc::new(google);
    let sessions = SessionStore::new(config.server.session_ttl())
        .with_secure_cookies(config.server.secure_cookies);

    Ok(AppState::new(
        ContactService::new(provider, list_options),
        sessions,
        oauth,
    ))
}

/// Runs the web server until SIGINT or SIGTERM.
pub async fn serve(config: &ServerConfig) -> ServerResult<()> {
    config.validate()?;
    let addr = config.server.bind_addr()?;
    let state = build_state(config)?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::bind(addr.to_string(), e))?;
    info!(
        addr = %addr,
        public_url = %config.server.public_url,
        "Server listening"
    );

    let app = routes::app(state);
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, initiating shutdown"),
        _ = terminate => info!("Received SIGTERM, initiating shutdown"),
    }
}

/// Prints the effective configuration with secrets masked.
pub fn config_dump(config: &ServerConfig) -> ServerResult<()> {
    println!("# config.toml ({})", ServerConfig::default_path().display());
    println!("{}", config.dump()?);
    Ok(())
}

/// Validates the configuration.
pub fn config_validate(config: &ServerConfig) -> ServerResult<()> {
    config.validate()?;
    println!("Google credentials are valid.");
    println!("Configuration is valid.");
    Ok(())
}

/// Prints the configuration file path.
pub fn config_path() -> ServerResult<()> {
    println!("config: {}", ServerConfig::default_path().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ENV_CLIENT_ID;

    #[test]
    fn build_state_requires_credentials() {
        let config = ServerConfig::default();
        let err = build_state(&config).unwrap_err();
        assert!(matches!(err, ServerError::Config { .. }));
    }

    #[test]
    fn build_state_from_inline_credentials() {
        let mut config = ServerConfig::default();
        config.apply_env_overrides(|key| match key {
            ENV_CLIENT_ID => Some("id.apps.googleusercontent.com".to_string()),
            _ => Some("secret".to_string()),
        });
        config.server.secure_cookies = true;

        let state = build_state(&config).unwrap();
        assert_eq!(state.contacts.provider_name(), "google");
        assert!(state.sessions.cookie("x").ends_with("; Secure"));
        assert_eq!(state.sessions.ttl(), config.server.session_ttl());
    }
}
