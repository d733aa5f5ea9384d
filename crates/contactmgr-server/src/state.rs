//! Shared application state.

use std::sync::Arc;

use contactmgr_providers::google::OAuthClient;

use crate::contacts::ContactService;
use crate::session::SessionStore;

/// State handed to every handler.
///
/// Everything here is either immutable or internally synchronized, so
/// cloning per request is cheap.
#[derive(Debug, Clone)]
pub struct AppState {
    pub contacts: ContactService,
    pub sessions: SessionStore,
    pub oauth: Arc<OAuthClient>,
}

impl AppState {
    pub fn new(contacts: ContactService, sessions: SessionStore, oauth: OAuthClient) -> Self {
        Self {
            contacts,
            sessions,
            oauth: Arc::new(oauth),
        }
    }
}
