//! Google People provider configuration.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::provider::{DEFAULT_PAGE_SIZE, DEFAULT_PERSON_FIELDS};

/// OAuth 2.0 credentials of the registered web application.
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    /// The OAuth 2.0 client ID from Google Cloud Console.
    pub client_id: String,
    /// The OAuth 2.0 client secret from Google Cloud Console.
    pub client_secret: String,
}

/// Structure of Google's OAuth credentials JSON file.
///
/// Supports the Cloud Console download (`web` or `installed` section) and
/// a flat `client_id`/`client_secret` object.
#[derive(Debug, Deserialize)]
struct GoogleCredentialsFile {
    web: Option<NestedCredentials>,
    installed: Option<NestedCredentials>,
    client_id: Option<String>,
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NestedCredentials {
    client_id: String,
    client_secret: String,
}

impl OAuthCredentials {
    /// Creates new OAuth credentials.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Loads OAuth credentials from a Google Cloud Console JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| format!("failed to read credentials file: {}", e))?;
        Self::from_json(&content)
    }

    /// Parses OAuth credentials from a Google credentials JSON string.
    ///
    /// A `web` section wins over `installed`, which wins over root-level keys.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let file: GoogleCredentialsFile = serde_json::from_str(json)
            .map_err(|e| format!("failed to parse credentials JSON: {}", e))?;

        if let Some(creds) = file.web.or(file.installed) {
            return Ok(Self::new(creds.client_id, creds.client_secret));
        }

        if let (Some(client_id), Some(client_secret)) = (file.client_id, file.client_secret) {
            return Ok(Self::new(client_id, client_secret));
        }

        Err("credentials file must contain a 'web'/'installed' section or 'client_id'/'client_secret' at root level".to_string())
    }

    /// Validates that the credentials appear to be correctly formatted.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.client_id.is_empty() {
            return Err("client_id is required");
        }
        if !self.client_id.ends_with(".apps.googleusercontent.com") {
            return Err("client_id should end with .apps.googleusercontent.com");
        }
        if self.client_secret.is_empty() {
            return Err("client_secret is required");
        }
        Ok(())
    }
}

/// Remote endpoints used by the provider.
///
/// Only tests point these anywhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleEndpoints {
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub people_base_url: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_url: "https://openidconnect.googleapis.com/v1/userinfo".to_string(),
            people_base_url: "https://people.googleapis.com/v1".to_string(),
        }
    }
}

impl GoogleEndpoints {
    /// Points every endpoint at a single base URL (for mock servers).
    pub fn local(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            auth_url: format!("{base}/o/oauth2/v2/auth"),
            token_url: format!("{base}/token"),
            userinfo_url: format!("{base}/userinfo"),
            people_base_url: format!("{base}/v1"),
        }
    }
}

/// Configuration for the Google People provider and sign-in flow.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// OAuth credentials of the web application.
    pub credentials: OAuthCredentials,

    /// Absolute callback URL registered with Google
    /// (`{public_url}/login/oauth2/code/google`).
    pub redirect_uri: String,

    /// OAuth scopes to request.
    pub scopes: Vec<String>,

    /// Person fields requested when listing and fetching.
    pub person_fields: String,

    /// Page size when listing connections.
    pub page_size: u32,

    /// Request timeout.
    pub timeout: Duration,

    /// User agent string for API requests.
    pub user_agent: String,

    pub endpoints: GoogleEndpoints,
}

impl GoogleConfig {
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Scopes needed to sign in and manage contacts.
    pub const DEFAULT_SCOPES: [&'static str; 4] = [
        "openid",
        "email",
        "profile",
        "https://www.googleapis.com/auth/contacts",
    ];

    /// Path of the OAuth callback, relative to the public URL.
    pub const CALLBACK_PATH: &'static str = "/login/oauth2/code/google";

    /// Creates a configuration whose callback lives under `public_url`.
    pub fn new(credentials: OAuthCredentials, public_url: &str) -> Self {
        Self {
            credentials,
            redirect_uri: format!(
                "{}{}",
                public_url.trim_end_matches('/'),
                Self::CALLBACK_PATH
            ),
            scopes: Self::DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            person_fields: DEFAULT_PERSON_FIELDS.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("contactmgr/{}", env!("CARGO_PKG_VERSION")),
            endpoints: GoogleEndpoints::default(),
        }
    }

    /// Sets the person fields.
    pub fn with_person_fields(mut self, fields: impl Into<String>) -> Self {
        self.person_fields = fields.into();
        self
    }

    /// Sets the page size.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the OAuth scopes.
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Sets the remote endpoints.
    pub fn with_endpoints(mut self, endpoints: GoogleEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.credentials
            .validate()
            .map_err(|e| format!("invalid credentials: {}", e))?;

        if !self.scopes.iter().any(|s| s.ends_with("/auth/contacts")) {
            return Err("the contacts scope is required".to_string());
        }

        if !(self.redirect_uri.starts_with("http://") || self.redirect_uri.starts_with("https://"))
        {
            return Err(format!(
                "redirect URI must be absolute: {}",
                self.redirect_uri
            ));
        }

        if self.person_fields.trim().is_empty() {
            return Err("person_fields must not be empty".to_string());
        }

        if !(1..=1000).contains(&self.page_size) {
            return Err("page_size must be between 1 and 1000".to_string());
        }

        Ok(())
    }
}
