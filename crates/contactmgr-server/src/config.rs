//! Server configuration.
//!
//! All settings live in a single `config.toml`, by default at
//! `~/.config/contactmgr/config.toml`.
//!
//! Credential values (`client_id`, `client_secret`) support secret references:
//! - `pass::path/in/store`: resolved via `pass show`
//! - `env::VAR_NAME`: resolved from the environment
//! - plain text: used as-is

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use contactmgr_core::{TracingConfig, TracingOutputFormat};
use contactmgr_providers::google::{GoogleConfig, OAuthCredentials};
use contactmgr_providers::{DEFAULT_PAGE_SIZE, DEFAULT_PERSON_FIELDS};
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Environment variable overriding `[google] client_id`.
pub const ENV_CLIENT_ID: &str = "GOOGLE_CLIENT_ID";
/// Environment variable overriding `[google] client_secret`.
pub const ENV_CLIENT_SECRET: &str = "GOOGLE_CLIENT_SECRET";

/// Configuration for the contactmgr server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP listener and session settings.
    pub server: HttpSettings,

    /// Google sign-in and People API settings.
    pub google: GoogleSettings,

    /// Log output settings.
    pub logging: LoggingSettings,
}

/// HTTP listener and session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Address to listen on.
    pub bind: String,

    /// Externally visible base URL; the OAuth callback is derived from it.
    pub public_url: String,

    /// Idle lifetime of a session, in minutes.
    pub session_ttl_minutes: u64,

    /// Mark the session cookie `Secure` (set when served over HTTPS).
    pub secure_cookies: bool,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            public_url: "http://localhost:8080".to_string(),
            session_ttl_minutes: 480,
            secure_cookies: false,
        }
    }
}

impl HttpSettings {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_minutes * 60)
    }

    pub fn bind_addr(&self) -> ServerResult<SocketAddr> {
        self.bind
            .parse()
            .map_err(|e| ServerError::config(format!("invalid bind address {:?}: {}", self.bind, e)))
    }
}

/// Google provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    /// OAuth client ID (supports `pass::` and `env::` prefixes).
    pub client_id: Option<String>,

    /// OAuth client secret (supports `pass::` and `env::` prefixes).
    pub client_secret: Option<String>,

    /// Google Cloud Console credentials JSON, used when the inline pair is unset.
    pub credentials_file: Option<PathBuf>,

    /// Person fields requested when listing and fetching.
    pub person_fields: String,

    /// Page size when listing connections.
    pub page_size: u32,

    /// HTTP timeout for Google requests, in seconds.
    pub timeout_secs: u64,
}

impl Default for GoogleSettings {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            credentials_file: None,
            person_fields: DEFAULT_PERSON_FIELDS.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            timeout_secs: GoogleConfig::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default level when `RUST_LOG` is unset.
    pub level: String,

    /// `pretty`, `compact` or `json`.
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl LoggingSettings {
    /// Builds the tracing configuration for the server.
    pub fn to_tracing_config(&self, debug: bool) -> ServerResult<TracingConfig> {
        let base = if debug {
            TracingConfig::debug()
        } else {
            let level = self
                .level
                .parse::<tracing::Level>()
                .map_err(|_| ServerError::config(format!("invalid log level: {}", self.level)))?;
            TracingConfig::server().with_level(level)
        };

        let format = self
            .format
            .parse::<TracingOutputFormat>()
            .map_err(|e| ServerError::config(e.to_string()))?;

        Ok(base.with_format(format))
    }
}

impl ServerConfig {
    /// Loads configuration from `path`, or from the default path.
    ///
    /// A missing default file yields the defaults; a missing explicit file
    /// is an error.
    pub fn load(path: Option<&Path>) -> ServerResult<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ServerResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ServerError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| ServerError::config(format!("failed to parse {}: {}", path.display(), e)))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("contactmgr")
            .join("config.toml")
    }

    /// Applies `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET` overrides.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(id) = lookup(ENV_CLIENT_ID).filter(|v| !v.is_empty()) {
            self.google.client_id = Some(id);
        }
        if let Some(secret) = lookup(ENV_CLIENT_SECRET).filter(|v| !v.is_empty()) {
            self.google.client_secret = Some(secret);
        }
    }

    /// Serializes the configuration back to TOML with secrets masked.
    pub fn dump(&self) -> ServerResult<String> {
        let mut masked = self.clone();
        masked.google.client_secret = masked.google.client_secret.map(|s| {
            if crate::secret::is_reference(&s) {
                s
            } else {
                "********".to_string()
            }
        });
        toml::to_string_pretty(&masked)
            .map_err(|e| ServerError::config(format!("failed to serialize config: {}", e)))
    }

    /// Checks every setting, including credential resolution.
    pub fn validate(&self) -> ServerResult<()> {
        self.server.bind_addr()?;
        if self.server.session_ttl_minutes == 0 {
            return Err(ServerError::config("session_ttl_minutes must be positive"));
        }
        self.logging.to_tracing_config(false)?;
        self.google_config()?
            .validate()
            .map_err(ServerError::config)?;
        Ok(())
    }

    /// Builds the provider configuration, resolving credentials.
    pub fn google_config(&self) -> ServerResult<GoogleConfig> {
        let credentials = self.google.resolve_credentials()?;
        Ok(GoogleConfig::new(credentials, &self.server.public_url)
            .with_person_fields(self.google.person_fields.clone())
            .with_page_size(self.google.page_size)
            .with_timeout(Duration::from_secs(self.google.timeout_secs)))
    }
}

impl GoogleSettings {
    /// Resolves Google OAuth credentials.
    ///
    /// The inline `client_id`/`client_secret` pair wins over
    /// `credentials_file`. Each inline value is passed through
    /// [`secret::resolve`](crate::secret::resolve).
    pub fn resolve_credentials(&self) -> ServerResult<OAuthCredentials> {
        match (self.client_id.as_deref(), self.client_secret.as_deref()) {
            (Some(raw_id), Some(raw_secret)) => {
                let id = crate::secret::resolve(raw_id).map_err(|e| {
                    ServerError::config(format!("failed to resolve client_id: {}", e))
                })?;
                let secret = crate::secret::resolve(raw_secret).map_err(|e| {
                    ServerError::config(format!("failed to resolve client_secret: {}", e))
                })?;
                Ok(OAuthCredentials::new(id, secret))
            }
            (Some(_), None) => Err(ServerError::config(
                "client_secret is missing from [google] section in config.toml",
            )),
            _ => match self.credentials_file {
                Some(ref path) => OAuthCredentials::from_file(path).map_err(ServerError::config),
                None => Err(ServerError::config(format!(
                    "Google credentials not found. Add to {}:\n  \
                     [google]\n  \
                     client_id = \"YOUR_ID.apps.googleusercontent.com\"\n  \
                     client_secret = \"YOUR_SECRET\"\n\n  \
                     or set {} and {}",
                    ServerConfig::default_path().display(),
                    ENV_CLIENT_ID,
                    ENV_CLIENT_SECRET,
                ))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn settings(id: &str, secret: &str) -> GoogleSettings {
        GoogleSettings {
            client_id: Some(id.to_string()),
            client_secret: Some(secret.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert_eq!(config.server.session_ttl(), Duration::from_secs(480 * 60));
        assert!(!config.server.secure_cookies);
        assert_eq!(config.google.page_size, 100);
        assert_eq!(config.google.timeout_secs, 30);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parse_full_file() {
        let toml_content = r#"
[server]
bind = "0.0.0.0:9000"
public_url = "https://contacts.example.com"
session_ttl_minutes = 60
secure_cookies = true

[google]
client_id = "toml-id.apps.googleusercontent.com"
client_secret = "toml-secret"
page_size = 50

[logging]
level = "debug"
format = "json"
"#;
        let config: ServerConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.server.bind_addr().unwrap().port(), 9000);
        assert!(config.server.secure_cookies);
        assert_eq!(config.google.page_size, 50);
        assert_eq!(
            config.google.person_fields,
            "names,emailAddresses,phoneNumbers,organizations,metadata"
        );

        let google = config.google_config().unwrap();
        assert_eq!(
            google.redirect_uri,
            "https://contacts.example.com/login/oauth2/code/google"
        );
        assert_eq!(google.page_size, 50);
        assert!(config.validate().is_ok());

        let tracing = config.logging.to_tracing_config(false).unwrap();
        assert_eq!(tracing.default_level, tracing::Level::DEBUG);
        assert_eq!(tracing.output_format, TracingOutputFormat::Json);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nbind = \"127.0.0.1:3000\"").unwrap();

        let config = ServerConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:3000");
        assert_eq!(config.server.public_url, "http://localhost:8080");
    }

    #[test]
    fn load_missing_explicit_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = ServerConfig::load(Some(dir.path().join("nope.toml").as_path())).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn load_malformed_file_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nbind=").unwrap();
        let err = ServerConfig::load_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }

    #[test]
    fn resolve_credentials_plain_text() {
        let creds = settings("test-id.apps.googleusercontent.com", "test-secret")
            .resolve_credentials()
            .unwrap();
        assert_eq!(creds.client_id, "test-id.apps.googleusercontent.com");
        assert_eq!(creds.client_secret, "test-secret");
    }

    #[test]
    fn resolve_credentials_env_prefix() {
        unsafe {
            std::env::set_var("_CM_TEST_CLIENT_ID", "env-id.apps.googleusercontent.com");
            std::env::set_var("_CM_TEST_CLIENT_SECRET", "env-secret");
        }

        let creds = settings("env::_CM_TEST_CLIENT_ID", "env::_CM_TEST_CLIENT_SECRET")
            .resolve_credentials()
            .unwrap();
        assert_eq!(creds.client_id, "env-id.apps.googleusercontent.com");
        assert_eq!(creds.client_secret, "env-secret");

        unsafe {
            std::env::remove_var("_CM_TEST_CLIENT_ID");
            std::env::remove_var("_CM_TEST_CLIENT_SECRET");
        }
    }

    #[test]
    fn resolve_credentials_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"web": {{"client_id": "file-id.apps.googleusercontent.com", "client_secret": "file-secret"}}}}"#
        )
        .unwrap();

        let google = GoogleSettings {
            credentials_file: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let creds = google.resolve_credentials().unwrap();
        assert_eq!(creds.client_id, "file-id.apps.googleusercontent.com");
    }

    #[test]
    fn resolve_credentials_missing_errors() {
        let err = GoogleSettings::default().resolve_credentials().unwrap_err();
        assert!(err.to_string().contains("credentials not found"));

        let only_id = GoogleSettings {
            client_id: Some("id.apps.googleusercontent.com".to_string()),
            ..Default::default()
        };
        assert!(only_id.resolve_credentials().unwrap_err().to_string().contains("client_secret"));
    }

    #[test]
    fn env_overrides_replace_inline_values() {
        let mut config = ServerConfig {
            google: settings("file-id.apps.googleusercontent.com", "file-secret"),
            ..Default::default()
        };
        config.apply_env_overrides(|name| match name {
            ENV_CLIENT_ID => Some("env-id.apps.googleusercontent.com".to_string()),
            ENV_CLIENT_SECRET => Some(String::new()),
            _ => None,
        });
        assert_eq!(
            config.google.client_id.as_deref(),
            Some("env-id.apps.googleusercontent.com")
        );
        // Empty values are ignored.
        assert_eq!(config.google.client_secret.as_deref(), Some("file-secret"));
    }

    #[test]
    fn dump_masks_literal_secret() {
        let config = ServerConfig {
            google: settings("id.apps.googleusercontent.com", "hunter2"),
            ..Default::default()
        };
        let dumped = config.dump().unwrap();
        assert!(!dumped.contains("hunter2"));
        assert!(dumped.contains("********"));

        let referenced = ServerConfig {
            google: settings("id.apps.googleusercontent.com", "pass::google/secret"),
            ..Default::default()
        };
        assert!(referenced.dump().unwrap().contains("pass::google/secret"));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = ServerConfig {
            google: settings("id.apps.googleusercontent.com", "secret"),
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        config.server.bind = "not-an-addr".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("bind"));

        config.server.bind = "127.0.0.1:8080".to_string();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());

        config.logging.format = "compact".to_string();
        config.google.client_id = Some("not-google".to_string());
        assert!(config.validate().is_err());
    }
}
