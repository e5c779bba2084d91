//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables. Nested keys use
//! `__` as the separator, e.g. `REDIRECT__ENVIRONMENT=development`.
//!
//! See [`HostTrustPolicy`](hirepath_platform_access::HostTrustPolicy) for the
//! `REDIRECT__*` settings.

use hirepath_platform_access::HostTrustPolicy;
use serde::Deserialize;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Origin used when a request does not say how it was addressed.
    pub public_origin: String,

    /// Scheme the server is reached with when not behind a proxy.
    #[serde(default = "default_request_scheme")]
    pub request_scheme: String,

    /// Redirect origin trust policy.
    #[serde(default)]
    pub redirect: HostTrustPolicy,

    /// Identity provider configuration.
    pub identity: IdentityConfig,

    /// User directory configuration.
    pub directory: DirectoryConfig,

    /// Session cookie configuration.
    #[serde(default)]
    pub session: SessionConfig,
}

/// Identity/session provider endpoints and client registration.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// Authorization endpoint the browser is sent to.
    pub auth_url: String,
    /// Token endpoint for the code exchange.
    pub token_url: String,
    /// Endpoint returning the identity behind an access token.
    pub userinfo_url: String,
    /// OAuth2 client ID.
    pub client_id: String,
    /// OAuth2 client secret; omit for public clients.
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Callback URL registered with the provider.
    pub redirect_uri: String,
    /// Scopes to request as a comma-separated string.
    #[serde(default = "default_scopes")]
    pub scopes: String,
    /// Timeout for provider calls, in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl IdentityConfig {
    /// Returns the scopes to request, parsed from the comma-separated string.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scopes
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// REST user directory holding role and onboarding state.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
    /// Base URL of the directory service.
    pub base_url: String,
    /// Project API key sent with every request.
    pub api_key: String,
    /// Table holding account records.
    #[serde(default = "default_directory_table")]
    pub table: String,
    /// Timeout for directory calls, in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Session lifetime in minutes when the provider does not report one.
    #[serde(default = "default_session_duration_minutes")]
    pub duration_minutes: i64,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Defaults to true for production safety; set to false for local HTTP development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,
}

fn default_listen_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_request_scheme() -> String {
    "http".to_string()
}

fn default_scopes() -> String {
    "openid,email,profile".to_string()
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_directory_table() -> String {
    "profiles".to_string()
}

fn default_session_duration_minutes() -> i64 {
    60
}

fn default_secure_cookies() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_minutes: default_session_duration_minutes(),
            secure_cookies: default_secure_cookies(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hirepath_platform_access::Environment;

    fn load(json: &str) -> ServerConfig {
        config::Config::builder()
            .add_source(config::File::from_str(json, config::FileFormat::Json))
            .build()
            .expect("build config")
            .try_deserialize()
            .expect("deserialize config")
    }

    const MINIMAL: &str = r#"{
        "public_origin": "http://localhost:3000",
        "identity": {
            "auth_url": "https://id.example.com/authorize",
            "token_url": "https://id.example.com/token",
            "userinfo_url": "https://id.example.com/userinfo",
            "client_id": "dashboard",
            "redirect_uri": "http://localhost:3000/auth/callback"
        },
        "directory": {
            "base_url": "https://db.example.com",
            "api_key": "anon-key"
        }
    }"#;

    #[test]
    fn session_config_has_correct_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.duration_minutes, 60);
        assert!(config.secure_cookies);
    }

    #[test]
    fn minimal_config_fills_defaults() {
        let config = load(MINIMAL);
        assert_eq!(config.listen_addr, "127.0.0.1:3000");
        assert_eq!(config.request_scheme, "http");
        assert_eq!(config.redirect.environment(), Environment::Deployed);
        assert!(config.redirect.allowed_forwarded_hosts().is_empty());
        assert_eq!(config.identity.scopes(), vec!["openid", "email", "profile"]);
        assert_eq!(config.identity.client_secret, None);
        assert_eq!(config.identity.timeout_seconds, 10);
        assert_eq!(config.directory.table, "profiles");
        assert_eq!(config.directory.timeout_seconds, 10);
        assert!(config.session.secure_cookies);
    }

    #[test]
    fn redirect_policy_is_configurable() {
        let json = MINIMAL.replacen(
            "\"public_origin\"",
            r#""redirect": {
                "environment": "development",
                "allowed_forwarded_hosts": "jobs.example.com"
            },
            "public_origin""#,
            1,
        );
        let config = load(&json);
        assert!(config.redirect.environment().is_development());
        assert_eq!(config.redirect.allowed_forwarded_hosts(), ["jobs.example.com"]);
    }

    #[test]
    fn scopes_skip_blank_entries() {
        let mut config = load(MINIMAL).identity;
        config.scopes = "openid, email,,".to_string();
        assert_eq!(config.scopes(), vec!["openid", "email"]);
    }
}
