//! TOML configuration.
//!
//! ```toml
//! [server]
//! addr = "0.0.0.0:8080"
//!
//! [cors]
//! allow_methods = ["OPTIONS", "GET", "POST", "PUT", "DELETE"]
//!
//! [auth]
//! secret = "change me"
//! token_ttl_secs = 86400
//! ignore = ["POST /auth/login", "POST /users"]
//!
//! [rbac]
//! "GET /accounts/{id}" = ["SUPER_ADMIN", "ADMIN"]
//! ```
//!
//! Every field is optional except `auth.secret`, which may instead come from
//! `SYMMETRIC_KEY`. `HTTP_HOST`, `HTTP_PORT` and `SYMMETRIC_KEY` override the
//! file through [`Config::with_env_overrides`].

use std::collections::BTreeMap;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::method::Method;
use crate::table::parse_route_key;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unable to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("unable to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {}", .0.join(", "))]
    Validation(Vec<String>),
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub auth: AuthConfig,
    /// `"METHOD /pattern"` → roles allowed on that route.
    pub rbac: BTreeMap<String, Vec<String>>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { addr: "0.0.0.0:8080".to_owned() }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Empty means the built-in default list.
    pub allow_methods: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    pub secret: String,
    pub token_ttl_secs: u64,
    /// `"METHOD /pattern"` routes that skip authentication.
    pub ignore: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { secret: String::new(), token_ttl_secs: 24 * 60 * 60, ignore: Vec::new() }
    }
}

impl Config {
    /// Parses a TOML document without validating it.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config = Self::parse(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Collects every semantic problem instead of stopping at the first one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if let Err(e) = self.server.addr.parse::<SocketAddr>() {
            errors.push(format!("server.addr `{}`: {e}", self.server.addr));
        }
        for method in &self.cors.allow_methods {
            if let Err(e) = method.parse::<Method>() {
                errors.push(format!("cors.allow_methods: {e}"));
            }
        }
        if self.auth.secret.is_empty() {
            errors.push("auth.secret must not be empty".to_owned());
        }
        if self.auth.token_ttl_secs == 0 {
            errors.push("auth.token_ttl_secs must be greater than zero".to_owned());
        }
        for key in &self.auth.ignore {
            if let Err(e) = parse_route_key(key) {
                errors.push(format!("auth.ignore `{key}`: {e}"));
            }
        }
        for key in self.rbac.keys() {
            if let Err(e) = parse_route_key(key) {
                errors.push(format!("rbac `{key}`: {e}"));
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(ConfigError::Validation(errors)) }
    }

    /// Applies `HTTP_HOST`, `HTTP_PORT` and `SYMMETRIC_KEY` from `lookup`.
    ///
    /// Host and port override their half of `server.addr` independently.
    /// Pass `|k| std::env::var(k).ok()` to read the process environment.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let host = lookup("HTTP_HOST");
        let port = lookup("HTTP_PORT");
        if host.is_some() || port.is_some() {
            let current = self.server.addr.as_str();
            let (old_host, old_port) = current.rsplit_once(':').unwrap_or((current, ""));
            let host = host.unwrap_or_else(|| old_host.to_owned());
            let port = port.unwrap_or_else(|| old_port.to_owned());
            self.server.addr = format!("{host}:{port}");
        }
        // SYMETRIC_KEY is the spelling older deployments use.
        if let Some(secret) = lookup("SYMMETRIC_KEY").or_else(|| lookup("SYMETRIC_KEY")) {
            self.auth.secret = secret;
        }
        self
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.auth.token_ttl_secs)
    }
}

/// Loads configuration from a TOML file, applies the process environment on
/// top and validates the result.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = Config::parse(&content)?.with_env_overrides(|key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}
