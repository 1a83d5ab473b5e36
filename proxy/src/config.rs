use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Upstream timeout cannot be 0")]
    InvalidTimeout,

    #[error("Invalid Via pseudonym: {0:?}")]
    InvalidPseudonym(String),
}

fn default_pseudonym() -> String {
    "asyncproxy".into()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Proxy configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Listener serving `/` and `/stats`
    pub listener: Listener,
    /// Listener serving health and readiness probes
    pub admin_listener: Listener,
    /// Name this proxy adds to the Via chain
    #[serde(default = "default_pseudonym")]
    pub via_pseudonym: String,
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;
        self.upstream.validate()?;

        let pseudonym = &self.via_pseudonym;
        if pseudonym.is_empty()
            || pseudonym
                .chars()
                .any(|c| c == ',' || c.is_whitespace() || c.is_control())
        {
            return Err(ValidationError::InvalidPseudonym(pseudonym.clone()));
        }

        Ok(())
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    pub port: u16,
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// Settings of the HTTP client used to fetch targets.
///
/// TLS and address family relaxations only exist here; the request pipeline
/// never looks at them.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct UpstreamConfig {
    /// Applies to the whole fetch, including reading the body
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Skip TLS certificate verification
    #[serde(default)]
    pub accept_invalid_certs: bool,
    /// Only connect to targets over IPv4
    #[serde(default)]
    pub ipv4_only: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            accept_invalid_certs: false,
            ipv4_only: false,
        }
    }
}

impl UpstreamConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}
