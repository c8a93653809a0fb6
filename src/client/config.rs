//! Configuration for a single GitLab CI client

use std::time::Duration;

use compact_str::CompactString;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::error::{ClientError, Result};

/// Main configuration for one GitLab CI client
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// GitLab instance base URL, without trailing slash
    pub base_url: CompactString,
    /// Private access token; absent means unauthenticated calls
    pub private_token: Option<CompactString>,
    /// Read timeout of the transport; `None` keeps the transport default
    pub read_timeout: Option<Duration>,
    /// How much of each exchange is logged
    pub log_level: LogLevel,
}

/// Verbosity of request/response logging
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// No logging
    None,
    /// Method, URL and status
    Basic,
    /// Basic plus headers
    Headers,
    /// Headers plus bodies
    #[default]
    Full,
}

impl ClientConfig {
    /// Create a new client configuration.
    ///
    /// `timeout_millis` of zero leaves the read timeout unset.
    pub fn new(
        address: impl Into<CompactString>,
        private_token: Option<CompactString>,
        timeout_millis: u64,
    ) -> Self {
        let address: CompactString = address.into();
        Self {
            base_url: address.trim_end_matches('/').into(),
            private_token,
            read_timeout: (timeout_millis > 0).then(|| Duration::from_millis(timeout_millis)),
            log_level: LogLevel::default(),
        }
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(ClientError::config("Address cannot be empty"));
        }

        // Url::parse trims and percent-encodes whitespace; request paths are appended verbatim
        if self.base_url.chars().any(char::is_whitespace) {
            return Err(ClientError::invalid_url(self.base_url.as_str()));
        }

        let url = Url::parse(&self.base_url)
            .map_err(|_| ClientError::invalid_url(self.base_url.as_str()))?;

        if !matches!(url.scheme(), "http" | "https")
            || url.cannot_be_a_base()
            || url.query().is_some()
            || url.fragment().is_some()
        {
            return Err(ClientError::invalid_url(self.base_url.as_str()));
        }

        Ok(())
    }

    /// Token to send, treating an empty token as no token
    pub fn effective_token(&self) -> Option<&str> {
        self.private_token.as_deref().filter(|t| !t.is_empty())
    }

    /// Set logging verbosity
    pub fn with_log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }
}

/// Builder for ClientConfig
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    address: Option<CompactString>,
    private_token: Option<CompactString>,
    timeout_millis: u64,
    log_level: LogLevel,
}

impl ClientConfigBuilder {
    /// Set GitLab address
    pub fn address(mut self, address: impl Into<CompactString>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Set private token
    pub fn private_token(mut self, token: Option<impl Into<CompactString>>) -> Self {
        self.private_token = token.map(Into::into);
        self
    }

    /// Set read timeout in milliseconds
    pub fn timeout_millis(mut self, timeout_millis: u64) -> Self {
        self.timeout_millis = timeout_millis;
        self
    }

    /// Set logging verbosity
    pub fn log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<ClientConfig> {
        let address = self
            .address
            .ok_or_else(|| ClientError::config("Address is required"))?;

        let config = ClientConfig::new(address, self.private_token, self.timeout_millis)
            .with_log_level(self.log_level);

        config.validate()?;
        Ok(config)
    }
}
