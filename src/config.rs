use std::path::{Path, PathBuf};

use compact_str::CompactString;
use derive_builder::Builder;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::{
    client::LogLevel,
    permissions::PermissionsBuilder,
    result::{AppError, Result},
};

const CONFIG_FILE_NAME: &str = "gitlab-ci-masters.toml";

/// Read timeout applied when the configuration does not name one
pub const DEFAULT_CLIENT_TIMEOUT_MILLIS: u64 = 30_000;

/// Whole configuration file
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AppConfig {
    /// Settings shared by every outgoing HTTP client
    #[serde(default)]
    pub client: ClientProperties,
    /// GitLab CI integration
    #[serde(default)]
    pub gitlab_ci: GitlabCiProperties,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClientProperties {
    /// Read timeout in milliseconds; 0 disables it
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default)]
    pub log_level: LogLevel,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct GitlabCiProperties {
    /// Nothing is built or registered unless this is set
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub masters: Vec<GitlabCiHost>,
}

/// One configured GitLab CI master
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize, Builder)]
#[builder(default, setter(into))]
#[serde(rename_all = "kebab-case")]
pub struct GitlabCiHost {
    /// Registry key, unique across all build services
    pub name: CompactString,
    /// Base URL of the GitLab instance
    pub address: CompactString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(setter(into, strip_option))]
    pub private_token: Option<CompactString>,
    #[serde(default)]
    pub permissions: PermissionsBuilder,
}

impl Default for ClientProperties {
    fn default() -> Self {
        Self { timeout: default_timeout(), log_level: LogLevel::default() }
    }
}

fn default_timeout() -> u64 {
    DEFAULT_CLIENT_TIMEOUT_MILLIS
}

impl GitlabCiHost {
    pub fn builder() -> GitlabCiHostBuilder {
        GitlabCiHostBuilder::default()
    }
}

pub fn default_config_path() -> PathBuf {
    if let Some(dirs) = BaseDirs::new() {
        dirs.config_dir().join(CONFIG_FILE_NAME)
    } else {
        PathBuf::from(CONFIG_FILE_NAME)
    }
}

/// Load the configuration file, falling back to defaults when it does not
/// exist. The file is never created.
pub fn load_config(config_file: &Path) -> Result<AppConfig> {
    if !config_file.exists() {
        return Ok(AppConfig::default());
    }

    confy::load_path(config_file)
        .map_err(|source| AppError::ConfigError { path: config_file.to_path_buf(), source })
}
