//! Builds one GitLab CI service per configured master and registers them

use std::{collections::HashMap, sync::Arc};

use compact_str::CompactString;
use tracing::{debug, info, warn};

use crate::{
    build_services::BuildServicesBuilder,
    client::{ClientConfig, ClientError, GitlabCiClient, GitlabCiService, JsonConverter, Result},
    config::{AppConfig, ClientProperties, GitlabCiHost},
};

pub type GitlabCiMasters = HashMap<CompactString, Arc<GitlabCiService>>;

/// Build the GitLab CI masters and merge them into `build_services`.
///
/// Does nothing when the integration is disabled. On error the registry is
/// left exactly as it was.
pub fn register_masters(
    build_services: &mut BuildServicesBuilder,
    config: &AppConfig,
    converter: &Arc<JsonConverter>,
) -> Result<GitlabCiMasters> {
    if !config.gitlab_ci.enabled {
        debug!("GitLab CI integration disabled");
        return Ok(GitlabCiMasters::new());
    }

    info!(count = config.gitlab_ci.masters.len(), "Creating GitLab CI masters");
    let masters = build_registry(&config.gitlab_ci.masters, &config.client, converter)?;
    build_services
        .add_services(masters.iter().map(|(name, service)| (name.clone(), Arc::clone(service))));

    Ok(masters)
}

/// Build a service for every host, keyed by name.
///
/// All or nothing: the first host that fails aborts the batch. Hosts sharing
/// a name collapse into one entry, the later host winning.
pub fn build_registry(
    hosts: &[GitlabCiHost],
    client: &ClientProperties,
    converter: &Arc<JsonConverter>,
) -> Result<GitlabCiMasters> {
    let services = hosts
        .iter()
        .map(|host| gitlab_ci_service(host, client, converter))
        .collect::<Result<Vec<_>>>()?;

    let mut masters = GitlabCiMasters::with_capacity(services.len());
    for service in services {
        let name = CompactString::from(service.name());
        if masters.insert(name.clone(), Arc::new(service)).is_some() {
            warn!(name = %name, "Duplicate GitLab CI master name; the later definition wins");
        }
    }

    Ok(masters)
}

fn gitlab_ci_service(
    host: &GitlabCiHost,
    client: &ClientProperties,
    converter: &Arc<JsonConverter>,
) -> Result<GitlabCiService> {
    if host.name.trim().is_empty() {
        return Err(ClientError::config_validation(
            "name",
            format!("GitLab CI master at {} has no name", host.address),
        ));
    }

    let config = ClientConfig::builder()
        .address(host.address.clone())
        .private_token(host.private_token.clone())
        .timeout_millis(client.timeout)
        .log_level(client.log_level)
        .build()?;
    let gitlab_client = GitlabCiClient::new(config, Arc::clone(converter))?;

    debug!(
        name = %host.name,
        address = %host.address,
        authenticated = host.private_token.as_deref().is_some_and(|t| !t.is_empty()),
        "Built GitLab CI client"
    );

    Ok(GitlabCiService::new(
        gitlab_client,
        host.name.clone(),
        host.clone(),
        host.permissions.build(),
    ))
}

/// Build a client for one address with the default log level
pub fn gitlab_ci_client(
    address: &str,
    private_token: Option<&str>,
    timeout_millis: u64,
    converter: &Arc<JsonConverter>,
) -> Result<GitlabCiClient> {
    let config = ClientConfig::builder()
        .address(address)
        .private_token(private_token)
        .timeout_millis(timeout_millis)
        .build()?;

    GitlabCiClient::new(config, Arc::clone(converter))
}
