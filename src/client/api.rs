//! Typed REST binding for the GitLab CI API

use std::{sync::Arc, time::Duration};

use compact_str::{format_compact, CompactString};
use reqwest::{
    header::{HeaderMap, CONTENT_TYPE},
    Client, Request, StatusCode,
};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::{
    codec::{JsonConverter, JSON_CONTENT_TYPE},
    config::{ClientConfig, LogLevel},
    error::{ClientError, Result},
    headers::{GitlabCiHeaders, RequestInterceptor, PRIVATE_TOKEN_HEADER},
};
use crate::{
    domain::{Job, Pipeline, PipelineSummary, PipelineTrigger, Project},
    id::{JobId, PipelineId, ProjectId},
};

/// Largest page GitLab hands out
pub const MAX_PAGE_SIZE: u32 = 100;

const API_PREFIX: &str = "/api/v4";

/// REST binding for one GitLab CI master.
///
/// Construction never touches the network; each method issues exactly one
/// request through the configured interceptor.
#[derive(Debug, Clone)]
pub struct GitlabCiClient {
    client: Client,
    config: ClientConfig,
    interceptor: Arc<dyn RequestInterceptor>,
    converter: Arc<JsonConverter>,
}

impl GitlabCiClient {
    /// Create a new client, attaching [`GitlabCiHeaders`] built from the
    /// configured token.
    pub fn new(config: ClientConfig, converter: Arc<JsonConverter>) -> Result<Self> {
        let headers = GitlabCiHeaders::new(config.effective_token());
        Self::with_interceptor(config, converter, Arc::new(headers))
    }

    /// Create a new client with a custom interceptor
    pub fn with_interceptor(
        config: ClientConfig,
        converter: Arc<JsonConverter>,
        interceptor: Arc<dyn RequestInterceptor>,
    ) -> Result<Self> {
        config.validate()?;

        let mut builder = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.read_timeout {
            builder = builder.read_timeout(timeout);
        }
        let client = builder.build().map_err(ClientError::Network)?;

        Ok(Self { client, config, interceptor, converter })
    }

    /// Get current configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Read timeout the transport was built with
    pub fn read_timeout(&self) -> Option<Duration> {
        self.config.read_timeout
    }

    /// Search projects visible to the token
    #[instrument(skip(self), fields(base_url = %self.config.base_url))]
    pub async fn search_projects(
        &self,
        membership: bool,
        owned: bool,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Project>> {
        let request = self
            .client
            .get(self.url("/projects").as_str())
            .query(&[
                ("membership", membership.to_string()),
                ("owned", owned.to_string()),
                ("page", page.max(1).to_string()),
                ("per_page", page_size(per_page).to_string()),
            ])
            .build()?;

        self.fetch_json(request).await
    }

    /// Get a single project
    #[instrument(skip(self), fields(base_url = %self.config.base_url))]
    pub async fn get_project(&self, project_id: ProjectId) -> Result<Project> {
        let url = self.url(&format_compact!("/projects/{}", project_id));
        let request = self.client.get(url.as_str()).build()?;
        self.fetch_json(request).await
    }

    /// Most recent pipelines of a project, newest first
    #[instrument(skip(self), fields(base_url = %self.config.base_url))]
    pub async fn get_pipeline_summaries(
        &self,
        project_id: ProjectId,
        per_page: u32,
    ) -> Result<Vec<PipelineSummary>> {
        let url = self.url(&format_compact!("/projects/{}/pipelines", project_id));
        let request = self
            .client
            .get(url.as_str())
            .query(&[("per_page", page_size(per_page))])
            .build()?;

        self.fetch_json(request).await
    }

    /// Get a single pipeline
    #[instrument(skip(self), fields(base_url = %self.config.base_url))]
    pub async fn get_pipeline(
        &self,
        project_id: ProjectId,
        pipeline_id: PipelineId,
    ) -> Result<Pipeline> {
        let url = self.url(&format_compact!("/projects/{}/pipelines/{}", project_id, pipeline_id));
        let request = self.client.get(url.as_str()).build()?;
        self.fetch_json(request).await
    }

    /// Jobs of a pipeline
    #[instrument(skip(self), fields(base_url = %self.config.base_url))]
    pub async fn get_jobs(
        &self,
        project_id: ProjectId,
        pipeline_id: PipelineId,
    ) -> Result<Vec<Job>> {
        let url = self.url(&format_compact!(
            "/projects/{}/pipelines/{}/jobs",
            project_id,
            pipeline_id
        ));
        let request = self
            .client
            .get(url.as_str())
            .query(&[("per_page", MAX_PAGE_SIZE)])
            .build()?;

        self.fetch_json(request).await
    }

    /// Raw job log
    #[instrument(skip(self), fields(base_url = %self.config.base_url))]
    pub async fn get_job_log(&self, project_id: ProjectId, job_id: JobId) -> Result<CompactString> {
        let url = self.url(&format_compact!("/projects/{}/jobs/{}/trace", project_id, job_id));
        let request = self.client.get(url.as_str()).build()?;
        self.execute(request).await.map(CompactString::from)
    }

    /// Create a new pipeline for a ref
    #[instrument(skip(self, trigger), fields(base_url = %self.config.base_url, branch = %trigger.branch))]
    pub async fn trigger_pipeline(
        &self,
        project_id: ProjectId,
        trigger: &PipelineTrigger,
    ) -> Result<Pipeline> {
        let url = self.url(&format_compact!("/projects/{}/pipeline", project_id));
        let request = self
            .client
            .post(url.as_str())
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(self.converter.encode(trigger)?)
            .build()?;

        self.fetch_json(request).await
    }

    /// Validate API connection and credentials
    #[instrument(skip(self), fields(base_url = %self.config.base_url))]
    pub async fn validate_connection(&self) -> Result<()> {
        let projects = self.search_projects(true, false, 1, 1).await?;
        debug!(visible = projects.len(), "Connection validation successful");
        Ok(())
    }

    // Private helper methods

    fn url(&self, path: &str) -> CompactString {
        format_compact!("{}{}{}", self.config.base_url, API_PREFIX, path)
    }

    async fn fetch_json<T: DeserializeOwned>(&self, request: Request) -> Result<T> {
        let url = request.url().to_string();
        let body = self.execute(request).await?;
        self.converter.decode(&url, &body)
    }

    /// Send a request through the interceptor and translate failures
    async fn execute(&self, request: Request) -> Result<String> {
        let request = self.interceptor.intercept(request);
        self.log_request(&request);

        let url = request.url().to_string();
        let response = self.client.execute(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        self.log_response(&url, status, &headers, &body);

        if status.is_success() {
            Ok(body)
        } else {
            Err(ClientError::from_response(status.as_u16(), url, &body))
        }
    }

    fn log_request(&self, request: &Request) {
        if self.config.log_level == LogLevel::None {
            return;
        }

        debug!(method = %request.method(), url = %request.url(), "---> HTTP");
        if self.config.log_level >= LogLevel::Headers {
            debug!(headers = %redacted(request.headers()), "---> headers");
        }
        if self.config.log_level >= LogLevel::Full {
            if let Some(bytes) = request.body().and_then(|b| b.as_bytes()) {
                debug!(body = %String::from_utf8_lossy(bytes), "---> body");
            }
        }
    }

    fn log_response(&self, url: &str, status: StatusCode, headers: &HeaderMap, body: &str) {
        if self.config.log_level == LogLevel::None {
            return;
        }

        debug!(status = status.as_u16(), url, "<--- HTTP");
        if self.config.log_level >= LogLevel::Headers {
            debug!(headers = %redacted(headers), "<--- headers");
        }
        if self.config.log_level >= LogLevel::Full {
            debug!(bytes = body.len(), body, "<--- body");
        }
    }
}

fn page_size(per_page: u32) -> u32 {
    per_page.clamp(1, MAX_PAGE_SIZE)
}

/// Header list for logging, with the token masked
fn redacted(headers: &HeaderMap) -> String {
    headers
        .iter()
        .map(|(name, value)| {
            if name.as_str().eq_ignore_ascii_case(PRIVATE_TOKEN_HEADER) || value.is_sensitive() {
                format!("{name}: <redacted>")
            } else {
                format!("{name}: {}", value.to_str().unwrap_or("<binary>"))
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    fn test_config() -> ClientConfig {
        ClientConfig::new("https://gitlab.example.com/", Some("test-token".into()), 5000)
    }

    fn test_client() -> GitlabCiClient {
        GitlabCiClient::new(test_config(), Arc::new(JsonConverter::new())).unwrap()
    }

    #[test]
    fn test_client_creation() {
        let client = test_client();
        assert_eq!(client.read_timeout(), Some(Duration::from_millis(5000)));
        assert_eq!(client.config().base_url, "https://gitlab.example.com");
    }

    #[test]
    fn test_client_creation_invalid_address() {
        let config = ClientConfig::new("gitlab dot com", None, 5000);
        let err = GitlabCiClient::new(config, Arc::new(JsonConverter::new())).unwrap_err();
        assert!(matches!(err, ClientError::InvalidUrl { .. }));
    }

    #[test]
    fn test_url_keeps_address_path() {
        let config = ClientConfig::new("https://example.com/gitlab/", None, 0);
        let client = GitlabCiClient::new(config, Arc::new(JsonConverter::new())).unwrap();
        assert_eq!(
            client.url("/projects/1"),
            "https://example.com/gitlab/api/v4/projects/1"
        );
        assert_eq!(client.read_timeout(), None);
    }

    #[test]
    fn test_page_size_is_capped() {
        assert_eq!(page_size(0), 1);
        assert_eq!(page_size(20), 20);
        assert_eq!(page_size(500), MAX_PAGE_SIZE);
    }

    #[test]
    fn test_redacted_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(PRIVATE_TOKEN_HEADER, HeaderValue::from_static("glpat-secret"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));

        let line = redacted(&headers);
        assert!(!line.contains("glpat-secret"));
        assert!(line.contains("private-token: <redacted>"));
        assert!(line.contains("content-type: application/json"));
    }
}
