//! Test utilities and common test fixtures for client modules

use std::sync::Arc;

use serde_json::json;

use crate::client::{api::GitlabCiClient, codec::JsonConverter, config::ClientConfig};


/// JSON representation of a project
pub fn project_json() -> serde_json::Value {
    json!({
        "id": 123,
        "name": "project",
        "path_with_namespace": "group/project",
        "description": "Test project",
        "default_branch": "main",
        "web_url": "https://gitlab.example.com/group/project",
        "last_activity_at": "2023-01-01T00:00:00Z"
    })
}

/// JSON representation of a pipelines listing
pub fn pipeline_summaries_json() -> serde_json::Value {
    json!([{
        "id": 456,
        "project_id": 123,
        "status": "running",
        "source": "push",
        "ref": "main",
        "sha": "a1b2c3",
        "web_url": "https://gitlab.example.com/group/project/-/pipelines/456",
        "created_at": "2023-01-01T00:00:00Z",
        "updated_at": "2023-01-01T01:00:00Z"
    }])
}

/// JSON representation of a single pipeline
pub fn pipeline_json() -> serde_json::Value {
    json!({
        "id": 456,
        "project_id": 123,
        "status": "success",
        "ref": "main",
        "sha": "a1b2c3",
        "tag": false,
        "duration": 240,
        "web_url": "https://gitlab.example.com/group/project/-/pipelines/456",
        "created_at": "2023-01-01T00:00:00Z",
        "started_at": "2023-01-01T00:01:00Z",
        "finished_at": "2023-01-01T00:05:00Z"
    })
}

/// JSON representation of the jobs of a pipeline
pub fn jobs_json() -> serde_json::Value {
    json!([{
        "id": 789,
        "name": "test-job",
        "stage": "test",
        "status": "failed",
        "web_url": "https://gitlab.example.com/group/project/-/jobs/789",
        "created_at": "2023-01-01T00:00:00Z",
        "started_at": "2023-01-01T00:01:00Z",
        "finished_at": null
    }])
}

/// Mock GitLab instance for testing
pub struct MockServer {
    pub server: wiremock::MockServer,
}

impl MockServer {
    /// Start a new mock server
    pub async fn start() -> Self {
        let server = wiremock::MockServer::start().await;
        Self { server }
    }

    /// Get the base URL of the mock server
    pub fn base_url(&self) -> String {
        self.server.uri()
    }

    /// Client pointing at this mock server
    pub fn client(&self, private_token: Option<&str>) -> GitlabCiClient {
        let config = ClientConfig::builder()
            .address(self.base_url())
            .private_token(private_token)
            .timeout_millis(2000)
            .build()
            .unwrap();

        GitlabCiClient::new(config, Arc::new(JsonConverter::new())).unwrap()
    }
}
