//! GitLab CI build service registered for each configured master

use compact_str::CompactString;
use tracing::{info, instrument};

use super::{api::GitlabCiClient, error::Result};
use crate::{
    build_services::{BuildService, BuildServiceProvider},
    config::GitlabCiHost,
    domain::{Job, Pipeline, PipelineSummary, PipelineTrigger, Project},
    id::{JobId, PipelineId, ProjectId},
    permissions::Permissions,
};

/// Build service fronting one GitLab CI master
///
/// Owns its client; read-only once constructed.
#[derive(Debug)]
pub struct GitlabCiService {
    name: CompactString,
    client: GitlabCiClient,
    host: GitlabCiHost,
    permissions: Permissions,
}

impl GitlabCiService {
    pub fn new(
        client: GitlabCiClient,
        name: impl Into<CompactString>,
        host: GitlabCiHost,
        permissions: Permissions,
    ) -> Self {
        Self { name: name.into(), client, host, permissions }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn host(&self) -> &GitlabCiHost {
        &self.host
    }

    pub fn client(&self) -> &GitlabCiClient {
        &self.client
    }

    pub fn permissions(&self) -> &Permissions {
        &self.permissions
    }

    /// Projects the configured token is a member of
    pub async fn projects(&self, page: u32, per_page: u32) -> Result<Vec<Project>> {
        self.client.search_projects(true, false, page, per_page).await
    }

    pub async fn project(&self, project_id: ProjectId) -> Result<Project> {
        self.client.get_project(project_id).await
    }

    pub async fn pipelines(
        &self,
        project_id: ProjectId,
        limit: u32,
    ) -> Result<Vec<PipelineSummary>> {
        self.client.get_pipeline_summaries(project_id, limit).await
    }

    pub async fn pipeline(
        &self,
        project_id: ProjectId,
        pipeline_id: PipelineId,
    ) -> Result<Pipeline> {
        self.client.get_pipeline(project_id, pipeline_id).await
    }

    pub async fn jobs(&self, project_id: ProjectId, pipeline_id: PipelineId) -> Result<Vec<Job>> {
        self.client.get_jobs(project_id, pipeline_id).await
    }

    pub async fn job_log(&self, project_id: ProjectId, job_id: JobId) -> Result<CompactString> {
        self.client.get_job_log(project_id, job_id).await
    }

    #[instrument(skip(self, trigger), fields(master = %self.name, project_id = %project_id))]
    pub async fn trigger_pipeline(
        &self,
        project_id: ProjectId,
        trigger: &PipelineTrigger,
    ) -> Result<Pipeline> {
        let pipeline = self.client.trigger_pipeline(project_id, trigger).await?;
        info!(pipeline_id = %pipeline.id, branch = %pipeline.branch, "Triggered pipeline");
        Ok(pipeline)
    }
}

impl BuildService for GitlabCiService {
    fn name(&self) -> &str {
        &self.name
    }

    fn provider(&self) -> BuildServiceProvider {
        BuildServiceProvider::GitlabCi
    }

    fn permissions(&self) -> &Permissions {
        &self.permissions
    }
}
