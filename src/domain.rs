// GitLab API Documentation: https://docs.gitlab.com/ee/api/api_resources.html
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::id::{JobId, PipelineId, ProjectId};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: CompactString,
    pub path_with_namespace: CompactString,
    pub description: Option<CompactString>,
    pub default_branch: Option<CompactString>,
    pub web_url: CompactString,
    pub last_activity_at: Option<DateTime<Utc>>,
}

/// Entry of the pipelines listing; GitLab omits timing and user details here.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PipelineSummary {
    pub id: PipelineId,
    pub project_id: ProjectId,
    pub status: PipelineStatus,
    pub source: Option<PipelineSource>,
    #[serde(rename = "ref")]
    pub branch: CompactString,
    pub sha: CompactString,
    pub web_url: CompactString,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Pipeline {
    pub id: PipelineId,
    pub project_id: ProjectId,
    pub status: PipelineStatus,
    #[serde(rename = "ref")]
    pub branch: CompactString,
    pub sha: CompactString,
    #[serde(default)]
    pub tag: bool,
    /// Seconds
    pub duration: Option<u64>,
    pub web_url: CompactString,
    pub created_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub name: CompactString,
    pub stage: CompactString,
    pub status: PipelineStatus,
    pub web_url: CompactString,
    pub created_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Body of `POST /projects/:id/pipeline`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineTrigger {
    #[serde(rename = "ref")]
    pub branch: CompactString,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<PipelineVariable>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineVariable {
    pub key: CompactString,
    pub value: CompactString,
}

impl PipelineTrigger {
    pub fn new(branch: impl Into<CompactString>) -> Self {
        Self { branch: branch.into(), variables: Vec::new() }
    }

    pub fn with_variable(
        mut self,
        key: impl Into<CompactString>,
        value: impl Into<CompactString>,
    ) -> Self {
        self.variables.push(PipelineVariable { key: key.into(), value: value.into() });
        self
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, PartialOrd, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    #[default]
    Created,
    WaitingForResource,
    Preparing,
    Pending,
    Running,
    Success,
    Failed,
    Canceling,
    Canceled,
    Skipped,
    Manual,
    Scheduled,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineSource {
    Api,
    Chat,
    External,
    ExternalPullRequestEvent,
    MergeRequestEvent,
    ParentPipeline,
    Pipeline,
    Push,
    Schedule,
    Trigger,
    Web,
    Webide,
    #[serde(other)]
    Other,
}

impl PipelineStatus {
    /// Anything ordered before `Success` has not finished yet.
    pub fn is_active(&self) -> bool {
        self < &PipelineStatus::Success
    }
}
