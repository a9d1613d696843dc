// CI workflow domain models (GitHub Actions runs and artifacts)
use serde::{Deserialize, Serialize};
use std::fmt;

/// Owner/name pair identifying a source repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    Completed,
    /// waiting, requested, pending and anything else the provider adds later
    #[serde(other)]
    Other,
}

impl RunStatus {
    /// A run that may still produce artifacts.
    pub fn is_active(self) -> bool {
        matches!(self, RunStatus::Queued | RunStatus::InProgress)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::Completed => "completed",
            RunStatus::Other => "other",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorkflowRun {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub status: RunStatus,
    #[serde(default)]
    pub conclusion: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Artifact {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub archive_download_url: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub size_in_bytes: u64,
}

#[derive(Debug, Deserialize)]
pub struct WorkflowRunsPage {
    pub workflow_runs: Vec<WorkflowRun>,
}

#[derive(Debug, Deserialize)]
pub struct ArtifactsPage {
    pub artifacts: Vec<Artifact>,
    #[serde(default)]
    pub total_count: u64,
}

/// What the run selector settled on for one repository.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NightlyRun {
    pub run_id: Option<i64>,
    pub status: Option<RunStatus>,
    pub artifacts: Vec<Artifact>,
}

impl NightlyRun {
    pub fn none() -> Self {
        Self::default()
    }
}
