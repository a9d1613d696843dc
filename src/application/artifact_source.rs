// Ports for fetching, unpacking and decoding CI artifacts
use crate::domain::test_report::TestSuite;
use crate::domain::workflow::{Artifact, RepoRef, WorkflowRun};
use async_trait::async_trait;
use indexmap::IndexMap;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("credential rejected (401): {body}")]
    Unauthorized { body: String },

    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("redirect response missing Location header")]
    MissingRedirectLocation,

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl FetchError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, FetchError::Unauthorized { .. })
    }
}

#[async_trait]
pub trait ArtifactSource: Send + Sync {
    /// Workflow runs of a repository, most recent first
    async fn list_runs(
        &self,
        repo: &RepoRef,
        credential: Option<&str>,
    ) -> Result<Vec<WorkflowRun>, FetchError>;

    async fn list_artifacts(
        &self,
        repo: &RepoRef,
        run_id: i64,
        credential: Option<&str>,
    ) -> Result<Vec<Artifact>, FetchError>;

    /// Raw archive bytes of one artifact
    async fn download(
        &self,
        repo: &RepoRef,
        artifact_id: i64,
        credential: Option<&str>,
    ) -> Result<Vec<u8>, FetchError>;
}

pub trait ArchiveExtractor: Send + Sync {
    /// Entry path -> contents, in archive order. Empty for an empty or unreadable archive.
    fn extract(&self, bytes: &[u8]) -> IndexMap<String, Vec<u8>>;
}

pub trait ReportParser: Send + Sync {
    /// Never fails: unparseable text yields no suites.
    fn parse(&self, text: &str) -> Vec<TestSuite>;
}
