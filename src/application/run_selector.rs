// Run selector - Finds the nightly run worth showing for a repository
use crate::application::artifact_source::{ArtifactSource, FetchError};
use crate::domain::workflow::{NightlyRun, RepoRef, RunStatus};
use std::sync::Arc;

pub const DEFAULT_WORKFLOW_NAME: &str = "Nightly Tests";
pub const DEFAULT_MAX_CANDIDATES: usize = 5;

#[derive(Clone)]
pub struct RunSelector {
    source: Arc<dyn ArtifactSource>,
    workflow_name: String,
    max_candidates: usize,
}

impl RunSelector {
    pub fn new(source: Arc<dyn ArtifactSource>, workflow_name: String, max_candidates: usize) -> Self {
        Self {
            source,
            workflow_name,
            max_candidates,
        }
    }

    /// Pick the newest nightly run that is either still active or finished with artifacts.
    ///
    /// Listing failures degrade to [`NightlyRun::none`]; only a rejected credential is returned
    /// as an error.
    pub async fn select_nightly_run(
        &self,
        repo: &RepoRef,
        credential: Option<&str>,
    ) -> Result<NightlyRun, FetchError> {
        match self.find_candidate(repo, credential).await {
            Ok(Some(run)) => Ok(run),
            Ok(None) => {
                tracing::info!(%repo, workflow = %self.workflow_name, "no qualifying nightly run found");
                Ok(NightlyRun::none())
            }
            Err(e) if e.is_unauthorized() => Err(e),
            Err(e) => {
                tracing::warn!(%repo, error = %e, "failed to list nightly runs");
                Ok(NightlyRun::none())
            }
        }
    }

    async fn find_candidate(
        &self,
        repo: &RepoRef,
        credential: Option<&str>,
    ) -> Result<Option<NightlyRun>, FetchError> {
        tracing::debug!(%repo, "fetching workflow runs");
        let runs = self.source.list_runs(repo, credential).await?;

        let candidates = runs
            .into_iter()
            .filter(|run| run.name.eq_ignore_ascii_case(&self.workflow_name))
            .take(self.max_candidates);

        for run in candidates {
            let artifacts = self.source.list_artifacts(repo, run.id, credential).await?;

            // An active run wins even before it has uploaded anything
            if run.status.is_active() {
                tracing::info!(%repo, run_id = run.id, status = %run.status, "found active nightly run");
                return Ok(Some(NightlyRun {
                    run_id: Some(run.id),
                    status: Some(run.status),
                    artifacts,
                }));
            }

            if run.status == RunStatus::Completed && !artifacts.is_empty() {
                tracing::info!(
                    %repo,
                    run_id = run.id,
                    conclusion = run.conclusion.as_deref().unwrap_or("none"),
                    created_at = run.created_at.as_deref().unwrap_or("unknown"),
                    artifacts = artifacts.len(),
                    "found completed nightly run"
                );
                return Ok(Some(NightlyRun {
                    run_id: Some(run.id),
                    status: Some(run.status),
                    artifacts,
                }));
            }

            tracing::debug!(%repo, run_id = run.id, status = %run.status, "skipping nightly run");
        }

        Ok(None)
    }
}
