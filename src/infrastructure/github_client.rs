// GitHub Actions artifact source implementation
use crate::application::artifact_source::{ArtifactSource, FetchError};
use crate::domain::workflow::{Artifact, ArtifactsPage, RepoRef, WorkflowRun, WorkflowRunsPage};
use crate::infrastructure::config::GitHubSettings;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, LOCATION};
use reqwest::{RequestBuilder, Response, StatusCode};

#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    base_url: String,
    api_version: String,
}

impl GitHubClient {
    pub fn new(settings: &GitHubSettings) -> anyhow::Result<Self> {
        // Redirects are followed by hand so the credential never leaves api.github.com
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .user_agent(settings.user_agent.clone())
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            http,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            api_version: settings.api_version.clone(),
        })
    }

    fn api_get(&self, path: &str, credential: Option<&str>) -> RequestBuilder {
        let request = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", &self.api_version);

        match credential.and_then(clean_token) {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, FetchError> {
        let response = request.send().await?;
        let response = ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Strip whitespace and a pasted `Bearer ` prefix; blank means anonymous.
fn clean_token(token: &str) -> Option<&str> {
    let token = token.trim_start();
    let token = token.strip_prefix("Bearer ").unwrap_or(token).trim();
    (!token.is_empty()).then_some(token)
}

async fn ensure_success(response: Response) -> Result<Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::UNAUTHORIZED {
        return Err(FetchError::Unauthorized { body });
    }
    Err(FetchError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl ArtifactSource for GitHubClient {
    async fn list_runs(
        &self,
        repo: &RepoRef,
        credential: Option<&str>,
    ) -> Result<Vec<WorkflowRun>, FetchError> {
        let path = format!("/repos/{}/{}/actions/runs", repo.owner, repo.name);
        let page: WorkflowRunsPage = self.send_json(self.api_get(&path, credential)).await?;
        Ok(page.workflow_runs)
    }

    async fn list_artifacts(
        &self,
        repo: &RepoRef,
        run_id: i64,
        credential: Option<&str>,
    ) -> Result<Vec<Artifact>, FetchError> {
        let path = format!(
            "/repos/{}/{}/actions/runs/{}/artifacts",
            repo.owner, repo.name, run_id
        );
        let page: ArtifactsPage = self.send_json(self.api_get(&path, credential)).await?;
        tracing::debug!(
            %repo,
            run_id,
            total = page.total_count,
            listed = page.artifacts.len(),
            "listed run artifacts"
        );
        Ok(page.artifacts)
    }

    async fn download(
        &self,
        repo: &RepoRef,
        artifact_id: i64,
        credential: Option<&str>,
    ) -> Result<Vec<u8>, FetchError> {
        let path = format!(
            "/repos/{}/{}/actions/artifacts/{}/zip",
            repo.owner, repo.name, artifact_id
        );
        tracing::debug!(%repo, artifact_id, "downloading artifact");
        let response = self.api_get(&path, credential).send().await?;

        let response = if response.status().is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .ok_or(FetchError::MissingRedirectLocation)?
                .to_string();

            // Pre-signed storage URL: no Authorization header, no further hops
            tracing::debug!(artifact_id, "following artifact redirect without credential");
            let redirected = self.http.get(&location).send().await?;
            ensure_success(redirected).await?
        } else {
            ensure_success(response).await?
        };

        Ok(response.bytes().await?.to_vec())
    }
}
