// Artifact locator - Resolves a pasted artifact URL to repository and artifact id
use crate::domain::workflow::RepoRef;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LocatorError {
    #[error("unrecognized artifact URL: {0}")]
    Unrecognized(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactLocator {
    pub repo: RepoRef,
    pub artifact_id: i64,
}

impl ArtifactLocator {
    /// Accepts the artifact links GitHub shows on a run page, on a check suite page, and the
    /// REST URL of the artifact itself.
    pub fn parse(url: &str) -> Result<Self, LocatorError> {
        let unrecognized = || LocatorError::Unrecognized(url.trim().to_string());

        let trimmed = url.trim();
        let without_query = trimmed
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        let rest = without_query
            .strip_prefix("https://")
            .or_else(|| without_query.strip_prefix("http://"))
            .ok_or_else(unrecognized)?;

        let mut segments = rest.trim_end_matches('/').split('/');
        let host = segments.next().ok_or_else(unrecognized)?;
        let path: Vec<&str> = segments.collect();

        let (owner, name, id) = match (host.to_ascii_lowercase().as_str(), path.as_slice()) {
            ("github.com" | "www.github.com", [owner, name, "actions", "runs", _run, "artifacts", id]) => {
                (*owner, *name, *id)
            }
            ("github.com" | "www.github.com", [owner, name, "suites", _suite, "artifacts", id]) => {
                (*owner, *name, *id)
            }
            ("api.github.com", ["repos", owner, name, "actions", "artifacts", id])
            | ("api.github.com", ["repos", owner, name, "actions", "artifacts", id, "zip"]) => {
                (*owner, *name, *id)
            }
            _ => return Err(unrecognized()),
        };

        if owner.is_empty() || name.is_empty() {
            return Err(unrecognized());
        }
        let artifact_id = id.parse::<i64>().map_err(|_| unrecognized())?;

        Ok(Self {
            repo: RepoRef::new(owner, name),
            artifact_id,
        })
    }
}
