// File-backed credential and dashboard state stores
use crate::application::stores::{CredentialStore, StateStore};
use crate::domain::table::DashboardState;
use anyhow::Context;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Last computed dashboard, as pretty-printed JSON.
#[derive(Debug, Clone)]
pub struct JsonFileStateStore {
    path: PathBuf,
}

impl JsonFileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl StateStore for JsonFileStateStore {
    async fn get(&self) -> anyhow::Result<Option<DashboardState>> {
        let Some(text) = read_optional(&self.path).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&text) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                // Stale or hand-edited files are discarded, never fatal
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable dashboard state");
                Ok(None)
            }
        }
    }

    async fn set(&self, state: &DashboardState) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(state)?;
        write_file(&self.path, json.as_bytes()).await
    }

    async fn clear(&self) -> anyhow::Result<()> {
        remove_optional(&self.path).await
    }
}

/// Bearer token kept as plain text, one line.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get(&self) -> anyhow::Result<Option<String>> {
        let token = read_optional(&self.path)
            .await?
            .map(|text| text.trim().to_string())
            .filter(|token| !token.is_empty());
        Ok(token)
    }

    async fn set(&self, token: &str) -> anyhow::Result<()> {
        let token = token.trim();
        if token.is_empty() {
            return self.clear().await;
        }
        write_file(&self.path, token.as_bytes()).await
    }

    async fn clear(&self) -> anyhow::Result<()> {
        remove_optional(&self.path).await
    }
}

async fn read_optional(path: &Path) -> anyhow::Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
    }
}

async fn write_file(path: &Path, contents: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("writing {}", path.display()))
}

async fn remove_optional(path: &Path) -> anyhow::Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("removing {}", path.display())),
    }
}
