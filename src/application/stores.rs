// Persistence ports for the bearer credential and the last dashboard state
use crate::domain::table::DashboardState;
use async_trait::async_trait;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self) -> anyhow::Result<Option<String>>;
    async fn set(&self, token: &str) -> anyhow::Result<()>;
    async fn clear(&self) -> anyhow::Result<()>;
}

#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self) -> anyhow::Result<Option<DashboardState>>;
    async fn set(&self, state: &DashboardState) -> anyhow::Result<()>;
    async fn clear(&self) -> anyhow::Result<()>;
}
