// Refresh scheduler - Runs refresh cycles and publishes the latest dashboard snapshot
use crate::application::dashboard_service::{DashboardService, RefreshError};
use crate::application::stores::{CredentialStore, StateStore};
use crate::domain::table::DashboardState;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

const MIN_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub state: Option<DashboardState>,
    pub last_refreshed_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub credential_rejected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    Initial,
    Periodic,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Refreshed,
    /// Another cycle was already running
    Skipped,
    Failed,
}

pub struct RefreshScheduler {
    service: DashboardService,
    state_store: Arc<dyn StateStore>,
    credentials: Arc<dyn CredentialStore>,
    snapshot: RwLock<Arc<DashboardSnapshot>>,
    in_flight: Mutex<()>,
}

impl RefreshScheduler {
    pub fn new(
        service: DashboardService,
        state_store: Arc<dyn StateStore>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            service,
            state_store,
            credentials,
            snapshot: RwLock::new(Arc::new(DashboardSnapshot::default())),
            in_flight: Mutex::new(()),
        }
    }

    pub async fn snapshot(&self) -> Arc<DashboardSnapshot> {
        self.snapshot.read().await.clone()
    }

    /// Publish the persisted state, if any, so the dashboard has data before the first cycle.
    pub async fn restore(&self) -> bool {
        match self.state_store.get().await {
            Ok(Some(state)) => {
                tracing::info!("restored persisted dashboard state");
                self.publish(DashboardSnapshot {
                    state: Some(state),
                    ..Default::default()
                })
                .await;
                true
            }
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(error = ?e, "failed to restore dashboard state");
                false
            }
        }
    }

    pub async fn run_cycle(&self, trigger: RefreshTrigger) -> CycleOutcome {
        let Ok(_guard) = self.in_flight.try_lock() else {
            tracing::debug!(?trigger, "refresh already in flight, skipping");
            return CycleOutcome::Skipped;
        };

        tracing::info!(?trigger, "starting refresh cycle");
        let credential = match self.credentials.get().await {
            Ok(credential) => credential,
            Err(e) => {
                tracing::warn!(error = ?e, "failed to read credential, continuing anonymously");
                None
            }
        };

        let current = self.snapshot().await;
        let result = self
            .service
            .refresh(credential.as_deref(), current.state.as_ref())
            .await;

        match result {
            Ok(state) => {
                if let Err(e) = self.state_store.set(&state).await {
                    tracing::warn!(error = ?e, "failed to persist dashboard state");
                }
                self.publish(DashboardSnapshot {
                    state: Some(state),
                    last_refreshed_at: Some(Utc::now()),
                    last_error: None,
                    credential_rejected: false,
                })
                .await;
                CycleOutcome::Refreshed
            }
            Err(e) => {
                tracing::error!(?trigger, error = %e, "refresh cycle failed");
                let rejected = matches!(e, RefreshError::CredentialRejected(_));
                self.publish(DashboardSnapshot {
                    last_error: Some(e.to_string()),
                    credential_rejected: rejected,
                    ..(*current).clone()
                })
                .await;
                CycleOutcome::Failed
            }
        }
    }

    /// Run an initial cycle now, then one per `interval` while `enabled`.
    pub fn spawn(self: Arc<Self>, interval: Duration, enabled: bool) -> JoinHandle<()> {
        let interval = interval.max(MIN_INTERVAL);
        tokio::spawn(async move {
            tracing::info!(interval = ?interval, enabled, "starting refresh loop");
            self.run_cycle(RefreshTrigger::Initial).await;
            if !enabled {
                return;
            }

            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                self.run_cycle(RefreshTrigger::Periodic).await;
            }
        })
    }

    /// Drop the published and persisted state; the next cycle starts from scratch.
    /// Waits for a cycle in flight so its result cannot land after the clear.
    pub async fn clear_state(&self) -> anyhow::Result<()> {
        let _guard = self.in_flight.lock().await;
        self.state_store.clear().await?;
        let current = self.snapshot().await;
        self.publish(DashboardSnapshot {
            credential_rejected: current.credential_rejected,
            ..Default::default()
        })
        .await;
        Ok(())
    }

    pub async fn set_credential(&self, token: &str) -> anyhow::Result<()> {
        self.credentials.set(token).await?;
        self.reset_credential_rejection().await;
        Ok(())
    }

    pub async fn clear_credential(&self) -> anyhow::Result<()> {
        self.credentials.clear().await?;
        self.reset_credential_rejection().await;
        Ok(())
    }

    async fn reset_credential_rejection(&self) {
        let mut snapshot = self.snapshot.write().await;
        if snapshot.credential_rejected {
            *snapshot = Arc::new(DashboardSnapshot {
                credential_rejected: false,
                ..(**snapshot).clone()
            });
        }
    }

    async fn publish(&self, snapshot: DashboardSnapshot) {
        *self.snapshot.write().await = Arc::new(snapshot);
    }
}
