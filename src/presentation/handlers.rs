// HTTP request handlers
use crate::application::dashboard_service::ArtifactReportError;
use crate::application::refresh_scheduler::{CycleOutcome, RefreshTrigger};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadGateway(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(e) => {
                tracing::error!(error = ?e, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

#[derive(Deserialize)]
pub struct CredentialBody {
    pub token: String,
}

#[derive(Deserialize)]
pub struct ReportQuery {
    pub url: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/dashboard", get(get_dashboard).delete(clear_dashboard))
        .route("/refresh", post(trigger_refresh))
        .route("/credential", put(set_credential).delete(clear_credential))
        .route("/artifacts/report", get(artifact_report))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn get_dashboard(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.scheduler.snapshot().await)
}

pub async fn clear_dashboard(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    state.scheduler.clear_state().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Run a cycle now and answer with the resulting snapshot
pub async fn trigger_refresh(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let outcome = state.scheduler.run_cycle(RefreshTrigger::Manual).await;
    let snapshot = state.scheduler.snapshot().await;

    match outcome {
        CycleOutcome::Refreshed => Ok(Json(snapshot).into_response()),
        CycleOutcome::Skipped => Err(ApiError::Conflict(
            "a refresh is already in progress".to_string(),
        )),
        CycleOutcome::Failed => {
            let status = if snapshot.credential_rejected {
                StatusCode::UNAUTHORIZED
            } else {
                StatusCode::BAD_GATEWAY
            };
            Ok((status, Json(snapshot)).into_response())
        }
    }
}

pub async fn set_credential(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CredentialBody>,
) -> Result<StatusCode, ApiError> {
    if body.token.trim().is_empty() {
        return Err(ApiError::BadRequest("token must not be empty".to_string()));
    }
    state.scheduler.set_credential(&body.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn clear_credential(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    state.scheduler.clear_credential().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Suites of a single artifact addressed by its GitHub URL
pub async fn artifact_report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let credential = state.credentials.get().await?;
    let suites = state
        .dashboard_service
        .load_artifact_report(&query.url, credential.as_deref())
        .await
        .map_err(|e| match e {
            ArtifactReportError::Locator(e) => ApiError::BadRequest(e.to_string()),
            other => ApiError::BadGateway(other.to_string()),
        })?;
    Ok(Json(suites))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::aggregator::PlatformAggregator;
    use crate::application::dashboard_service::DashboardService;
    use crate::application::refresh_scheduler::RefreshScheduler;
    use crate::application::run_selector::RunSelector;
    use crate::application::stores::CredentialStore;
    use crate::application::test_support::{
        FakeSource, android_platform, artifact, ios_platform, junit, run, zip_archive,
    };
    use crate::domain::workflow::RunStatus;
    use crate::infrastructure::config::DashboardConfig;
    use crate::infrastructure::file_store::{FileCredentialStore, JsonFileStateStore};
    use crate::infrastructure::junit_parser::JunitXmlParser;
    use crate::infrastructure::zip_extractor::ZipExtractor;
    use tempfile::TempDir;

    struct TestServer {
        base: String,
        http: reqwest::Client,
        credentials: Arc<FileCredentialStore>,
        _dir: TempDir,
    }

    async fn start(source: FakeSource) -> TestServer {
        let dir = TempDir::new().unwrap();
        let source = Arc::new(source);
        let aggregator = PlatformAggregator::new(
            RunSelector::new(source.clone(), "Nightly Tests".to_string(), 5),
            source.clone(),
            Arc::new(ZipExtractor),
            Arc::new(JunitXmlParser),
            4,
        );
        let service = DashboardService::new(
            android_platform(),
            ios_platform(),
            aggregator,
            DashboardConfig::default().combiner(),
            source,
            Arc::new(ZipExtractor),
            Arc::new(JunitXmlParser),
        );
        let credentials = Arc::new(FileCredentialStore::new(dir.path().join("token")));
        let scheduler = Arc::new(RefreshScheduler::new(
            service.clone(),
            Arc::new(JsonFileStateStore::new(dir.path().join("state.json"))),
            credentials.clone(),
        ));
        let state = Arc::new(AppState {
            scheduler,
            dashboard_service: service,
            credentials: credentials.clone(),
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });

        TestServer {
            base: format!("http://{addr}"),
            http: reqwest::Client::new(),
            credentials,
            _dir: dir,
        }
    }

    fn nightly() -> FakeSource {
        FakeSource::new()
            .with_run("SalesforceMobileSDK-Android", run(100, "Nightly Tests", RunStatus::Completed))
            .with_artifacts(100, vec![artifact(1, "test-results-SmartStore")])
            .with_archive(1, zip_archive(&[("results_30.xml", &junit("SmartStoreTest", 0))]))
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = start(FakeSource::new()).await;
        let body = server
            .http
            .get(format!("{}/healthz", server.base))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_refresh_then_dashboard_then_clear() {
        let server = start(nightly()).await;

        let empty: serde_json::Value = server
            .http
            .get(format!("{}/dashboard", server.base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(empty["state"].is_null());

        let response = server
            .http
            .post(format!("{}/refresh", server.base))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let snapshot: serde_json::Value = response.json().await.unwrap();
        assert_eq!(
            snapshot["state"]["androidResults"]["results"]["SmartStore"]["30"]["isSuccess"],
            true
        );
        assert_eq!(snapshot["credentialRejected"], false);

        let response = server
            .http
            .delete(format!("{}/dashboard", server.base))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 204);

        let cleared: serde_json::Value = server
            .http
            .get(format!("{}/dashboard", server.base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(cleared["state"].is_null());
    }

    #[tokio::test]
    async fn test_rejected_credential_answers_401() {
        let server = start(nightly().failing_runs("SalesforceMobileSDK-Android", 401)).await;

        let response = server
            .http
            .post(format!("{}/refresh", server.base))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 401);
        let snapshot: serde_json::Value = response.json().await.unwrap();
        assert_eq!(snapshot["credentialRejected"], true);
    }

    #[tokio::test]
    async fn test_credential_routes() {
        let server = start(FakeSource::new()).await;

        let response = server
            .http
            .put(format!("{}/credential", server.base))
            .json(&serde_json::json!({ "token": " ghp_123 " }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 204);
        assert_eq!(server.credentials.get().await.unwrap().as_deref(), Some("ghp_123"));

        let response = server
            .http
            .put(format!("{}/credential", server.base))
            .json(&serde_json::json!({ "token": "  " }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);

        let response = server
            .http
            .delete(format!("{}/credential", server.base))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 204);
        assert_eq!(server.credentials.get().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_artifact_report_status_codes() {
        let server = start(nightly()).await;
        let report = |url: &str| {
            server
                .http
                .get(format!("{}/artifacts/report", server.base))
                .query(&[("url", url)])
                .send()
        };

        let response = report("https://github.com/owner/repo/actions/runs/1/artifacts/1")
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let suites: serde_json::Value = response.json().await.unwrap();
        assert_eq!(suites[0]["name"], "results_30.xml - SmartStoreTest");

        let response = report("https://example.com/whatever").await.unwrap();
        assert_eq!(response.status(), 400);

        let response = report("https://api.github.com/repos/owner/repo/actions/artifacts/404")
            .await
            .unwrap();
        assert_eq!(response.status(), 502);
    }
}
