// Dashboard service - Use case for building the Android, iOS and combined grids
use crate::application::aggregator::PlatformAggregator;
use crate::application::artifact_locator::{ArtifactLocator, LocatorError};
use crate::application::artifact_source::{ArchiveExtractor, ArtifactSource, FetchError, ReportParser};
use crate::application::combiner::Combiner;
use crate::application::routing::{DEFAULT_REPORT_EXTENSION, PlatformConfig, is_report_path};
use crate::domain::table::DashboardState;
use crate::domain::test_report::TestSuite;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("GitHub rejected the credential: {0}")]
    CredentialRejected(String),

    #[error(transparent)]
    Source(FetchError),
}

impl From<FetchError> for RefreshError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Unauthorized { body } => RefreshError::CredentialRejected(body),
            other => RefreshError::Source(other),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactReportError {
    #[error(transparent)]
    Locator(#[from] LocatorError),

    #[error("failed to download artifact: {0}")]
    Fetch(#[from] FetchError),

    #[error("archive extraction task failed: {0}")]
    Extraction(#[from] tokio::task::JoinError),
}

#[derive(Clone)]
pub struct DashboardService {
    android: PlatformConfig,
    ios: PlatformConfig,
    aggregator: PlatformAggregator,
    combiner: Combiner,
    source: Arc<dyn ArtifactSource>,
    extractor: Arc<dyn ArchiveExtractor>,
    parser: Arc<dyn ReportParser>,
}

impl DashboardService {
    pub fn new(
        android: PlatformConfig,
        ios: PlatformConfig,
        aggregator: PlatformAggregator,
        combiner: Combiner,
        source: Arc<dyn ArtifactSource>,
        extractor: Arc<dyn ArchiveExtractor>,
        parser: Arc<dyn ReportParser>,
    ) -> Self {
        Self {
            android,
            ios,
            aggregator,
            combiner,
            source,
            extractor,
            parser,
        }
    }

    /// Rebuild both platform grids, reusing tables from `previous` whose run is unchanged,
    /// and recombine them.
    pub async fn refresh(
        &self,
        credential: Option<&str>,
        previous: Option<&DashboardState>,
    ) -> Result<DashboardState, RefreshError> {
        let previous_android = previous.and_then(|state| state.android_results.as_ref());
        let previous_ios = previous.and_then(|state| state.ios_results.as_ref());

        let (android, ios) = tokio::join!(
            self.aggregator.aggregate(&self.android, credential, previous_android),
            self.aggregator.aggregate(&self.ios, credential, previous_ios),
        );
        let android = android?;
        let ios = ios?;

        let combined = Arc::new(self.combiner.combine(&android, &ios));
        tracing::info!(
            android_run = ?android.id,
            ios_run = ?ios.id,
            combined_rows = combined.libraries.len(),
            "dashboard refreshed"
        );

        Ok(DashboardState {
            android_results: Some(android),
            ios_results: Some(ios),
            combined_results: Some(combined),
        })
    }

    /// Suites of every report in one artifact, each renamed `"<entry path> - <suite name>"`.
    pub async fn load_artifact_report(
        &self,
        url: &str,
        credential: Option<&str>,
    ) -> Result<Vec<TestSuite>, ArtifactReportError> {
        let locator = ArtifactLocator::parse(url)?;
        tracing::info!(repo = %locator.repo, artifact_id = locator.artifact_id, "loading artifact report");

        let bytes = self
            .source
            .download(&locator.repo, locator.artifact_id, credential)
            .await?;

        let extractor = self.extractor.clone();
        let entries = tokio::task::spawn_blocking(move || extractor.extract(&bytes)).await?;

        let mut suites = Vec::new();
        for (path, contents) in entries {
            if !is_report_path(&path, DEFAULT_REPORT_EXTENSION) {
                continue;
            }
            let parsed = self.parser.parse(&String::from_utf8_lossy(&contents));
            suites.extend(parsed.into_iter().map(|suite| TestSuite {
                name: format!("{path} - {}", suite.name),
                ..suite
            }));
        }

        Ok(suites)
    }
}
