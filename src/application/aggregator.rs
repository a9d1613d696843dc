// Per-platform aggregator - Builds the library x version grid from one nightly run
use crate::application::artifact_source::{ArchiveExtractor, ArtifactSource, FetchError, ReportParser};
use crate::application::routing::{ArtifactRoute, PlatformConfig};
use crate::application::run_selector::RunSelector;
use crate::domain::table::{CellData, TableData};
use crate::domain::workflow::Artifact;
use anyhow::Context;
use futures::stream::{self, StreamExt};
use std::sync::Arc;

pub const DEFAULT_MAX_CONCURRENT_DOWNLOADS: usize = 4;

#[derive(Clone)]
pub struct PlatformAggregator {
    selector: RunSelector,
    source: Arc<dyn ArtifactSource>,
    extractor: Arc<dyn ArchiveExtractor>,
    parser: Arc<dyn ReportParser>,
    max_concurrent_downloads: usize,
}

impl PlatformAggregator {
    pub fn new(
        selector: RunSelector,
        source: Arc<dyn ArtifactSource>,
        extractor: Arc<dyn ArchiveExtractor>,
        parser: Arc<dyn ReportParser>,
        max_concurrent_downloads: usize,
    ) -> Self {
        Self {
            selector,
            source,
            extractor,
            parser,
            max_concurrent_downloads: max_concurrent_downloads.max(1),
        }
    }

    /// Build the grid for `platform`, or hand back `previous` when it already reflects the
    /// selected run.
    pub async fn aggregate(
        &self,
        platform: &PlatformConfig,
        credential: Option<&str>,
        previous: Option<&Arc<TableData>>,
    ) -> Result<Arc<TableData>, FetchError> {
        let nightly = self
            .selector
            .select_nightly_run(&platform.repo, credential)
            .await?;

        if let Some(previous) = previous {
            if previous.is_current_for(nightly.run_id, nightly.status) {
                tracing::info!(
                    platform = %platform.title,
                    run_id = ?nightly.run_id,
                    "nightly run unchanged, reusing previous results"
                );
                return Ok(previous.clone());
            }
        }

        let mut table = TableData::empty(
            platform.title.clone(),
            platform.libraries.clone(),
            platform.columns.clone(),
            nightly.status,
            nightly.run_id,
        );

        // Owned items keep the download stream `Send` for spawned callers
        let routed: Vec<(ArtifactRoute, Artifact)> = nightly
            .artifacts
            .iter()
            .filter_map(|artifact| {
                platform
                    .routing
                    .route(&artifact.name, &platform.libraries, &platform.columns)
                    .map(|route| (route, artifact.clone()))
            })
            .collect();

        tracing::info!(
            platform = %platform.title,
            run_id = ?nightly.run_id,
            artifacts = nightly.artifacts.len(),
            routed = routed.len(),
            "aggregating nightly artifacts"
        );

        // `buffered` keeps discovery order, so shards fold the same way every cycle
        let outcomes: Vec<_> = stream::iter(routed)
            .map(|(route, artifact)| async move {
                let result = self.collect_artifact(platform, credential, &route, &artifact).await;
                (route, artifact, result)
            })
            .buffered(self.max_concurrent_downloads)
            .collect()
            .await;

        for (route, artifact, result) in outcomes {
            match result {
                Ok(cells) => {
                    for (column, cell) in cells {
                        table.accumulate(&route.library, &column, cell);
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        platform = %platform.title,
                        artifact = %artifact.name,
                        error = ?e,
                        "failed to process artifact"
                    );
                }
            }
        }

        Ok(Arc::new(table))
    }

    /// Download one artifact and turn each report inside it into a (column, cell) pair.
    async fn collect_artifact(
        &self,
        platform: &PlatformConfig,
        credential: Option<&str>,
        route: &ArtifactRoute,
        artifact: &Artifact,
    ) -> anyhow::Result<Vec<(String, CellData)>> {
        tracing::debug!(
            artifact = %artifact.name,
            size = artifact.size_in_bytes,
            created_at = artifact.created_at.as_deref().unwrap_or("unknown"),
            url = %artifact.archive_download_url,
            "collecting artifact"
        );
        let bytes = self
            .source
            .download(&platform.repo, artifact.id, credential)
            .await
            .with_context(|| format!("downloading artifact {}", artifact.id))?;

        let extractor = self.extractor.clone();
        let entries = tokio::task::spawn_blocking(move || extractor.extract(&bytes))
            .await
            .context("archive extraction task failed")?;

        let mut cells = Vec::new();
        for (path, contents) in entries {
            if !platform.is_report(&path) {
                continue;
            }

            let column = match &route.column {
                Some(column) => column.clone(),
                None => match platform.routing.report_column(&path, &platform.columns) {
                    Some(column) => column,
                    None => {
                        tracing::debug!(artifact = %artifact.name, %path, "no column for report, skipping");
                        continue;
                    }
                },
            };

            let suites = self.parser.parse(&String::from_utf8_lossy(&contents));
            tracing::debug!(
                artifact = %artifact.name,
                %path,
                %column,
                suites = suites.len(),
                "parsed report"
            );
            cells.push((column, CellData::from_suites(suites)));
        }

        Ok(cells)
    }
}
