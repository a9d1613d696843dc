// In-memory artifact source and fixture builders for pipeline tests
use crate::application::artifact_source::{ArtifactSource, FetchError};
use crate::application::routing::{LibraryNameRouting, LibraryVersionRouting, PlatformConfig};
use crate::domain::workflow::{Artifact, RepoRef, RunStatus, WorkflowRun};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
pub struct FakeSource {
    runs: Mutex<HashMap<String, Vec<WorkflowRun>>>,
    run_failures: HashMap<String, u16>,
    artifacts: Mutex<HashMap<i64, Vec<Artifact>>>,
    archives: HashMap<i64, Vec<u8>>,
    downloads: AtomicUsize,
    listings: AtomicUsize,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_run(self, repo: &str, run: WorkflowRun) -> Self {
        self.runs
            .lock()
            .unwrap()
            .entry(repo.to_string())
            .or_default()
            .push(run);
        self
    }

    pub fn with_artifacts(self, run_id: i64, artifacts: Vec<Artifact>) -> Self {
        self.artifacts.lock().unwrap().insert(run_id, artifacts);
        self
    }

    pub fn with_archive(mut self, artifact_id: i64, bytes: Vec<u8>) -> Self {
        self.archives.insert(artifact_id, bytes);
        self
    }

    pub fn failing_runs(mut self, repo: &str, status: u16) -> Self {
        self.run_failures.insert(repo.to_string(), status);
        self
    }

    /// Replace the status of an existing run, as the provider would between polls.
    pub fn set_run_status(&self, repo: &str, run_id: i64, status: RunStatus) {
        if let Some(runs) = self.runs.lock().unwrap().get_mut(repo) {
            for run in runs.iter_mut().filter(|r| r.id == run_id) {
                run.status = status;
            }
        }
    }

    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    pub fn artifact_listings(&self) -> usize {
        self.listings.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtifactSource for FakeSource {
    async fn list_runs(
        &self,
        repo: &RepoRef,
        _credential: Option<&str>,
    ) -> Result<Vec<WorkflowRun>, FetchError> {
        match self.run_failures.get(&repo.name) {
            Some(401) => Err(FetchError::Unauthorized {
                body: "Bad credentials".to_string(),
            }),
            Some(status) => Err(FetchError::Status {
                status: *status,
                body: "boom".to_string(),
            }),
            None => Ok(self
                .runs
                .lock()
                .unwrap()
                .get(&repo.name)
                .cloned()
                .unwrap_or_default()),
        }
    }

    async fn list_artifacts(
        &self,
        _repo: &RepoRef,
        run_id: i64,
        _credential: Option<&str>,
    ) -> Result<Vec<Artifact>, FetchError> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .artifacts
            .lock()
            .unwrap()
            .get(&run_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn download(
        &self,
        _repo: &RepoRef,
        artifact_id: i64,
        _credential: Option<&str>,
    ) -> Result<Vec<u8>, FetchError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        self.archives
            .get(&artifact_id)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                status: 404,
                body: "Not Found".to_string(),
            })
    }
}

pub fn run(id: i64, name: &str, status: RunStatus) -> WorkflowRun {
    WorkflowRun {
        id,
        name: name.to_string(),
        status,
        conclusion: None,
        created_at: Some("2026-10-15T02:00:00Z".to_string()),
    }
}

pub fn artifact(id: i64, name: &str) -> Artifact {
    Artifact {
        id,
        name: name.to_string(),
        archive_download_url: format!("https://api.github.com/artifacts/{id}/zip"),
        created_at: None,
        size_in_bytes: 0,
    }
}

pub fn zip_archive(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (path, contents) in entries {
        writer
            .start_file(*path, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// A single-suite JUnit document with `failures` failing cases out of three.
pub fn junit(suite_name: &str, failures: u32) -> String {
    let mut cases = String::new();
    for i in 0..3 {
        if i < failures {
            cases.push_str(&format!(
                r#"<testcase name="case{i}" classname="{suite_name}" time="0.5"><failure message="boom">trace {i}</failure></testcase>"#
            ));
        } else {
            cases.push_str(&format!(
                r#"<testcase name="case{i}" classname="{suite_name}" time="0.5"/>"#
            ));
        }
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><testsuite name="{suite_name}" tests="3" failures="{failures}" errors="0" skipped="0" time="1.5">{cases}</testsuite>"#
    )
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

pub fn android_platform() -> PlatformConfig {
    PlatformConfig {
        title: "Android".to_string(),
        repo: RepoRef::new("brandonpage", "SalesforceMobileSDK-Android"),
        libraries: strings(&[
            "SalesforceAnalytics",
            "SalesforceSDK",
            "SmartStore",
            "MobileSync",
            "SalesforceHybrid",
            "SalesforceReact",
        ]),
        columns: (28..=36).map(|level| level.to_string()).collect(),
        report_extension: ".xml".to_string(),
        routing: Arc::new(LibraryNameRouting::new("test-results-", ".xml").unwrap()),
    }
}

pub fn ios_platform() -> PlatformConfig {
    PlatformConfig {
        title: "iOS".to_string(),
        repo: RepoRef::new("brandonpage", "SalesforceMobileSDK-iOS"),
        libraries: strings(&[
            "SalesforceAnalytics",
            "SalesforceSDKCommon",
            "SalesforceSDKCore",
            "SmartStore",
            "MobileSync",
        ]),
        columns: strings(&["17", "18", "26"]),
        report_extension: ".xml".to_string(),
        routing: Arc::new(
            LibraryVersionRouting::new(r"test-results-(?P<library>.+)-ios\^(?P<version>.+)").unwrap(),
        ),
    }
}
