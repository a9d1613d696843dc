// Artifact routing - Maps artifact names and report paths onto grid coordinates
use crate::domain::workflow::RepoRef;
use regex::Regex;
use std::sync::Arc;

/// Where an artifact's reports land in the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRoute {
    pub library: String,
    /// Fixed column for every report in the artifact; `None` means resolve per report path.
    pub column: Option<String>,
}

pub trait ArtifactRouting: Send + Sync {
    fn route(&self, artifact_name: &str, libraries: &[String], columns: &[String]) -> Option<ArtifactRoute>;

    /// Column for a report file inside an artifact routed without a fixed column.
    fn report_column(&self, _path: &str, _columns: &[String]) -> Option<String> {
        None
    }
}

/// `<prefix><Library>` artifacts whose reports carry the API level in their file name.
pub struct LibraryNameRouting {
    prefix: String,
    level_pattern: Regex,
}

impl LibraryNameRouting {
    pub fn new(prefix: impl Into<String>, report_extension: &str) -> Result<Self, regex::Error> {
        // "api30", "api-30", "API_30" anywhere, or "30.xml" at a path/separator boundary
        let level_pattern = Regex::new(&format!(
            r"(?i)api[-_]?(\d{{2}})|(?:^|[-_./])(\d{{2}}){}",
            regex::escape(report_extension)
        ))?;
        Ok(Self {
            prefix: prefix.into(),
            level_pattern,
        })
    }

    /// First level in `path` that is one of `columns`; out-of-range numbers are skipped.
    pub fn level_from_path(&self, path: &str, columns: &[String]) -> Option<String> {
        self.level_pattern
            .captures_iter(path)
            .filter_map(|captures| captures.get(1).or_else(|| captures.get(2)))
            .map(|m| m.as_str())
            .find(|level| columns.iter().any(|c| c == level))
            .map(str::to_string)
    }
}

impl ArtifactRouting for LibraryNameRouting {
    fn route(&self, artifact_name: &str, libraries: &[String], _columns: &[String]) -> Option<ArtifactRoute> {
        let library = libraries
            .iter()
            .find(|lib| artifact_name.eq_ignore_ascii_case(&format!("{}{}", self.prefix, lib)))?;
        Some(ArtifactRoute {
            library: library.clone(),
            column: None,
        })
    }

    fn report_column(&self, path: &str, columns: &[String]) -> Option<String> {
        self.level_from_path(path, columns)
    }
}

/// Artifacts whose name carries both library and version, e.g. `test-results-SmartStore-ios^18`.
pub struct LibraryVersionRouting {
    pattern: Regex,
}

impl LibraryVersionRouting {
    /// `pattern` must define the named groups `library` and `version`.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }
}

impl ArtifactRouting for LibraryVersionRouting {
    fn route(&self, artifact_name: &str, libraries: &[String], columns: &[String]) -> Option<ArtifactRoute> {
        let captures = self.pattern.captures(artifact_name)?;
        let name = captures.name("library")?.as_str();
        let version = captures.name("version")?.as_str();

        let library = libraries.iter().find(|lib| lib.eq_ignore_ascii_case(name))?;
        let column = columns.iter().find(|c| c.as_str() == version)?;
        Some(ArtifactRoute {
            library: library.clone(),
            column: Some(column.clone()),
        })
    }
}

/// Everything the aggregator needs to know about one source repository.
#[derive(Clone)]
pub struct PlatformConfig {
    pub title: String,
    pub repo: RepoRef,
    pub libraries: Vec<String>,
    pub columns: Vec<String>,
    pub report_extension: String,
    pub routing: Arc<dyn ArtifactRouting>,
}

impl PlatformConfig {
    pub fn is_report(&self, path: &str) -> bool {
        is_report_path(path, &self.report_extension)
    }
}

pub const DEFAULT_REPORT_EXTENSION: &str = ".xml";

/// Report files are matched on their exact extension, case included.
pub fn is_report_path(path: &str, extension: &str) -> bool {
    path.ends_with(extension)
}

impl std::fmt::Debug for PlatformConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformConfig")
            .field("title", &self.title)
            .field("repo", &self.repo)
            .field("libraries", &self.libraries)
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}
