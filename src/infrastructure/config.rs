use crate::application::aggregator::DEFAULT_MAX_CONCURRENT_DOWNLOADS;
use crate::application::combiner::{Combiner, PlatformDisplay};
use crate::application::routing::{
    ArtifactRouting, DEFAULT_REPORT_EXTENSION, LibraryNameRouting, LibraryVersionRouting,
    PlatformConfig,
};
use crate::application::run_selector::{DEFAULT_MAX_CANDIDATES, DEFAULT_WORKFLOW_NAME};
use crate::domain::workflow::RepoRef;
use anyhow::Context;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_OWNER: &str = "brandonpage";
const DEFAULT_ARTIFACT_PREFIX: &str = "test-results-";
const DEFAULT_IOS_ARTIFACT_PATTERN: &str = r"test-results-(?P<library>.+)-ios\^(?P<version>.+)";

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    #[serde(default)]
    pub github: GitHubSettings,
    #[serde(default)]
    pub nightly: NightlySettings,
    #[serde(default)]
    pub refresh: RefreshSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default = "PlatformSettings::android")]
    pub android: PlatformSettings,
    #[serde(default = "PlatformSettings::ios")]
    pub ios: PlatformSettings,
    #[serde(default)]
    pub combined: CombinedSettings,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            github: GitHubSettings::default(),
            nightly: NightlySettings::default(),
            refresh: RefreshSettings::default(),
            storage: StorageSettings::default(),
            server: ServerSettings::default(),
            android: PlatformSettings::android(),
            ios: PlatformSettings::ios(),
            combined: CombinedSettings::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GitHubSettings {
    pub api_base_url: String,
    pub user_agent: String,
    pub api_version: String,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    pub max_concurrent_downloads: usize,
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.github.com".into(),
            user_agent: "SalesforceMobileSDK-Automation-Dashboard".into(),
            api_version: "2022-11-28".into(),
            request_timeout: Duration::from_secs(30),
            max_concurrent_downloads: DEFAULT_MAX_CONCURRENT_DOWNLOADS,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NightlySettings {
    pub workflow_name: String,
    pub max_candidates: usize,
}

impl Default for NightlySettings {
    fn default() -> Self {
        Self {
            workflow_name: DEFAULT_WORKFLOW_NAME.into(),
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RefreshSettings {
    /// Periodic refresh; the initial load always runs.
    pub enabled: bool,
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct StorageSettings {
    pub state_file: Option<PathBuf>,
    pub token_file: Option<PathBuf>,
}

impl StorageSettings {
    pub fn state_path(&self) -> PathBuf {
        self.state_file
            .clone()
            .unwrap_or_else(|| home_file(".nightly_dashboard_state.json"))
    }

    pub fn token_path(&self) -> PathBuf {
        self.token_file
            .clone()
            .unwrap_or_else(|| home_file(".nightly_dashboard_token"))
    }
}

fn home_file(name: &str) -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(name)
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PlatformSettings {
    pub title: String,
    pub owner: String,
    pub repo: String,
    pub libraries: Vec<String>,
    pub columns: Vec<String>,
    #[serde(default = "default_report_extension")]
    pub report_extension: String,
    pub routing: RoutingSettings,
    #[serde(default)]
    pub display_names: Vec<DisplayName>,
    pub column_labels: ColumnLabels,
}

fn default_report_extension() -> String {
    DEFAULT_REPORT_EXTENSION.into()
}

fn default_artifact_prefix() -> String {
    DEFAULT_ARTIFACT_PREFIX.into()
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoutingSettings {
    /// `<prefix><Library>`; the column comes from each report's file name
    LibraryName {
        #[serde(default = "default_artifact_prefix")]
        prefix: String,
    },
    /// Regex with `library` and `version` named groups over the artifact name
    LibraryVersion { pattern: String },
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnLabels {
    AndroidApiLevel,
    Prefix { prefix: String },
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DisplayName {
    pub library: String,
    pub display: String,
}

impl DisplayName {
    fn new(library: &str, display: &str) -> Self {
        Self {
            library: library.into(),
            display: display.into(),
        }
    }
}

impl PlatformSettings {
    pub fn android() -> Self {
        Self {
            title: "Android".into(),
            owner: DEFAULT_OWNER.into(),
            repo: "SalesforceMobileSDK-Android".into(),
            libraries: to_strings(&[
                "SalesforceAnalytics",
                "SalesforceSDK",
                "SmartStore",
                "MobileSync",
                "SalesforceHybrid",
                "SalesforceReact",
            ]),
            columns: (28..=36).map(|level: u32| level.to_string()).collect(),
            report_extension: default_report_extension(),
            routing: RoutingSettings::LibraryName {
                prefix: default_artifact_prefix(),
            },
            display_names: vec![
                DisplayName::new("SalesforceAnalytics", "Analytics"),
                DisplayName::new("SalesforceSDK", "Core"),
                DisplayName::new("SalesforceHybrid", "Hybrid"),
                DisplayName::new("SalesforceReact", "React"),
            ],
            column_labels: ColumnLabels::AndroidApiLevel,
        }
    }

    pub fn ios() -> Self {
        Self {
            title: "iOS".into(),
            owner: DEFAULT_OWNER.into(),
            repo: "SalesforceMobileSDK-iOS".into(),
            libraries: to_strings(&[
                "SalesforceAnalytics",
                "SalesforceSDKCommon",
                "SalesforceSDKCore",
                "SmartStore",
                "MobileSync",
            ]),
            columns: to_strings(&["17", "18", "26"]),
            report_extension: default_report_extension(),
            routing: RoutingSettings::LibraryVersion {
                pattern: DEFAULT_IOS_ARTIFACT_PATTERN.into(),
            },
            display_names: vec![
                DisplayName::new("SalesforceAnalytics", "Analytics"),
                DisplayName::new("SalesforceSDKCommon", "SDK Common"),
                DisplayName::new("SalesforceSDKCore", "Core"),
            ],
            column_labels: ColumnLabels::Prefix {
                prefix: "iOS ".into(),
            },
        }
    }

    pub fn platform_config(&self) -> anyhow::Result<PlatformConfig> {
        let routing: Arc<dyn ArtifactRouting> = match &self.routing {
            RoutingSettings::LibraryName { prefix } => Arc::new(
                LibraryNameRouting::new(prefix.clone(), &self.report_extension)
                    .context("invalid report file pattern")?,
            ),
            RoutingSettings::LibraryVersion { pattern } => Arc::new(
                LibraryVersionRouting::new(pattern)
                    .with_context(|| format!("invalid artifact pattern for {}", self.title))?,
            ),
        };

        Ok(PlatformConfig {
            title: self.title.clone(),
            repo: RepoRef::new(self.owner.clone(), self.repo.clone()),
            libraries: self.libraries.clone(),
            columns: self.columns.clone(),
            report_extension: self.report_extension.clone(),
            routing,
        })
    }

    pub fn display(&self) -> PlatformDisplay {
        let names = self
            .display_names
            .iter()
            .map(|name| (name.library.clone(), name.display.clone()))
            .collect();
        PlatformDisplay::new(names, self.column_labels.clone())
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CombinedSettings {
    pub title: String,
    pub row_order: Vec<String>,
}

impl Default for CombinedSettings {
    fn default() -> Self {
        Self {
            title: "All Platforms".into(),
            row_order: to_strings(&[
                "Analytics",
                "SDK Common",
                "Core",
                "SmartStore",
                "MobileSync",
                "Hybrid",
                "React",
            ]),
        }
    }
}

impl DashboardConfig {
    pub fn combiner(&self) -> Combiner {
        Combiner::new(
            self.combined.title.clone(),
            self.combined.row_order.clone(),
            self.android.display(),
            self.ios.display(),
        )
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// `config/dashboard.*` (optional) overlaid by `DASHBOARD_*` environment variables,
/// e.g. `DASHBOARD_REFRESH__INTERVAL=1m`.
pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(
            config::Environment::with_prefix("DASHBOARD")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> DashboardConfig {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse("");
        assert_eq!(config.refresh.interval, Duration::from_secs(30));
        assert!(config.refresh.enabled);
        assert_eq!(config.nightly.workflow_name, "Nightly Tests");
        assert_eq!(config.android.columns.first().map(String::as_str), Some("28"));
        assert_eq!(config.android.columns.last().map(String::as_str), Some("36"));
        assert_eq!(config.ios.columns, vec!["17", "18", "26"]);
        assert_eq!(config.github.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_overrides() {
        let config = parse(
            r#"
            [refresh]
            interval = "2m"

            [github]
            max_concurrent_downloads = 8

            [ios]
            title = "iOS"
            owner = "forcedotcom"
            repo = "SalesforceMobileSDK-iOS"
            libraries = ["SmartStore"]
            columns = ["18"]
            routing = { kind = "library_version", pattern = 'results-(?P<library>\w+)@(?P<version>\d+)' }
            column_labels = { kind = "prefix", prefix = "iPhone " }
            "#,
        );

        assert_eq!(config.refresh.interval, Duration::from_secs(120));
        assert!(config.refresh.enabled);
        assert_eq!(config.github.max_concurrent_downloads, 8);
        assert_eq!(config.github.api_version, "2022-11-28");
        assert_eq!(config.ios.owner, "forcedotcom");
        assert_eq!(config.ios.report_extension, ".xml");
        assert_eq!(config.ios.column_labels.label("18"), "iPhone 18");
        // untouched platform keeps its defaults
        assert_eq!(config.android.repo, "SalesforceMobileSDK-Android");

        let platform = config.ios.platform_config().unwrap();
        let route = platform
            .routing
            .route("results-SmartStore@18", &platform.libraries, &platform.columns)
            .unwrap();
        assert_eq!(route.library, "SmartStore");
        assert_eq!(route.column.as_deref(), Some("18"));
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let mut settings = PlatformSettings::ios();
        settings.routing = RoutingSettings::LibraryVersion {
            pattern: "test-results-(".into(),
        };
        assert!(settings.platform_config().is_err());
    }

    #[test]
    fn test_default_platforms_build() {
        let config = DashboardConfig::default();
        let android = config.android.platform_config().unwrap();
        assert_eq!(android.repo.to_string(), "brandonpage/SalesforceMobileSDK-Android");
        assert_eq!(config.android.display().display_name("SalesforceSDK"), "Core");
        assert_eq!(config.ios.display().display_name("SmartStore"), "SmartStore");
    }
}
