// Test report domain models (JUnit-style suites and cases)
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TestSuite {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "tests")]
    pub tests_count: u32,
    #[serde(default)]
    pub failures: u32,
    #[serde(default)]
    pub errors: u32,
    #[serde(default)]
    pub skipped: u32,
    #[serde(default, rename = "time")]
    pub time_seconds: f64,
    #[serde(default)]
    pub testcases: Vec<TestCase>,
}

impl TestSuite {
    pub fn passed(&self) -> bool {
        self.failures == 0 && self.errors == 0
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TestCase {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "classname")]
    pub class_name: String,
    #[serde(default, rename = "time")]
    pub time_seconds: f64,
    #[serde(default)]
    pub failure: Option<TestFailure>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TestFailure {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub content: String,
}

/// True when no suite reports a failure or an error. An empty report passes.
pub fn all_passed(suites: &[TestSuite]) -> bool {
    suites.iter().all(TestSuite::passed)
}
