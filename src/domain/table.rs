// Result grid domain models
use super::test_report::{TestSuite, all_passed};
use super::workflow::RunStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Column marker used purely for visual grouping. Never carries data.
pub const SEPARATOR: &str = "SEPARATOR";

/// library -> column -> cell; `None` means no data yet
pub type ResultsGrid = BTreeMap<String, BTreeMap<String, Option<CellData>>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellData {
    pub is_success: bool,
    pub suites: Vec<TestSuite>,
}

impl CellData {
    pub fn from_suites(suites: Vec<TestSuite>) -> Self {
        Self {
            is_success: all_passed(&suites),
            suites,
        }
    }

    /// Fold another report into this cell: success is AND-ed, suites appended in arrival order.
    pub fn absorb(&mut self, other: CellData) {
        self.is_success = self.is_success && other.is_success;
        self.suites.extend(other.suites);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    pub title: String,
    pub libraries: Vec<String>,
    pub columns: Vec<String>,
    pub results: ResultsGrid,
    #[serde(default)]
    pub status: Option<RunStatus>,
    #[serde(default)]
    pub id: Option<i64>,
}

impl TableData {
    /// A grid with every declared (library, column) pair present and empty.
    pub fn empty(
        title: impl Into<String>,
        libraries: Vec<String>,
        columns: Vec<String>,
        status: Option<RunStatus>,
        id: Option<i64>,
    ) -> Self {
        let results = libraries
            .iter()
            .map(|library| {
                let row = columns.iter().map(|column| (column.clone(), None)).collect();
                (library.clone(), row)
            })
            .collect();

        Self {
            title: title.into(),
            libraries,
            columns,
            results,
            status,
            id,
        }
    }

    pub fn cell(&self, library: &str, column: &str) -> Option<&CellData> {
        self.results.get(library)?.get(column)?.as_ref()
    }

    /// Merge `incoming` into the (library, column) cell. Pairs outside the declared grid are ignored.
    pub fn accumulate(&mut self, library: &str, column: &str, incoming: CellData) -> bool {
        let Some(slot) = self
            .results
            .get_mut(library)
            .and_then(|row| row.get_mut(column))
        else {
            return false;
        };

        match slot {
            Some(existing) => existing.absorb(incoming),
            None => *slot = Some(incoming),
        }
        true
    }

    /// Whether this table was built from the given run and can be reused as is.
    ///
    /// A run that is still active is only reused while its status is unchanged, so the
    /// transition to `completed` always triggers a fresh download.
    pub fn is_current_for(&self, run_id: Option<i64>, status: Option<RunStatus>) -> bool {
        if run_id.is_none() || self.id != run_id {
            return false;
        }
        let both_completed =
            self.status == Some(RunStatus::Completed) && status == Some(RunStatus::Completed);
        both_completed || self.status == status
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardState {
    #[serde(default)]
    pub android_results: Option<Arc<TableData>>,
    #[serde(default)]
    pub ios_results: Option<Arc<TableData>>,
    #[serde(default)]
    pub combined_results: Option<Arc<TableData>>,
}
