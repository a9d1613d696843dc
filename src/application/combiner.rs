// Cross-platform combiner - Merges the Android and iOS grids into one display grid
use crate::domain::table::{SEPARATOR, TableData};
use crate::domain::workflow::RunStatus;
use crate::infrastructure::config::ColumnLabels;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

/// API level -> marketing version
const ANDROID_VERSIONS: &[(&str, &str)] = &[
    ("28", "9"),
    ("29", "10"),
    ("30", "11"),
    ("31", "12"),
    ("32", "12L"),
    ("33", "13"),
    ("34", "14"),
    ("35", "15"),
    ("36", "16"),
];

impl ColumnLabels {
    pub fn label(&self, column: &str) -> String {
        match self {
            ColumnLabels::AndroidApiLevel => ANDROID_VERSIONS
                .iter()
                .find(|(level, _)| *level == column)
                .map(|(level, version)| format!("Android {version}\n(API {level})"))
                .unwrap_or_else(|| format!("API {column}")),
            ColumnLabels::Prefix { prefix } => format!("{prefix}{column}"),
        }
    }
}

/// How one platform's rows and columns are presented in the combined grid.
#[derive(Debug, Clone)]
pub struct PlatformDisplay {
    display_names: HashMap<String, String>,
    labels: ColumnLabels,
}

impl PlatformDisplay {
    pub fn new(display_names: HashMap<String, String>, labels: ColumnLabels) -> Self {
        Self {
            display_names,
            labels,
        }
    }

    pub fn display_name<'a>(&'a self, library: &'a str) -> &'a str {
        self.display_names
            .get(library)
            .map(String::as_str)
            .unwrap_or(library)
    }

    /// Reverse of [`display_name`](Self::display_name) within one table's libraries.
    fn source_library<'t>(&self, table: &'t TableData, row: &str) -> Option<&'t str> {
        table
            .libraries
            .iter()
            .map(String::as_str)
            .find(|library| self.display_name(library) == row)
    }
}

/// Strictly increasing millisecond timestamps, so two combines never share an id.
#[derive(Debug, Clone, Default)]
struct SyntheticIds {
    last: Arc<AtomicI64>,
}

impl SyntheticIds {
    fn next(&self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        let previous = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(now.max(last + 1)))
            .unwrap_or(now);
        now.max(previous + 1)
    }
}

#[derive(Debug, Clone)]
pub struct Combiner {
    title: String,
    row_order: Vec<String>,
    primary: PlatformDisplay,
    secondary: PlatformDisplay,
    ids: SyntheticIds,
}

impl Combiner {
    pub fn new(
        title: String,
        row_order: Vec<String>,
        primary: PlatformDisplay,
        secondary: PlatformDisplay,
    ) -> Self {
        Self {
            title,
            row_order,
            primary,
            secondary,
            ids: SyntheticIds::default(),
        }
    }

    pub fn combine(&self, primary: &TableData, secondary: &TableData) -> TableData {
        // (label, owning table + raw column); separators own nothing
        let mut columns: Vec<(String, Option<(&TableData, &PlatformDisplay, &str)>)> = Vec::new();
        for (table, display) in [(primary, &self.primary), (secondary, &self.secondary)] {
            columns.push((SEPARATOR.to_string(), None));
            for column in &table.columns {
                columns.push((display.labels.label(column), Some((table, display, column.as_str()))));
            }
        }

        let rows = self.unified_rows(primary, secondary);

        let mut results = BTreeMap::new();
        for row in &rows {
            let cells = columns
                .iter()
                .map(|(label, owner)| {
                    let cell = owner.and_then(|(table, display, raw)| {
                        let library = display.source_library(table, row)?;
                        table.cell(library, raw).cloned()
                    });
                    (label.clone(), cell)
                })
                .collect();
            results.insert(row.clone(), cells);
        }

        let active = [primary.status, secondary.status]
            .into_iter()
            .flatten()
            .any(RunStatus::is_active);

        TableData {
            title: self.title.clone(),
            libraries: rows,
            columns: columns.into_iter().map(|(label, _)| label).collect(),
            results,
            status: Some(if active {
                RunStatus::InProgress
            } else {
                RunStatus::Completed
            }),
            id: Some(self.ids.next()),
        }
    }

    /// Display rows of both platforms, deduplicated, in the configured order. Names missing
    /// from the order list follow all known names in first-seen order.
    fn unified_rows(&self, primary: &TableData, secondary: &TableData) -> Vec<String> {
        let mut rows: Vec<String> = Vec::new();
        let names = primary
            .libraries
            .iter()
            .map(|library| self.primary.display_name(library))
            .chain(
                secondary
                    .libraries
                    .iter()
                    .map(|library| self.secondary.display_name(library)),
            );
        for name in names {
            if !rows.iter().any(|row| row == name) {
                rows.push(name.to_string());
            }
        }

        rows.sort_by_key(|row| {
            self.row_order
                .iter()
                .position(|known| known == row)
                .unwrap_or(usize::MAX)
        });
        rows
    }
}
