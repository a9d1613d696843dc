// Domain layer - CI runs, test reports and result grids
pub mod table;
pub mod test_report;
pub mod workflow;
