// Application layer - Use cases and the ports they depend on
pub mod aggregator;
pub mod artifact_locator;
pub mod artifact_source;
pub mod combiner;
pub mod dashboard_service;
pub mod refresh_scheduler;
pub mod routing;
pub mod run_selector;
pub mod stores;

#[cfg(test)]
pub mod test_support;
