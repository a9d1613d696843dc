// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod file_store;
pub mod github_client;
pub mod junit_parser;
pub mod zip_extractor;
