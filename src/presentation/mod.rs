// Presentation layer - HTTP routes over the published dashboard
pub mod app_state;
pub mod handlers;
