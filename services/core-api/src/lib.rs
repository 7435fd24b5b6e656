//! ZONE-GPT core API: CSV dataset ingestion and repository revision lookup.

pub mod app;
pub mod audit;
pub mod config;
pub mod error;
pub mod repo_sync;
pub mod routes_ingest;
pub mod routes_repo;
pub mod state;

pub use app::{build_router, API_DESCRIPTION, API_TITLE, API_VERSION};
pub use config::AppConfig;
pub use state::{AppState, SharedState};
