use std::sync::Arc;

use datasets::DatasetStore;
use tracing::warn;

use crate::audit::{AuditEvent, AuditSink};
use crate::config::AppConfig;
use crate::repo_sync::RevisionProbe;

pub type SharedState = Arc<AppState>;

/// Built once at startup; handlers only read it.
pub struct AppState {
    pub config: AppConfig,
    pub store: DatasetStore,
    pub audit: Arc<dyn AuditSink>,
    pub probe: RevisionProbe,
}

impl AppState {
    pub fn new(config: AppConfig, audit: Arc<dyn AuditSink>) -> Self {
        let store = DatasetStore::new(config.dataset_root.clone());
        let probe = RevisionProbe::git(config.git_bin.clone(), config.git_timeout);
        Self {
            config,
            store,
            audit,
            probe,
        }
    }

    pub fn with_probe(mut self, probe: RevisionProbe) -> Self {
        self.probe = probe;
        self
    }

    /// Audit failures are logged, never surfaced to the client. The sink does
    /// blocking file IO, so it runs on the blocking pool.
    pub async fn record(&self, event: AuditEvent) {
        let audit = Arc::clone(&self.audit);
        let event_type = event.event_type.clone();
        match tokio::task::spawn_blocking(move || audit.record(&event)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(event_type = %event_type, error = %e, "audit write failed"),
            Err(e) => warn!(event_type = %event_type, error = %e, "audit task failed"),
        }
    }
}
