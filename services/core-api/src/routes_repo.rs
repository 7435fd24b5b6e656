use axum::extract::State;
use axum::Json;
use tracing::{error, info};

use crate::audit::AuditEvent;
use crate::error::ApiError;
use crate::repo_sync::CommitInfo;
use crate::state::SharedState;

/// `POST /repo/sync`. Despite the name this only reports the current commit.
pub async fn sync_repository(State(state): State<SharedState>) -> Result<Json<CommitInfo>, ApiError> {
    let repo_root = state.config.repo_path.as_deref();

    match state.probe.current_revision(repo_root).await {
        Ok(info) => {
            info!(commit = %info.commit_sha, "repo sync");
            state.record(AuditEvent::repo_sync(&info.commit_sha)).await;
            Ok(Json(info))
        }
        Err(e) => {
            error!(error = %e, repo = ?repo_root, "repo sync failed");
            state.record(AuditEvent::repo_sync_failed(&e.to_string())).await;
            Err(e.into())
        }
    }
}
