use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use datasets::{checksum, dataset_name, validate, DEFAULT_VERSION};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::audit::AuditEvent;
use crate::error::ApiError;
use crate::state::SharedState;

pub const FILE_FIELD: &str = "file";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub path: String,
    pub checksum: String,
    pub size: u64,
}

/// `POST /ingest/upload`: validate, checksum, then store. Nothing touches the
/// filesystem until the upload has passed validation.
pub async fn upload_dataset(
    State(state): State<SharedState>,
    mp: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut mp = mp?;
    let mut upload: Option<(String, bytes::Bytes)> = None;

    while let Some(field) = mp.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        upload = Some((filename, bytes));
    }

    let (filename, bytes) = upload.ok_or_else(|| ApiError::bad_request("No file uploaded"))?;

    let validated = match validate(&filename, &bytes) {
        Ok(v) => v,
        Err(e) => {
            warn!(file = %filename, size = bytes.len(), reason = %e, "upload rejected");
            state.record(AuditEvent::dataset_rejected(&filename, bytes.len(), &e.to_string())).await;
            return Err(e.into());
        }
    };

    let name = match dataset_name(&validated.filename) {
        Ok(n) => n,
        Err(e) => {
            warn!(file = %filename, reason = %e, "upload rejected");
            state.record(AuditEvent::dataset_rejected(&filename, bytes.len(), &e.to_string())).await;
            return Err(e.into());
        }
    };

    let digest = checksum(validated.bytes);

    let stored = state
        .store
        .store(&name, DEFAULT_VERSION, validated.bytes)
        .await;
    let stored = match stored {
        Ok(s) => s,
        Err(e) => {
            error!(dataset = %name, error = %e, "dataset write failed");
            state.record(AuditEvent::dataset_store_failed(&filename, validated.size, &e.to_string())).await;
            return Err(e.into());
        }
    };

    state
        .record(AuditEvent::dataset_upload(&validated.filename, validated.size, &digest, &stored.path))
        .await;
    info!(
        dataset = %name,
        version = %stored.version,
        size = validated.size,
        sha256 = %digest,
        path = %stored.path.display(),
        "dataset stored"
    );

    Ok(Json(UploadResponse {
        message: format!("Dataset '{name}' uploaded successfully"),
        path: stored.path.display().to_string(),
        checksum: digest,
        size: validated.size,
    }))
}
