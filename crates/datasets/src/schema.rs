use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Upload ceiling: 10 MiB.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Only one slot exists per dataset; re-uploads overwrite it.
pub const DEFAULT_VERSION: &str = "v1";

pub const CSV_EXTENSION: &str = ".csv";

/// Upload that passed every check in [`crate::validate`].
#[derive(Clone, Debug)]
pub struct ValidatedUpload<'a> {
    pub filename: String,
    pub size: u64,
    pub bytes: &'a [u8],
}

/// Where a dataset landed on disk.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredDataset {
    pub dataset_name: String,
    pub version: String,
    pub path: PathBuf,
}
