use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::StoredDataset;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid dataset name derived from {0:?}")]
    InvalidName(String),

    #[error("Storage error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Dataset base name: the file-name stem before the final extension.
///
/// Any directory part of the client-supplied name is dropped, so
/// `../../etc/x.csv` maps to `x`.
pub fn dataset_name(filename: &str) -> Result<String> {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    match stem {
        "" | "." | ".." => Err(StoreError::InvalidName(filename.to_string())),
        s => Ok(s.to_string()),
    }
}

/// Filesystem layout: `<root>/<dataset_name>/<version>.csv`.
///
/// Writes go straight to the final path. Two uploads of the same name race and
/// the last writer wins; there is no history.
#[derive(Clone, Debug)]
pub struct DatasetStore {
    root: PathBuf,
}

impl DatasetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, dataset_name: &str, version: &str) -> PathBuf {
        self.root.join(dataset_name).join(format!("{version}.csv"))
    }

    pub async fn store(&self, dataset_name: &str, version: &str, bytes: &[u8]) -> Result<StoredDataset> {
        let dir = self.root.join(dataset_name);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| StoreError::Io { path: dir.clone(), source })?;

        let path = self.path_for(dataset_name, version);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| StoreError::Io { path: path.clone(), source })?;

        Ok(StoredDataset {
            dataset_name: dataset_name.to_string(),
            version: version.to_string(),
            path,
        })
    }
}
