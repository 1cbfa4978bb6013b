//! Receipt storage on the local filesystem.
//!
//! Objects are written beneath one directory opened through `cap-std`, so
//! a file name can never escape it. Names are content hashes, which makes
//! re-uploading the same file a no-op.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use cap_std::{ambient_authority, fs::Dir};
use tracing::{debug, error};
use uuid::Uuid;

use crate::domain::ReceiptUpload;
use crate::domain::ports::{ReceiptStorage, ReceiptStorageError, StoredReceipt};

/// Stores receipts in a directory and serves them under `base_url`.
#[derive(Debug, Clone)]
pub struct ReceiptDirectory {
    dir: Arc<Dir>,
    path: PathBuf,
    base_url: String,
}

impl ReceiptDirectory {
    /// Open `path`, creating it when missing.
    pub fn open(path: impl AsRef<Path>, base_url: impl Into<String>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        Dir::create_ambient_dir_all(&path, ambient_authority())?;
        let dir = Dir::open_ambient_dir(&path, ambient_authority())?;
        Ok(Self {
            dir: Arc::new(dir),
            path,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn url_for(&self, file_name: &str) -> String {
        format!("{}/{file_name}", self.base_url)
    }
}

/// Write through a staging name then rename, so readers never observe a
/// partial object.
fn write_object(dir: &Dir, file_name: &str, bytes: &[u8]) -> io::Result<bool> {
    if dir.exists(file_name) {
        return Ok(false);
    }
    let staging = format!(".upload-{}", Uuid::new_v4().simple());
    dir.write(&staging, bytes)?;
    if let Err(err) = dir.rename(&staging, dir, file_name) {
        let _cleanup_result = dir.remove_file(&staging);
        return Err(err);
    }
    Ok(true)
}

#[async_trait]
impl ReceiptStorage for ReceiptDirectory {
    async fn store(&self, upload: &ReceiptUpload) -> Result<StoredReceipt, ReceiptStorageError> {
        let dir = Arc::clone(&self.dir);
        let file_name = upload.file_name().to_owned();
        let bytes = upload.bytes().to_vec();
        let name = file_name.clone();
        let written = tokio::task::spawn_blocking(move || write_object(&dir, &name, &bytes))
            .await
            .map_err(|err| ReceiptStorageError::connection(err.to_string()))?
            .map_err(|err| {
                error!(error = %err, file = %file_name, "receipt write failed");
                ReceiptStorageError::write(err.to_string())
            })?;
        debug!(file = %file_name, written, "receipt stored");
        Ok(StoredReceipt {
            url: self.url_for(&file_name),
        })
    }
}
