//! Port for storing receipt files.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::ReceiptUpload;

use super::define_port_error;

define_port_error! {
    /// Errors raised by receipt storage adapters.
    pub enum ReceiptStorageError {
        /// The backing store is unreachable.
        Connection { message: String } =>
            "receipt storage unavailable: {message}",
        /// Writing the object failed.
        Write { message: String } =>
            "receipt write failed: {message}",
    }
}

/// Where a stored receipt can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredReceipt {
    pub url: String,
}

/// Port for receipt blobs. Storing the same content twice yields the same
/// URL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReceiptStorage: Send + Sync {
    async fn store(&self, upload: &ReceiptUpload) -> Result<StoredReceipt, ReceiptStorageError>;
}

/// Pretends to store receipts under `/receipts/`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureReceiptStorage;

#[async_trait]
impl ReceiptStorage for FixtureReceiptStorage {
    async fn store(&self, upload: &ReceiptUpload) -> Result<StoredReceipt, ReceiptStorageError> {
        Ok(StoredReceipt {
            url: format!("/receipts/{}", upload.file_name()),
        })
    }
}
