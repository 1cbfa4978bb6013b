//! Receipt upload service.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::ports::{ReceiptCommand, ReceiptStorage, ReceiptStorageError, StoredReceipt};
use crate::domain::{Error, ReceiptUpload, UserId};

fn map_storage_error(error: ReceiptStorageError) -> Error {
    match error {
        ReceiptStorageError::Connection { message } => {
            Error::service_unavailable(format!("receipt storage unavailable: {message}"))
        }
        ReceiptStorageError::Write { message } => {
            Error::internal(format!("receipt write failed: {message}"))
        }
    }
}

/// Validates uploads and hands them to a [`ReceiptStorage`].
pub struct ReceiptService<S> {
    storage: Arc<S>,
}

impl<S> ReceiptService<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl<S> ReceiptCommand for ReceiptService<S>
where
    S: ReceiptStorage,
{
    async fn store_receipt(
        &self,
        requester: &UserId,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredReceipt, Error> {
        let upload = ReceiptUpload::new(content_type, bytes)
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        let stored = self
            .storage
            .store(&upload)
            .await
            .map_err(map_storage_error)?;
        info!(
            uploader = %requester,
            file = upload.file_name(),
            bytes = upload.bytes().len(),
            "receipt stored"
        );
        Ok(stored)
    }
}
