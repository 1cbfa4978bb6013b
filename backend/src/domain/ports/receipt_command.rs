//! Driving port for receipt uploads.

use async_trait::async_trait;

use super::StoredReceipt;
use crate::domain::{Error, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReceiptCommand: Send + Sync {
    /// Validate and store a receipt, returning its public URL.
    async fn store_receipt(
        &self,
        requester: &UserId,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredReceipt, Error>;
}
