//! Receipt uploads attached to expenses.

use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};

/// Largest accepted receipt body.
pub const RECEIPT_MAX_BYTES: usize = 10 * 1024 * 1024;

/// Media types accepted for receipts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReceiptContentType {
    Jpeg,
    Png,
    Webp,
    Pdf,
}

impl ReceiptContentType {
    #[must_use]
    pub const fn mime(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
            Self::Pdf => "application/pdf",
        }
    }

    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Pdf => "pdf",
        }
    }
}

impl fmt::Display for ReceiptContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

impl FromStr for ReceiptContentType {
    type Err = ReceiptValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let essence = s.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Ok(Self::Jpeg),
            "image/png" => Ok(Self::Png),
            "image/webp" => Ok(Self::Webp),
            "application/pdf" => Ok(Self::Pdf),
            _ => Err(ReceiptValidationError::UnsupportedType(essence.to_owned())),
        }
    }
}

/// Reasons an upload is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReceiptValidationError {
    #[error("receipt body is empty")]
    Empty,
    #[error("receipt exceeds {max} bytes")]
    TooLarge { max: usize },
    #[error("unsupported receipt type {0}; expected jpeg, png, webp or pdf")]
    UnsupportedType(String),
}

/// A validated receipt body, named by the SHA-256 of its content.
#[derive(Clone, PartialEq, Eq)]
pub struct ReceiptUpload {
    content_type: ReceiptContentType,
    bytes: Vec<u8>,
    file_name: String,
}

impl ReceiptUpload {
    pub fn new(content_type: &str, bytes: Vec<u8>) -> Result<Self, ReceiptValidationError> {
        let content_type = content_type.parse::<ReceiptContentType>()?;
        if bytes.is_empty() {
            return Err(ReceiptValidationError::Empty);
        }
        if bytes.len() > RECEIPT_MAX_BYTES {
            return Err(ReceiptValidationError::TooLarge {
                max: RECEIPT_MAX_BYTES,
            });
        }
        let digest = hex::encode(Sha256::digest(&bytes));
        let file_name = format!("{digest}.{}", content_type.extension());
        Ok(Self {
            content_type,
            bytes,
            file_name,
        })
    }

    pub fn content_type(&self) -> ReceiptContentType {
        self.content_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Content-addressed object name, e.g. `3a7b…e1.png`.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

impl fmt::Debug for ReceiptUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReceiptUpload")
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .field("file_name", &self.file_name)
            .finish()
    }
}
