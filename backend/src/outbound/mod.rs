//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed ledger and inbox using Diesel ORM
//! - **in_memory_ledger**: the same ports over process-local tables, used
//!   when no database is configured
//! - **broadcast_change_feed**: in-process fan-out of committed changes
//! - **receipt_directory**: content-addressed receipt files via `cap-std`
//! - **json_workbook**: report workbooks rendered as JSON downloads
//!
//! Adapters convert between domain types and infrastructure representations.
//! They contain no business logic.

mod broadcast_change_feed;
mod in_memory_ledger;
mod json_workbook;
pub mod persistence;
mod receipt_directory;

pub use broadcast_change_feed::{BroadcastChangeFeed, DEFAULT_FEED_CAPACITY};
pub use in_memory_ledger::InMemoryLedgerStore;
pub use json_workbook::JsonWorkbookExporter;
pub use receipt_directory::ReceiptDirectory;
