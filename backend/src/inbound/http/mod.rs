//! HTTP inbound adapter exposing the ledger's REST endpoints.
//!
//! Every handler lives under `/api/v1` and reaches the domain only through
//! the driving ports bundled in [`state::HttpState`].

pub mod advances;
pub(crate) mod download;
pub mod error;
pub mod expenses;
pub mod health;
pub mod login;
pub mod notifications;
pub mod projects;
pub mod receipts;
pub mod reports;
pub mod schemas;
pub mod session;
pub mod state;
pub mod team;
#[cfg(test)]
pub mod test_utils;
pub mod validation;
pub mod workspace;

pub use error::ApiResult;
