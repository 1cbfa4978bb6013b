//! Driving adapters for the ledger.
//!
//! [`http`] maps the JSON API onto the command and query ports; [`ws`]
//! streams change-feed reactions to signed-in clients.

pub mod http;
pub mod ws;
