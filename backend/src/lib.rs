//! Cash-advance ledger for project teams.
//!
//! The crate follows a hexagonal layout:
//! - [`domain`]: entities, state machines, services and the ports they use
//! - [`inbound`]: HTTP and WebSocket adapters driving the domain
//! - [`outbound`]: PostgreSQL, in-memory, change-feed, receipt and export
//!   adapters implementing the driven ports

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
