//! Actix middleware shared by every route.
//!
//! [`Trace`] assigns the per-request trace id that domain errors and log
//! spans carry.

pub mod trace;

pub use trace::Trace;
