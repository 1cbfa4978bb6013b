//! Port for broadcasting committed changes to connected clients.

use std::pin::Pin;

use futures_util::Stream;

use crate::domain::ChangeEvent;

use super::define_port_error;

define_port_error! {
    /// Errors raised when a change cannot be broadcast.
    pub enum ChangePublisherError {
        /// The feed is shut down.
        Closed { message: String } => "change feed closed: {message}",
    }
}

/// Stream of events delivered to one subscriber.
pub type ChangeStream = Pin<Box<dyn Stream<Item = ChangeEvent> + Send>>;

/// Fan-out of [`ChangeEvent`]s.
///
/// Having no subscribers is not an error.
#[cfg_attr(test, mockall::automock)]
pub trait ChangePublisher: Send + Sync {
    fn publish(&self, events: &[ChangeEvent]) -> Result<(), ChangePublisherError>;

    /// Events published after this call.
    fn subscribe(&self) -> ChangeStream;
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureChangePublisher;

impl ChangePublisher for FixtureChangePublisher {
    fn publish(&self, _events: &[ChangeEvent]) -> Result<(), ChangePublisherError> {
        Ok(())
    }

    fn subscribe(&self) -> ChangeStream {
        Box::pin(futures_util::stream::empty())
    }
}
