//! Driving port for a client's live view of ledger changes.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

use crate::domain::{ClientReaction, Error, UserId};

/// Reactions addressed to one viewer, in commit order.
pub type ReactionStream = Pin<Box<dyn Stream<Item = ClientReaction> + Send>>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChangeFeedQuery: Send + Sync {
    /// Start watching on behalf of `viewer`.
    ///
    /// The stream ends when the feed closes or the viewer is deleted.
    async fn watch(&self, viewer: &UserId) -> Result<ReactionStream, Error>;
}
