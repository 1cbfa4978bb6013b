//! In-process change feed over a Tokio broadcast channel.

use futures_util::stream;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::domain::ChangeEvent;
use crate::domain::ports::{ChangePublisher, ChangePublisherError, ChangeStream};

/// Default number of events a slow subscriber may fall behind by.
pub const DEFAULT_FEED_CAPACITY: usize = 256;

/// Fans committed changes out to every live subscriber.
///
/// Subscribers that lag past the channel capacity skip the events they
/// missed and keep receiving.
#[derive(Debug, Clone)]
pub struct BroadcastChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl BroadcastChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Number of connected subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

impl ChangePublisher for BroadcastChangeFeed {
    fn publish(&self, events: &[ChangeEvent]) -> Result<(), ChangePublisherError> {
        for event in events {
            // A send error only means nobody is listening.
            if self.sender.send(event.clone()).is_err() {
                debug!("change feed has no subscribers");
                break;
            }
        }
        Ok(())
    }

    fn subscribe(&self) -> ChangeStream {
        let receiver = self.sender.subscribe();
        Box::pin(stream::unfold(receiver, |mut receiver| async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => return Some((event, receiver)),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "change feed subscriber lagged");
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        }))
    }
}
