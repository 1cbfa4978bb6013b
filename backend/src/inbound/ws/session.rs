//! Per-connection change-feed pump.
//!
//! Forwards the viewer's reactions as JSON text frames while keeping
//! heartbeats at the edge. The public contract pings every 5s and considers
//! a connection idle after 10s without client traffic; tests shorten both.

use std::time::{Duration, Instant};

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use futures_util::StreamExt;
use tokio::time;
use tracing::{debug, warn};

use crate::domain::UserId;
use crate::domain::ports::ReactionStream;
use crate::inbound::ws::messages::ChangeFrame;

/// Time between heartbeats to the client.
#[cfg(not(test))]
pub(super) const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
pub(super) const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

/// Max idle time before disconnecting the client.
#[cfg(not(test))]
pub(super) const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
pub(super) const CLIENT_TIMEOUT: Duration = Duration::from_millis(100);

pub(super) async fn run_change_feed(
    viewer: UserId,
    reactions: ReactionStream,
    session: Session,
    stream: MessageStream,
) {
    FeedSession { viewer, reactions }.run(session, stream).await;
}

enum SessionError {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    FeedClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    Network(Closed),
}

struct FeedSession {
    viewer: UserId,
    reactions: ReactionStream,
}

impl FeedSession {
    async fn run(mut self, mut session: Session, mut stream: MessageStream) {
        let mut last_heartbeat = Instant::now();
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);

        loop {
            let result = tokio::select! {
                _ = heartbeat.tick() => {
                    Self::heartbeat(&mut session, last_heartbeat).await
                }
                message = stream.recv() => {
                    Self::client_message(&mut session, &mut last_heartbeat, message).await
                }
                reaction = self.reactions.next() => match reaction {
                    Some(reaction) => send_json(&mut session, &ChangeFrame::from(reaction))
                        .await
                        .map_err(SessionError::Network),
                    None => Err(SessionError::FeedClosed),
                },
            };

            if let Err(error) = result {
                self.log_shutdown(&error);
                close(session, close_reason(error)).await;
                return;
            }
        }
    }

    async fn heartbeat(session: &mut Session, last_heartbeat: Instant) -> Result<(), SessionError> {
        if Instant::now().duration_since(last_heartbeat) > CLIENT_TIMEOUT {
            return Err(SessionError::HeartbeatTimeout);
        }
        session.ping(b"").await.map_err(SessionError::Network)
    }

    async fn client_message(
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Option<Result<Message, ProtocolError>>,
    ) -> Result<(), SessionError> {
        let Some(message) = message else {
            return Err(SessionError::StreamClosed);
        };
        match message.map_err(SessionError::Protocol)? {
            Message::Ping(payload) => {
                *last_heartbeat = Instant::now();
                session.pong(&payload).await.map_err(SessionError::Network)
            }
            // The feed is one-way; client frames only count as liveness.
            Message::Text(_)
            | Message::Binary(_)
            | Message::Pong(_)
            | Message::Continuation(_)
            | Message::Nop => {
                *last_heartbeat = Instant::now();
                Ok(())
            }
            Message::Close(reason) => Err(SessionError::ClientClosed(reason)),
        }
    }

    fn log_shutdown(&self, error: &SessionError) {
        match error {
            SessionError::HeartbeatTimeout => {
                warn!(viewer = %self.viewer, "change feed heartbeat timeout; closing connection");
            }
            SessionError::Protocol(error) => {
                warn!(viewer = %self.viewer, error = %error, "change feed protocol error");
            }
            SessionError::Network(error) => {
                warn!(viewer = %self.viewer, error = %error, "change feed send failed");
            }
            SessionError::FeedClosed => {
                debug!(viewer = %self.viewer, "change feed ended");
            }
            SessionError::ClientClosed(_) | SessionError::StreamClosed => {
                debug!(viewer = %self.viewer, "change feed client disconnected");
            }
        }
    }
}

async fn send_json<T: serde::Serialize>(session: &mut Session, payload: &T) -> Result<(), Closed> {
    match serde_json::to_string(payload) {
        Ok(body) => session.text(body).await,
        Err(error) => {
            warn!(error = %error, "failed to serialise change frame");
            Ok(())
        }
    }
}

/// `None` means the transport is already gone and no close frame is sent.
fn close_reason(error: SessionError) -> Option<Option<CloseReason>> {
    let reason = |code, description: &str| {
        Some(Some(CloseReason {
            code,
            description: Some(description.to_owned()),
        }))
    };
    match error {
        SessionError::HeartbeatTimeout => reason(CloseCode::Normal, "heartbeat timeout"),
        SessionError::FeedClosed => reason(CloseCode::Away, "change feed closed"),
        SessionError::Protocol(_) => reason(CloseCode::Protocol, "protocol error"),
        SessionError::ClientClosed(reason) => Some(reason),
        SessionError::StreamClosed | SessionError::Network(_) => None,
    }
}

async fn close(session: Session, reason: Option<Option<CloseReason>>) {
    let Some(reason) = reason else {
        return;
    };
    if let Err(error) = session.close(reason).await {
        warn!(error = %error, "failed to close change feed session");
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
