//! Per-viewer change feed.
//!
//! Each watcher keeps the visibility scope it last computed. On every event
//! the scope is recomputed from the store and [`react`] is given both, so a
//! record entering or leaving the viewer's slice is still delivered once.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream;
use tracing::{debug, warn};

use crate::domain::ledger_service::load_workspace;
use crate::domain::ports::{
    ChangeFeedQuery, ChangePublisher, ChangeStream, LedgerRepository, ReactionStream,
};
use crate::domain::{
    ChangeEvent, ChangeSubject, ClientReaction, Error, ErrorCode, LedgerPolicy, UserId,
    VisibilityScope, react,
};

/// Filters the shared change feed down to what each viewer may see.
pub struct ChangeFeedService<R> {
    repo: Arc<R>,
    publisher: Arc<dyn ChangePublisher>,
    policy: LedgerPolicy,
}

impl<R> ChangeFeedService<R> {
    pub fn new(repo: Arc<R>, publisher: Arc<dyn ChangePublisher>, policy: LedgerPolicy) -> Self {
        Self {
            repo,
            publisher,
            policy,
        }
    }
}

struct Watch<R> {
    repo: Arc<R>,
    viewer: UserId,
    policy: LedgerPolicy,
    events: ChangeStream,
    scope: VisibilityScope,
}

enum Refresh {
    Scope(VisibilityScope),
    ViewerGone,
}

impl<R> Watch<R>
where
    R: LedgerRepository,
{
    /// Takes its inputs by value or shared reference so the change stream
    /// is never borrowed across the repository call.
    async fn refresh(
        repo: &R,
        viewer: UserId,
        policy: LedgerPolicy,
        current: &VisibilityScope,
        event: &ChangeEvent,
    ) -> Refresh {
        // Inbox events are routed by recipient, not by scope.
        if matches!(event.subject(), ChangeSubject::Notification { .. }) {
            return Refresh::Scope(current.clone());
        }
        match load_workspace(repo, &viewer, policy).await {
            Ok(workspace) => Refresh::Scope(workspace.into_scope()),
            Err(err) if err.code() == ErrorCode::Unauthorized => Refresh::ViewerGone,
            Err(err) => {
                warn!(viewer = %viewer, error = %err, "keeping stale scope for change feed");
                Refresh::Scope(current.clone())
            }
        }
    }

    async fn next_reaction(mut self) -> Option<(ClientReaction, Self)> {
        loop {
            let event = self.events.next().await?;
            let refreshed = Self::refresh(
                self.repo.as_ref(),
                self.viewer,
                self.policy,
                &self.scope,
                &event,
            )
            .await;
            let after = match refreshed {
                Refresh::Scope(scope) => scope,
                Refresh::ViewerGone => {
                    debug!(viewer = %self.viewer, "viewer deleted; ending change feed");
                    return None;
                }
            };
            let reaction = react(&event, self.viewer, &self.scope, &after);
            self.scope = after;
            if let Some(reaction) = reaction {
                return Some((reaction, self));
            }
        }
    }
}

#[async_trait]
impl<R> ChangeFeedQuery for ChangeFeedService<R>
where
    R: LedgerRepository + 'static,
{
    async fn watch(&self, viewer: &UserId) -> Result<ReactionStream, Error> {
        // Subscribe before reading so no commit falls between the two.
        let events = self.publisher.subscribe();
        let workspace = load_workspace(self.repo.as_ref(), viewer, self.policy).await?;
        let watch = Watch {
            repo: Arc::clone(&self.repo),
            viewer: *viewer,
            policy: self.policy,
            events,
            scope: workspace.into_scope(),
        };
        debug!(viewer = %viewer, "change feed watch started");
        Ok(Box::pin(stream::unfold(watch, Watch::next_reaction)))
    }
}
