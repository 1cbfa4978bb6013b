//! Driving port for the role-scoped workspace view.

use async_trait::async_trait;

use crate::domain::{Error, UserId, VisibleLedger};

/// Read the projects, users, advances and expenses a user may see.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorkspaceQuery: Send + Sync {
    async fn visible_workspace(&self, requester: &UserId) -> Result<VisibleLedger, Error>;
}
