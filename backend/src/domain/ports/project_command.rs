//! Driving port for project creation and archival.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Error, Project, ProjectId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub requester: UserId,
    pub name: String,
    pub location: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectCommand: Send + Sync {
    async fn create_project(&self, request: CreateProjectRequest) -> Result<Project, Error>;

    async fn archive_project(
        &self,
        requester: &UserId,
        project_id: &ProjectId,
    ) -> Result<Project, Error>;
}
