//! Project creation and archival.

use async_trait::async_trait;
use tracing::info;

use crate::domain::ledger_service::LedgerService;
use crate::domain::ports::{
    CreateProjectRequest, LedgerRepository, LedgerUnitOfWork, ProjectCommand,
};
use crate::domain::{
    Error, LedgerChangeSet, Project, ProjectDraft, ProjectId, ProjectStatus,
    ProjectTransitionError, UserId,
};

#[async_trait]
impl<R, W> ProjectCommand for LedgerService<R, W>
where
    R: LedgerRepository,
    W: LedgerUnitOfWork,
{
    async fn create_project(&self, request: CreateProjectRequest) -> Result<Project, Error> {
        let workspace = self.workspace(&request.requester).await?;
        let requester = workspace.requester();
        if !requester.is_admin() {
            return Err(Error::forbidden("only admins can create projects"));
        }
        let project = Project::new(ProjectDraft {
            id: ProjectId::random(),
            name: request.name,
            location: request.location,
            manager_id: requester.id(),
            status: ProjectStatus::Active,
            created_at: self.now(),
        })
        .map_err(|err| Error::invalid_request(err.to_string()))?;

        info!(project_id = %project.id(), "project created");
        self.commit(LedgerChangeSet::new().insert_project(project.clone()))
            .await?;
        Ok(project)
    }

    async fn archive_project(
        &self,
        requester: &UserId,
        project_id: &ProjectId,
    ) -> Result<Project, Error> {
        let workspace = self.workspace(requester).await?;
        let project = workspace.visible_project(*project_id)?;
        if project.manager_id() != *requester {
            return Err(Error::forbidden("only the owning admin can archive a project"));
        }
        let outstanding = workspace
            .snapshot()
            .advances
            .iter()
            .filter(|advance| advance.project_id() == project.id())
            .filter(|advance| advance.status().is_outstanding())
            .count();
        let archived = project.archive(outstanding).map_err(|err| match err {
            ProjectTransitionError::AlreadyArchived
            | ProjectTransitionError::OutstandingAdvances { .. } => {
                Error::conflict(err.to_string())
            }
        })?;

        info!(project_id = %archived.id(), "project archived");
        self.commit(LedgerChangeSet::new().update_project(project, archived.clone()))
            .await?;
        Ok(archived)
    }
}

#[cfg(test)]
#[path = "project_service_tests.rs"]
mod tests;
