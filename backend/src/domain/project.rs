//! Projects owned by a tenant admin.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ProjectId, UserId};

/// Maximum length of project names and locations.
pub const PROJECT_TEXT_MAX: usize = 200;

/// Lifecycle status of a project. `Archived` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    Active,
    Archived,
}

impl ProjectStatus {
    /// Stable storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Archived => "ARCHIVED",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(Self::Active),
            "ARCHIVED" => Ok(Self::Archived),
            other => Err(format!("unknown project status: {other}")),
        }
    }
}

/// Validation errors for [`Project::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectValidationError {
    EmptyName,
    FieldTooLong { field: &'static str, max: usize },
}

impl fmt::Display for ProjectValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "project name must not be empty"),
            Self::FieldTooLong { field, max } => {
                write!(f, "project {field} must be at most {max} characters")
            }
        }
    }
}

impl std::error::Error for ProjectValidationError {}

/// Input for constructing a [`Project`].
#[derive(Debug, Clone)]
pub struct ProjectDraft {
    pub id: ProjectId,
    pub name: String,
    pub location: String,
    pub manager_id: UserId,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
}

/// A construction project that advances are issued against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    id: ProjectId,
    name: String,
    location: String,
    manager_id: UserId,
    status: ProjectStatus,
    created_at: DateTime<Utc>,
}

fn check_length(field: &'static str, value: &str) -> Result<(), ProjectValidationError> {
    if value.chars().count() > PROJECT_TEXT_MAX {
        return Err(ProjectValidationError::FieldTooLong {
            field,
            max: PROJECT_TEXT_MAX,
        });
    }
    Ok(())
}

impl Project {
    /// Validate a draft into a project.
    pub fn new(draft: ProjectDraft) -> Result<Self, ProjectValidationError> {
        let name = draft.name.trim().to_owned();
        if name.is_empty() {
            return Err(ProjectValidationError::EmptyName);
        }
        let location = draft.location.trim().to_owned();
        check_length("name", &name)?;
        check_length("location", &location)?;

        Ok(Self {
            id: draft.id,
            name,
            location,
            manager_id: draft.manager_id,
            status: draft.status,
            created_at: draft.created_at,
        })
    }

    pub fn id(&self) -> ProjectId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Owning admin.
    pub fn manager_id(&self) -> UserId {
        self.manager_id
    }

    pub fn status(&self) -> ProjectStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_active(&self) -> bool {
        self.status == ProjectStatus::Active
    }

    /// Transition to `Archived`.
    ///
    /// `open_or_pending_advances` is the number of advances on this project
    /// still OPEN or PENDING; archival is refused while any remain.
    pub fn archive(&self, open_or_pending_advances: usize) -> Result<Self, ProjectTransitionError> {
        if self.status == ProjectStatus::Archived {
            return Err(ProjectTransitionError::AlreadyArchived);
        }
        if open_or_pending_advances > 0 {
            return Err(ProjectTransitionError::OutstandingAdvances {
                count: open_or_pending_advances,
            });
        }
        Ok(Self {
            status: ProjectStatus::Archived,
            ..self.clone()
        })
    }
}

/// Reasons a project transition is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProjectTransitionError {
    #[error("project is already archived")]
    AlreadyArchived,
    #[error("project still has {count} open or pending advances")]
    OutstandingAdvances { count: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn project() -> Project {
        Project::new(ProjectDraft {
            id: ProjectId::random(),
            name: " Riyadh Tower ".to_owned(),
            location: "Riyadh".to_owned(),
            manager_id: UserId::random(),
            status: ProjectStatus::Active,
            created_at: Utc::now(),
        })
        .expect("valid project")
    }

    #[rstest]
    fn trims_name(project: Project) {
        assert_eq!(project.name(), "Riyadh Tower");
        assert!(project.is_active());
    }

    #[rstest]
    fn archive_is_blocked_by_outstanding_advances(project: Project) {
        assert_eq!(
            project.archive(2),
            Err(ProjectTransitionError::OutstandingAdvances { count: 2 })
        );
    }

    #[rstest]
    fn archive_is_terminal(project: Project) {
        let archived = project.archive(0).expect("archive");
        assert_eq!(archived.status(), ProjectStatus::Archived);
        assert_eq!(archived.archive(0), Err(ProjectTransitionError::AlreadyArchived));
    }

    #[rstest]
    fn rejects_overlong_location() {
        let result = Project::new(ProjectDraft {
            id: ProjectId::random(),
            name: "Depot".to_owned(),
            location: "x".repeat(PROJECT_TEXT_MAX + 1),
            manager_id: UserId::random(),
            status: ProjectStatus::Active,
            created_at: Utc::now(),
        });
        assert_eq!(
            result,
            Err(ProjectValidationError::FieldTooLong {
                field: "location",
                max: PROJECT_TEXT_MAX
            })
        );
    }
}
