//! Adding and removing team members.

use async_trait::async_trait;
use tracing::info;

use crate::domain::ledger_service::{
    LedgerService, Workspace, map_repository_error, map_unit_of_work_error,
};
use crate::domain::ports::{AddUserRequest, LedgerRepository, LedgerUnitOfWork, TeamCommand};
use crate::domain::{Error, LedgerChangeSet, RoleProfile, User, UserDraft, UserId, UserRole};

/// Hierarchy links for a new user of `role` created by the requester.
fn profile_for(
    workspace: &Workspace,
    role: UserRole,
    manager_id: Option<UserId>,
) -> Result<RoleProfile, Error> {
    let requester = workspace.requester();
    match (requester.profile(), role) {
        (_, UserRole::Admin) => Err(Error::forbidden("admins cannot be created by other users")),
        (RoleProfile::Admin, UserRole::Engineer) => Ok(RoleProfile::Engineer {
            root_admin_id: requester.id(),
        }),
        (RoleProfile::Admin, UserRole::Technician) => {
            let manager_id = manager_id.ok_or_else(|| {
                Error::invalid_request("a technician needs an engineer as manager")
            })?;
            let manager = workspace
                .visible_user(manager_id)
                .ok()
                .filter(|user| user.role() == UserRole::Engineer)
                .ok_or_else(|| {
                    Error::invalid_request(format!(
                        "manager {manager_id} is not an engineer in your team"
                    ))
                })?;
            Ok(RoleProfile::Technician {
                manager_id: manager.id(),
                root_admin_id: requester.id(),
            })
        }
        (RoleProfile::Engineer { root_admin_id }, UserRole::Technician) => {
            Ok(RoleProfile::Technician {
                manager_id: requester.id(),
                root_admin_id: *root_admin_id,
            })
        }
        (RoleProfile::Engineer { .. }, UserRole::Engineer) => {
            Err(Error::forbidden("engineers can only add technicians"))
        }
        (RoleProfile::Technician { .. }, _) => {
            Err(Error::forbidden("technicians cannot add users"))
        }
    }
}

#[async_trait]
impl<R, W> TeamCommand for LedgerService<R, W>
where
    R: LedgerRepository,
    W: LedgerUnitOfWork,
{
    async fn add_user(&self, request: AddUserRequest) -> Result<User, Error> {
        let workspace = self.workspace(&request.requester).await?;
        let profile = profile_for(&workspace, request.role, request.manager_id)?;
        let user = User::new(UserDraft {
            id: UserId::random(),
            name: request.name,
            email: request.email,
            profile,
            job_title: request.job_title,
            phone: request.phone,
            avatar_url: request.avatar_url,
        })
        .map_err(|err| Error::invalid_request(err.to_string()))?;

        let taken = self
            .repo()
            .find_user_by_email(user.email())
            .await
            .map_err(map_repository_error)?;
        if taken.is_some() {
            return Err(Error::conflict(format!(
                "a user with email {} already exists",
                user.email()
            )));
        }

        info!(user_id = %user.id(), role = %user.role(), "user added");
        self.commit(LedgerChangeSet::new().insert_user(user.clone()))
            .await?;
        Ok(user)
    }

    async fn delete_user(&self, requester: &UserId, target: &UserId) -> Result<(), Error> {
        if requester == target {
            return Err(Error::forbidden("you cannot delete your own account"));
        }
        let workspace = self.workspace(requester).await?;
        let user = workspace.visible_user(*target)?;

        let reports = workspace
            .snapshot()
            .users
            .iter()
            .filter(|other| other.manager_id() == Some(user.id()))
            .count();
        if reports > 0 {
            return Err(Error::conflict(format!(
                "{} still manages {reports} users",
                user.name()
            )));
        }
        let outstanding = workspace
            .snapshot()
            .advances
            .iter()
            .filter(|advance| advance.user_id() == user.id() && advance.status().is_outstanding())
            .count();
        if outstanding > 0 {
            return Err(Error::conflict(format!(
                "{} still holds {outstanding} open or pending advances",
                user.name()
            )));
        }

        info!(user_id = %user.id(), "user deleted");
        self.commit(LedgerChangeSet::new().delete_user(user.id()))
            .await
    }
}

/// Make sure the configured tenant root exists, inserting it on first start.
///
/// Admins cannot be created through [`TeamCommand`], so a fresh store gets
/// its first one here. An existing admin with the same email is returned
/// as is.
///
/// # Errors
/// `invalid_request` when `admin` is not an admin, `conflict` when the email
/// belongs to someone with another role, and the usual storage mappings.
pub async fn ensure_admin<R, W>(repo: &R, unit_of_work: &W, admin: User) -> Result<User, Error>
where
    R: LedgerRepository + ?Sized,
    W: LedgerUnitOfWork + ?Sized,
{
    if !admin.is_admin() {
        return Err(Error::invalid_request(
            "only an admin can be bootstrapped",
        ));
    }
    let existing = repo
        .find_user_by_email(admin.email())
        .await
        .map_err(map_repository_error)?;
    match existing {
        Some(user) if user.is_admin() => Ok(user),
        Some(user) => Err(Error::conflict(format!(
            "{} is already registered as {}",
            user.email(),
            user.role()
        ))),
        None => {
            unit_of_work
                .commit(&LedgerChangeSet::new().insert_user(admin.clone()))
                .await
                .map_err(map_unit_of_work_error)?;
            info!(user_id = %admin.id(), "bootstrap admin created");
            Ok(admin)
        }
    }
}

#[cfg(test)]
#[path = "team_service_tests.rs"]
mod tests;
