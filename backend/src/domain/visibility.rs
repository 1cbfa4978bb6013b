//! Role-scoped projection of the ledger.
//!
//! Layers cascade: visible advances are drawn from visible projects, and
//! visible expenses from visible advances. Everything here is a pure
//! function of the requester and a [`LedgerSnapshot`].

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::{
    Advance, AdvanceId, Expense, ExpenseId, Project, ProjectId, RoleProfile, User, UserId,
};

/// Entity sets a projection is computed from.
#[derive(Debug, Clone, Default)]
pub struct LedgerSnapshot {
    pub users: Vec<User>,
    pub projects: Vec<Project>,
    pub advances: Vec<Advance>,
    pub expenses: Vec<Expense>,
}

/// Tunable visibility rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisibilityPolicy {
    /// Let admins see every project instead of only those they own.
    pub admin_sees_all_projects: bool,
}

/// The ids a requester may see.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityScope {
    projects: HashSet<ProjectId>,
    users: HashSet<UserId>,
    advances: HashSet<AdvanceId>,
    expenses: HashSet<ExpenseId>,
}

fn project_visible(requester: &User, project: &Project, policy: VisibilityPolicy) -> bool {
    match requester.profile() {
        RoleProfile::Admin => {
            policy.admin_sees_all_projects || project.manager_id() == requester.id()
        }
        RoleProfile::Engineer { .. } | RoleProfile::Technician { .. } => {
            project.is_active() && project.manager_id() == requester.tenant_root()
        }
    }
}

fn user_visible(requester: &User, user: &User) -> bool {
    if user.id() == requester.id() {
        return true;
    }
    match requester.profile() {
        RoleProfile::Admin => user.root_admin_id() == Some(requester.id()),
        RoleProfile::Engineer { .. } => {
            matches!(user.profile(), RoleProfile::Technician { manager_id, .. } if *manager_id == requester.id())
        }
        RoleProfile::Technician { .. } => false,
    }
}

fn advance_visible(
    requester: &User,
    advance: &Advance,
    owners: &HashMap<UserId, &User>,
) -> bool {
    if advance.user_id() == requester.id() {
        return true;
    }
    match requester.profile() {
        RoleProfile::Admin => true,
        // A deleted owner fails closed.
        RoleProfile::Engineer { .. } => owners
            .get(&advance.user_id())
            .is_some_and(|owner| owner.manager_id() == Some(requester.id())),
        RoleProfile::Technician { .. } => false,
    }
}

impl VisibilityScope {
    /// Compute the scope of `requester` over `snapshot`.
    pub fn compute(requester: &User, snapshot: &LedgerSnapshot, policy: VisibilityPolicy) -> Self {
        let owners: HashMap<UserId, &User> =
            snapshot.users.iter().map(|user| (user.id(), user)).collect();

        let projects: HashSet<ProjectId> = snapshot
            .projects
            .iter()
            .filter(|project| project_visible(requester, project, policy))
            .map(Project::id)
            .collect();

        let users = snapshot
            .users
            .iter()
            .filter(|user| user_visible(requester, user))
            .map(User::id)
            .collect();

        let advances: HashSet<AdvanceId> = snapshot
            .advances
            .iter()
            .filter(|advance| projects.contains(&advance.project_id()))
            .filter(|advance| advance_visible(requester, advance, &owners))
            .map(Advance::id)
            .collect();

        let expenses = snapshot
            .expenses
            .iter()
            .filter(|expense| advances.contains(&expense.advance_id()))
            .map(Expense::id)
            .collect();

        Self {
            projects,
            users,
            advances,
            expenses,
        }
    }

    pub fn can_see_project(&self, id: ProjectId) -> bool {
        self.projects.contains(&id)
    }

    pub fn can_see_user(&self, id: UserId) -> bool {
        self.users.contains(&id)
    }

    pub fn can_see_advance(&self, id: AdvanceId) -> bool {
        self.advances.contains(&id)
    }

    pub fn can_see_expense(&self, id: ExpenseId) -> bool {
        self.expenses.contains(&id)
    }
}

/// The filtered entity sets returned to a requester.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleLedger {
    pub projects: Vec<Project>,
    pub users: Vec<User>,
    pub advances: Vec<Advance>,
    pub expenses: Vec<Expense>,
}

/// Filter `snapshot` down to what `requester` may see.
///
/// # Examples
/// ```
/// use advance_ledger::domain::{
///     visible_ledger, LedgerSnapshot, RoleProfile, User, UserDraft, UserId, VisibilityPolicy,
/// };
///
/// let admin = User::new(UserDraft {
///     id: UserId::random(),
///     name: "Nadia".to_owned(),
///     email: "nadia@example.com".to_owned(),
///     profile: RoleProfile::Admin,
///     job_title: None,
///     phone: None,
///     avatar_url: None,
/// })
/// .expect("valid admin");
/// let snapshot = LedgerSnapshot {
///     users: vec![admin.clone()],
///     ..LedgerSnapshot::default()
/// };
/// let view = visible_ledger(&admin, &snapshot, VisibilityPolicy::default());
/// assert_eq!(view.users, vec![admin]);
/// ```
pub fn visible_ledger(
    requester: &User,
    snapshot: &LedgerSnapshot,
    policy: VisibilityPolicy,
) -> VisibleLedger {
    let scope = VisibilityScope::compute(requester, snapshot, policy);
    VisibleLedger {
        projects: snapshot
            .projects
            .iter()
            .filter(|project| scope.can_see_project(project.id()))
            .cloned()
            .collect(),
        users: snapshot
            .users
            .iter()
            .filter(|user| scope.can_see_user(user.id()))
            .cloned()
            .collect(),
        advances: snapshot
            .advances
            .iter()
            .filter(|advance| scope.can_see_advance(advance.id()))
            .cloned()
            .collect(),
        expenses: snapshot
            .expenses
            .iter()
            .filter(|expense| scope.can_see_expense(expense.id()))
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
#[path = "visibility_tests.rs"]
mod tests;
