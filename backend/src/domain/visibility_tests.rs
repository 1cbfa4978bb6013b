//! Coverage for the role-scoped projection.

use super::*;
use crate::domain::test_fixtures::{admin, advance, engineer, expense, project, technician};
use crate::domain::{AdvanceStatus, ProjectStatus};
use rstest::{fixture, rstest};

struct Tenant {
    admin: User,
    engineer: User,
    technician: User,
    other_engineer_tech: User,
    other_engineer: User,
    project: Project,
    archived: Project,
    tech_advance: Advance,
    engineer_advance: Advance,
    peer_advance: Advance,
    snapshot: LedgerSnapshot,
}

#[fixture]
fn tenant() -> Tenant {
    let admin = admin("Huda");
    // Fixture helpers share names with the locals, so each is called before
    // its name is rebound.
    let other_engineer = engineer("Layla", &admin);
    let engineer = engineer("Omar", &admin);
    let other_engineer_tech = technician("Yousef", &other_engineer);
    let technician = technician("Sami", &engineer);
    let archived = project(&admin, ProjectStatus::Archived);
    let project = project(&admin, ProjectStatus::Active);
    let tech_advance = advance(&project, &technician, 1_000, AdvanceStatus::Open);
    let engineer_advance = advance(&project, &engineer, 2_000, AdvanceStatus::Pending);
    let peer_advance = advance(&project, &other_engineer_tech, 3_000, AdvanceStatus::Open);
    let snapshot = LedgerSnapshot {
        users: vec![
            admin.clone(),
            engineer.clone(),
            other_engineer.clone(),
            technician.clone(),
            other_engineer_tech.clone(),
        ],
        projects: vec![project.clone(), archived.clone()],
        advances: vec![
            tech_advance.clone(),
            engineer_advance.clone(),
            peer_advance.clone(),
        ],
        expenses: vec![expense(&tech_advance, 100), expense(&peer_advance, 200)],
    };
    Tenant {
        admin,
        engineer,
        technician,
        other_engineer_tech,
        other_engineer,
        project,
        archived,
        tech_advance,
        engineer_advance,
        peer_advance,
        snapshot,
    }
}

fn ids<T, I: Copy + Ord>(items: &[T], id: impl Fn(&T) -> I) -> Vec<I> {
    let mut out: Vec<I> = items.iter().map(id).collect();
    out.sort();
    out
}

#[rstest]
fn admin_sees_owned_projects_and_whole_tenant(tenant: Tenant) {
    let view = visible_ledger(&tenant.admin, &tenant.snapshot, VisibilityPolicy::default());
    assert_eq!(view.projects.len(), 2);
    assert_eq!(view.users.len(), 5);
    assert_eq!(view.advances.len(), 3);
    assert_eq!(view.expenses.len(), 2);
}

#[rstest]
fn engineer_sees_own_and_managed_advances_only(tenant: Tenant) {
    let view = visible_ledger(&tenant.engineer, &tenant.snapshot, VisibilityPolicy::default());
    assert_eq!(ids(&view.projects, Project::id), vec![tenant.project.id()]);
    assert_eq!(
        ids(&view.users, User::id),
        ids(&[tenant.engineer.clone(), tenant.technician.clone()], User::id)
    );
    assert_eq!(
        ids(&view.advances, Advance::id),
        ids(
            &[tenant.tech_advance.clone(), tenant.engineer_advance.clone()],
            Advance::id
        )
    );
    assert_eq!(view.expenses.len(), 1);
    assert_eq!(view.expenses[0].advance_id(), tenant.tech_advance.id());
}

#[rstest]
fn technician_sees_only_self(tenant: Tenant) {
    let view = visible_ledger(&tenant.technician, &tenant.snapshot, VisibilityPolicy::default());
    assert_eq!(ids(&view.users, User::id), vec![tenant.technician.id()]);
    assert_eq!(ids(&view.advances, Advance::id), vec![tenant.tech_advance.id()]);
    assert!(!view.projects.iter().any(|p| p.id() == tenant.archived.id()));
}

#[rstest]
fn engineer_cannot_see_peer_team_even_by_id(tenant: Tenant) {
    let scope = VisibilityScope::compute(
        &tenant.engineer,
        &tenant.snapshot,
        VisibilityPolicy::default(),
    );
    assert!(!scope.can_see_advance(tenant.peer_advance.id()));
    assert!(!scope.can_see_user(tenant.other_engineer_tech.id()));
    assert!(!scope.can_see_user(tenant.other_engineer.id()));
}

#[rstest]
fn deleted_owner_fails_closed_for_engineer(mut tenant: Tenant) {
    let technician_id = tenant.technician.id();
    tenant.snapshot.users.retain(|user| user.id() != technician_id);
    let scope = VisibilityScope::compute(
        &tenant.engineer,
        &tenant.snapshot,
        VisibilityPolicy::default(),
    );
    assert!(!scope.can_see_advance(tenant.tech_advance.id()));
    assert!(scope.can_see_advance(tenant.engineer_advance.id()));
}

#[rstest]
fn engineer_outside_tenant_sees_nothing_of_it(tenant: Tenant) {
    let foreign_admin = admin("Karim");
    let outsider = engineer("Rana", &foreign_admin);
    let mut snapshot = tenant.snapshot.clone();
    snapshot.users.push(outsider.clone());
    let view = visible_ledger(&outsider, &snapshot, VisibilityPolicy::default());
    assert!(view.projects.is_empty());
    assert!(view.advances.is_empty());
    assert!(view.expenses.is_empty());
    assert_eq!(ids(&view.users, User::id), vec![outsider.id()]);
}

#[rstest]
fn relaxed_policy_shows_admin_every_project(tenant: Tenant) {
    let foreign_admin = admin("Karim");
    let foreign = project(&foreign_admin, ProjectStatus::Active);
    let mut snapshot = tenant.snapshot.clone();
    snapshot.projects.push(foreign.clone());
    let strict = VisibilityScope::compute(&tenant.admin, &snapshot, VisibilityPolicy::default());
    assert!(!strict.can_see_project(foreign.id()));
    let relaxed = VisibilityScope::compute(
        &tenant.admin,
        &snapshot,
        VisibilityPolicy {
            admin_sees_all_projects: true,
        },
    );
    assert!(relaxed.can_see_project(foreign.id()));
}
