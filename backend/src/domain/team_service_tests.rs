//! Tests for team management.

use rstest::rstest;

use super::*;
use crate::domain::ledger_test_helpers::{
    org, recording_unit_of_work, repo_over, service, untouched_unit_of_work,
};
use crate::domain::test_fixtures::advance;
use crate::domain::{AdvanceStatus, ErrorCode, LedgerSnapshot, UserWrite};

fn add(requester: UserId, role: UserRole, manager_id: Option<UserId>) -> AddUserRequest {
    AddUserRequest {
        requester,
        name: "Hala Mansour".to_owned(),
        email: "Hala@Example.com".to_owned(),
        role,
        manager_id,
        job_title: Some("Surveyor".to_owned()),
        phone: None,
        avatar_url: None,
    }
}

#[tokio::test]
async fn admin_adds_an_engineer_reporting_to_them() {
    let org = org();
    let (unit_of_work, commits) = recording_unit_of_work();
    let service = service(repo_over(org.snapshot(vec![], vec![])), unit_of_work);

    let user = service
        .add_user(add(org.admin.id(), UserRole::Engineer, None))
        .await
        .expect("added");

    assert_eq!(user.role(), UserRole::Engineer);
    assert_eq!(user.manager_id(), Some(org.admin.id()));
    assert_eq!(user.root_admin_id(), Some(org.admin.id()));
    assert_eq!(user.email(), "hala@example.com");
    assert!(matches!(commits.single().users(), [UserWrite::Insert(_)]));
}

#[tokio::test]
async fn admin_adds_a_technician_under_a_named_engineer() {
    let org = org();
    let (unit_of_work, _commits) = recording_unit_of_work();
    let service = service(repo_over(org.snapshot(vec![], vec![])), unit_of_work);

    let user = service
        .add_user(add(
            org.admin.id(),
            UserRole::Technician,
            Some(org.engineer.id()),
        ))
        .await
        .expect("added");

    assert_eq!(user.manager_id(), Some(org.engineer.id()));
    assert_eq!(user.root_admin_id(), Some(org.admin.id()));
}

#[tokio::test]
async fn engineer_adds_a_technician_under_themselves() {
    let org = org();
    let (unit_of_work, _commits) = recording_unit_of_work();
    let service = service(repo_over(org.snapshot(vec![], vec![])), unit_of_work);

    let user = service
        .add_user(add(org.engineer.id(), UserRole::Technician, None))
        .await
        .expect("added");

    assert_eq!(user.manager_id(), Some(org.engineer.id()));
    assert_eq!(user.tenant_root(), org.admin.id());
}

#[rstest]
#[case::technician_adds_anyone(UserRole::Technician, "technician", ErrorCode::Forbidden)]
#[case::engineer_adds_engineer(UserRole::Engineer, "engineer", ErrorCode::Forbidden)]
#[case::admin_adds_admin(UserRole::Admin, "admin", ErrorCode::Forbidden)]
#[tokio::test]
async fn role_limits_who_can_be_added(
    #[case] role: UserRole,
    #[case] requester: &str,
    #[case] expected: ErrorCode,
) {
    let org = org();
    let requester = match requester {
        "technician" => org.technician.id(),
        "engineer" => org.engineer.id(),
        _ => org.admin.id(),
    };
    let service = service(
        repo_over(org.snapshot(vec![], vec![])),
        untouched_unit_of_work(),
    );

    let err = service
        .add_user(add(requester, role, None))
        .await
        .expect_err("refused");

    assert_eq!(err.code(), expected);
}

#[rstest]
#[case::missing_manager(None)]
#[case::manager_is_a_technician(Some(1))]
#[case::manager_from_another_tenant(Some(2))]
#[tokio::test]
async fn admin_needs_a_valid_engineer_for_a_technician(#[case] manager: Option<u8>) {
    let org = org();
    let manager_id = manager.map(|which| match which {
        1 => org.technician.id(),
        _ => org.outsider.id(),
    });
    let service = service(
        repo_over(org.snapshot(vec![], vec![])),
        untouched_unit_of_work(),
    );

    let err = service
        .add_user(add(org.admin.id(), UserRole::Technician, manager_id))
        .await
        .expect_err("invalid manager");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn email_addresses_are_unique() {
    let org = org();
    let service = service(
        repo_over(org.snapshot(vec![], vec![])),
        untouched_unit_of_work(),
    );

    let err = service
        .add_user(AddUserRequest {
            email: org.outsider.email().to_uppercase(),
            ..add(org.admin.id(), UserRole::Engineer, None)
        })
        .await
        .expect_err("duplicate email");

    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[tokio::test]
async fn malformed_email_is_invalid() {
    let org = org();
    let service = service(
        repo_over(org.snapshot(vec![], vec![])),
        untouched_unit_of_work(),
    );

    let err = service
        .add_user(AddUserRequest {
            email: "not-an-email".to_owned(),
            ..add(org.admin.id(), UserRole::Engineer, None)
        })
        .await
        .expect_err("bad email");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn engineer_removes_an_idle_technician() {
    let org = org();
    let (unit_of_work, commits) = recording_unit_of_work();
    let service = service(repo_over(org.snapshot(vec![], vec![])), unit_of_work);

    service
        .delete_user(&org.engineer.id(), &org.technician.id())
        .await
        .expect("deleted");

    assert_eq!(
        commits.single().users(),
        &[UserWrite::Delete(org.technician.id())]
    );
}

#[tokio::test]
async fn nobody_deletes_themselves() {
    let org = org();
    let service = service(
        repo_over(org.snapshot(vec![], vec![])),
        untouched_unit_of_work(),
    );

    let err = service
        .delete_user(&org.admin.id(), &org.admin.id())
        .await
        .expect_err("self deletion");

    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn engineer_with_reports_cannot_be_deleted() {
    let org = org();
    let service = service(
        repo_over(org.snapshot(vec![], vec![])),
        untouched_unit_of_work(),
    );

    let err = service
        .delete_user(&org.admin.id(), &org.engineer.id())
        .await
        .expect_err("still manages Tariq");

    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[tokio::test]
async fn holder_of_an_open_advance_cannot_be_deleted() {
    let org = org();
    let open = advance(&org.site, &org.technician, 100, AdvanceStatus::Open);
    let service = service(
        repo_over(org.snapshot(vec![open], vec![])),
        untouched_unit_of_work(),
    );

    let err = service
        .delete_user(&org.admin.id(), &org.technician.id())
        .await
        .expect_err("advance outstanding");

    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[tokio::test]
async fn users_outside_the_tenant_are_not_found() {
    let org = org();
    let service = service(
        repo_over(org.snapshot(vec![], vec![])),
        untouched_unit_of_work(),
    );

    let err = service
        .delete_user(&org.admin.id(), &org.outsider.id())
        .await
        .expect_err("other tenant");

    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn bootstrap_inserts_a_missing_admin() {
    let (unit_of_work, commits) = recording_unit_of_work();
    let repo = repo_over(LedgerSnapshot::default());
    let root = crate::domain::test_fixtures::admin("Noura");

    let created = ensure_admin(&repo, &unit_of_work, root.clone())
        .await
        .expect("bootstrapped");

    assert_eq!(created, root);
    assert!(matches!(commits.single().users(), [UserWrite::Insert(_)]));
}

#[tokio::test]
async fn bootstrap_keeps_an_existing_admin() {
    let org = org();
    let repo = repo_over(org.snapshot(vec![], vec![]));
    let again = crate::domain::test_fixtures::admin("Noura");
    assert_ne!(again.id(), org.admin.id());

    let kept = ensure_admin(&repo, &untouched_unit_of_work(), again)
        .await
        .expect("already there");

    assert_eq!(kept.id(), org.admin.id());
}

#[rstest]
#[case::non_admin_input(true)]
#[case::email_taken_by_engineer(false)]
#[tokio::test]
async fn bootstrap_refuses_anything_but_an_admin(#[case] engineer_input: bool) {
    let org = org();
    let repo = repo_over(org.snapshot(vec![], vec![]));
    let candidate = if engineer_input {
        org.engineer.clone()
    } else {
        User::new(UserDraft {
            id: UserId::random(),
            name: "Faisal".to_owned(),
            email: org.engineer.email().to_owned(),
            profile: RoleProfile::Admin,
            job_title: None,
            phone: None,
            avatar_url: None,
        })
        .expect("valid admin")
    };

    let err = ensure_admin(&repo, &untouched_unit_of_work(), candidate)
        .await
        .expect_err("refused");

    let expected = if engineer_input {
        ErrorCode::InvalidRequest
    } else {
        ErrorCode::Conflict
    };
    assert_eq!(err.code(), expected);
}
