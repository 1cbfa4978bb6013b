//! Mock wiring shared by the ledger service tests.

use std::sync::{Arc, Mutex};

use crate::domain::ports::{
    FixtureChangePublisher, LedgerUnitOfWorkError, MockLedgerRepository, MockLedgerUnitOfWork,
};
use crate::domain::test_fixtures::{admin, engineer, fixture_clock, project, technician};
use crate::domain::{
    Advance, Expense, LedgerChangeSet, LedgerPolicy, LedgerService, LedgerSnapshot, Project,
    ProjectStatus, User,
};

pub(crate) type TestService = LedgerService<MockLedgerRepository, MockLedgerUnitOfWork>;

/// Two tenants: Noura's (engineer Faisal managing technician Tariq, one
/// active site) and Lina's, whose engineer Sami acts as an outsider.
pub(crate) struct Org {
    pub admin: User,
    pub engineer: User,
    pub technician: User,
    pub outsider_admin: User,
    pub outsider: User,
    pub site: Project,
}

pub(crate) fn org() -> Org {
    let admin = admin("Noura");
    let engineer = engineer("Faisal", &admin);
    let technician = technician("Tariq", &engineer);
    let outsider_admin = crate::domain::test_fixtures::admin("Lina");
    let outsider = crate::domain::test_fixtures::engineer("Sami", &outsider_admin);
    let site = project(&admin, ProjectStatus::Active);
    Org {
        admin,
        engineer,
        technician,
        outsider_admin,
        outsider,
        site,
    }
}

impl Org {
    pub(crate) fn snapshot(&self, advances: Vec<Advance>, expenses: Vec<Expense>) -> LedgerSnapshot {
        LedgerSnapshot {
            users: vec![
                self.admin.clone(),
                self.engineer.clone(),
                self.technician.clone(),
                self.outsider_admin.clone(),
                self.outsider.clone(),
            ],
            projects: vec![self.site.clone()],
            advances,
            expenses,
        }
    }
}

/// A read port answering every query from `snapshot`.
pub(crate) fn repo_over(snapshot: LedgerSnapshot) -> MockLedgerRepository {
    let mut repo = MockLedgerRepository::new();
    let by_id = snapshot.users.clone();
    repo.expect_find_user()
        .returning(move |id| Ok(by_id.iter().find(|user| user.id() == *id).cloned()));
    let by_email = snapshot.users.clone();
    repo.expect_find_user_by_email().returning(move |email| {
        Ok(by_email.iter().find(|user| user.email() == email).cloned())
    });
    repo.expect_load_snapshot()
        .returning(move |_| Ok(snapshot.clone()));
    repo
}

/// Change sets handed to a recording unit of work.
#[derive(Clone, Default)]
pub(crate) struct Commits(Arc<Mutex<Vec<LedgerChangeSet>>>);

impl Commits {
    /// The only committed change set.
    pub(crate) fn single(&self) -> LedgerChangeSet {
        let commits = self.0.lock().expect("commits lock");
        assert_eq!(commits.len(), 1, "expected exactly one commit");
        commits.first().cloned().expect("one commit")
    }
}

pub(crate) fn recording_unit_of_work() -> (MockLedgerUnitOfWork, Commits) {
    let commits = Commits::default();
    let sink = commits.clone();
    let mut unit_of_work = MockLedgerUnitOfWork::new();
    unit_of_work.expect_commit().returning(move |changes| {
        sink.0.lock().expect("commits lock").push(changes.clone());
        Ok(())
    });
    (unit_of_work, commits)
}

/// A unit of work that fails the test if anything is committed.
pub(crate) fn untouched_unit_of_work() -> MockLedgerUnitOfWork {
    let mut unit_of_work = MockLedgerUnitOfWork::new();
    unit_of_work.expect_commit().never();
    unit_of_work
}

pub(crate) fn failing_unit_of_work(error: LedgerUnitOfWorkError) -> MockLedgerUnitOfWork {
    let mut unit_of_work = MockLedgerUnitOfWork::new();
    unit_of_work
        .expect_commit()
        .times(1)
        .returning(move |_| Err(error.clone()));
    unit_of_work
}

pub(crate) fn service(repo: MockLedgerRepository, unit_of_work: MockLedgerUnitOfWork) -> TestService {
    service_with_policy(repo, unit_of_work, LedgerPolicy::default())
}

pub(crate) fn service_with_policy(
    repo: MockLedgerRepository,
    unit_of_work: MockLedgerUnitOfWork,
    policy: LedgerPolicy,
) -> TestService {
    LedgerService::new(
        Arc::new(repo),
        Arc::new(unit_of_work),
        Arc::new(FixtureChangePublisher),
        fixture_clock(),
        policy,
    )
}
