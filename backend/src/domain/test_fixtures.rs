//! Builders for domain values used across unit tests.

use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use mockable::Clock;
use rust_decimal::Decimal;

use super::{
    Advance, AdvanceDraft, AdvanceId, AdvanceStatus, Amount, Expense, ExpenseBreakdownDraft,
    ExpenseContent, ExpenseDraft, ExpenseId, Project, ProjectDraft, ProjectId, ProjectStatus,
    RoleProfile, User, UserDraft, UserId,
};

pub(crate) fn amount(units: i64) -> Amount {
    Amount::new(Decimal::from(units)).expect("valid amount")
}

pub(crate) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 4, 1).expect("valid date")
}

/// Clock pinned to noon on [`today`].
pub(crate) struct FixtureClock;

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0)
            .single()
            .expect("valid fixture timestamp")
    }
}

pub(crate) fn fixture_clock() -> Arc<dyn Clock> {
    Arc::new(FixtureClock)
}

fn user(name: &str, profile: RoleProfile) -> User {
    User::new(UserDraft {
        id: UserId::random(),
        name: name.to_owned(),
        email: format!("{}@example.com", name.to_lowercase()),
        profile,
        job_title: None,
        phone: None,
        avatar_url: None,
    })
    .expect("valid user")
}

pub(crate) fn admin(name: &str) -> User {
    user(name, RoleProfile::Admin)
}

pub(crate) fn engineer(name: &str, admin: &User) -> User {
    user(
        name,
        RoleProfile::Engineer {
            root_admin_id: admin.id(),
        },
    )
}

pub(crate) fn technician(name: &str, engineer: &User) -> User {
    user(
        name,
        RoleProfile::Technician {
            manager_id: engineer.id(),
            root_admin_id: engineer.tenant_root(),
        },
    )
}

pub(crate) fn project(owner: &User, status: ProjectStatus) -> Project {
    Project::new(ProjectDraft {
        id: ProjectId::random(),
        name: "Harbour Depot".to_owned(),
        location: "Jeddah".to_owned(),
        manager_id: owner.id(),
        status,
        created_at: Utc::now(),
    })
    .expect("valid project")
}

pub(crate) fn advance(project: &Project, holder: &User, units: i64, status: AdvanceStatus) -> Advance {
    let pending = Advance::issue(
        AdvanceDraft {
            id: AdvanceId::random(),
            project_id: project.id(),
            user_id: holder.id(),
            created_by: holder.id(),
            amount: amount(units),
            description: "Site float".to_owned(),
            date: today(),
        },
        AdvanceStatus::Pending,
    )
    .expect("valid advance");
    match status {
        AdvanceStatus::Pending => pending,
        AdvanceStatus::Open => pending.approve().expect("approve"),
        AdvanceStatus::Rejected => pending.reject("not needed").expect("reject"),
        AdvanceStatus::Closed => panic!("build closed advances through settlement"),
    }
}

pub(crate) fn fixed_content(units: i64) -> ExpenseContent {
    ExpenseContent {
        description: "Fuel".to_owned(),
        notes: None,
        image_url: None,
        breakdown: ExpenseBreakdownDraft::Fixed {
            base_amount: amount(units),
        },
        additional_amount: Amount::ZERO,
    }
}

pub(crate) fn expense(advance: &Advance, units: i64) -> Expense {
    Expense::submit(ExpenseDraft {
        id: ExpenseId::random(),
        advance_id: advance.id(),
        user_id: advance.user_id(),
        date: today(),
        content: fixed_content(units),
    })
    .expect("valid expense")
}
