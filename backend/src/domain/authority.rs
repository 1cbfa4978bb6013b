//! Who may act on whose advances and expenses.
//!
//! These checks are pure predicates over the hierarchy links carried by
//! [`RoleProfile`]. Services consult them after confirming the target is
//! visible to the requester.

use super::{AdvanceStatus, Expense, RoleProfile, User, UserId};

/// Creation-time routing options for new advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FundingPolicy {
    /// Open advances an engineer issues to a technician they manage
    /// immediately instead of routing them to the admin.
    pub engineer_direct_funding: bool,
}

impl Default for FundingPolicy {
    fn default() -> Self {
        Self {
            engineer_direct_funding: true,
        }
    }
}

/// Whether `approver` may approve or reject requests owned by `owner_id`.
///
/// `owner` is the owner's record when it still exists. Self approval is
/// always refused, and a missing owner record refuses everyone.
///
/// # Examples
/// ```
/// use advance_ledger::domain::{has_approval_authority, RoleProfile, User, UserDraft, UserId};
///
/// let draft = |name: &str, profile| UserDraft {
///     id: UserId::random(),
///     name: name.to_owned(),
///     email: format!("{name}@example.com"),
///     profile,
///     job_title: None,
///     phone: None,
///     avatar_url: None,
/// };
/// let admin = User::new(draft("ava", RoleProfile::Admin)).expect("admin");
/// let engineer = User::new(draft(
///     "eli",
///     RoleProfile::Engineer { root_admin_id: admin.id() },
/// ))
/// .expect("engineer");
///
/// assert!(has_approval_authority(&admin, engineer.id(), Some(&engineer)));
/// assert!(!has_approval_authority(&engineer, engineer.id(), Some(&engineer)));
/// ```
pub fn has_approval_authority(approver: &User, owner_id: UserId, owner: Option<&User>) -> bool {
    if approver.id() == owner_id {
        return false;
    }
    let Some(owner) = owner else {
        return false;
    };
    match approver.profile() {
        RoleProfile::Admin => match owner.profile() {
            RoleProfile::Admin | RoleProfile::Engineer { .. } => true,
            RoleProfile::Technician { manager_id, .. } => *manager_id == approver.id(),
        },
        RoleProfile::Engineer { .. } => matches!(
            owner.profile(),
            RoleProfile::Technician { manager_id, .. } if *manager_id == approver.id()
        ),
        RoleProfile::Technician { .. } => false,
    }
}

/// Whether `creator` may issue an advance to `beneficiary`.
pub fn can_fund(creator: &User, beneficiary: &User) -> bool {
    if creator.id() == beneficiary.id() {
        return true;
    }
    match creator.profile() {
        RoleProfile::Admin => beneficiary.root_admin_id() == Some(creator.id()),
        RoleProfile::Engineer { .. } => beneficiary.manager_id() == Some(creator.id()),
        RoleProfile::Technician { .. } => false,
    }
}

/// Status a new advance starts in.
pub fn initial_advance_status(
    creator: &User,
    beneficiary: &User,
    policy: FundingPolicy,
) -> AdvanceStatus {
    match creator.profile() {
        RoleProfile::Admin => AdvanceStatus::Open,
        RoleProfile::Engineer { .. }
            if creator.id() != beneficiary.id() && policy.engineer_direct_funding =>
        {
            AdvanceStatus::Open
        }
        RoleProfile::Engineer { .. } | RoleProfile::Technician { .. } => AdvanceStatus::Pending,
    }
}

/// Whether `requester` may change the content of `expense`.
pub fn can_edit_expense(requester: &User, expense: &Expense) -> bool {
    expense.user_id() == requester.id() && expense.is_content_editable()
}
