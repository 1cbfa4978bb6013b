//! Settlement arithmetic for closing an advance.
//!
//! ```text
//! approved    = sum(amount of APPROVED expenses on the advance)
//! theoretical = advance.amount - approved
//! deficit     = theoretical - returned_cash
//! ```
//!
//! A positive deficit is carried forward into a new OPEN advance. Zero or
//! negative deficits close the advance without a follow-on.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::money::round_cents;
use super::{
    Advance, AdvanceTransitionError, AdvanceValidationError, Amount, AmountError, Expense,
    ExpenseStatus, SettlementData,
};

/// Maximum length of settlement notes.
pub const SETTLEMENT_NOTES_MAX: usize = 500;

/// Figures a settlement would record, computed without writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementPreview {
    pub approved_expenses: Decimal,
    pub theoretical_balance: Decimal,
    pub returned_cash_amount: Amount,
    pub deficit: Decimal,
}

impl SettlementPreview {
    /// Compute the reconciliation of `advance` against `expenses`.
    ///
    /// Expenses recorded against other advances are ignored.
    pub fn compute(advance: &Advance, expenses: &[Expense], returned_cash: Amount) -> Self {
        let approved_expenses = round_cents(
            expenses
                .iter()
                .filter(|expense| expense.advance_id() == advance.id())
                .filter(|expense| expense.status() == ExpenseStatus::Approved)
                .map(Expense::amount)
                .sum(),
        );
        let theoretical_balance = round_cents(advance.amount().value() - approved_expenses);
        Self {
            approved_expenses,
            theoretical_balance,
            returned_cash_amount: returned_cash,
            deficit: round_cents(theoretical_balance - returned_cash.value()),
        }
    }

    /// The debt to carry forward, if the holder owes money.
    pub fn carried_deficit(&self) -> Result<Option<Amount>, AmountError> {
        if self.deficit > Decimal::ZERO {
            Amount::new(self.deficit).map(Some)
        } else {
            Ok(None)
        }
    }
}

/// Reasons a settlement cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettlementError {
    #[error(transparent)]
    Transition(#[from] AdvanceTransitionError),
    #[error("settlement notes must be at most {max} characters")]
    NotesTooLong { max: usize },
    #[error("deficit cannot be carried forward: {0}")]
    Deficit(AmountError),
    #[error("carry-forward advance is invalid: {0}")]
    CarryForward(AdvanceValidationError),
}

/// Closed advance plus the debt advance it spawned, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementOutcome {
    pub preview: SettlementPreview,
    pub closed: Advance,
    pub carry_forward: Option<Advance>,
}

fn normalise_notes(notes: Option<String>) -> Result<Option<String>, SettlementError> {
    let notes = notes
        .map(|raw| raw.trim().to_owned())
        .filter(|raw| !raw.is_empty());
    if notes
        .as_deref()
        .is_some_and(|text| text.chars().count() > SETTLEMENT_NOTES_MAX)
    {
        return Err(SettlementError::NotesTooLong {
            max: SETTLEMENT_NOTES_MAX,
        });
    }
    Ok(notes)
}

/// Close `advance`, recording the reconciliation and building the
/// carry-forward advance when a deficit remains.
///
/// # Examples
/// ```
/// use advance_ledger::domain::{
///     settle, Advance, AdvanceDraft, AdvanceId, AdvanceStatus, Amount, ProjectId, UserId,
/// };
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let date = NaiveDate::from_ymd_opt(2026, 5, 1).expect("date");
/// let holder = UserId::random();
/// let advance = Advance::issue(
///     AdvanceDraft {
///         id: AdvanceId::random(),
///         project_id: ProjectId::random(),
///         user_id: holder,
///         created_by: holder,
///         amount: Amount::new(Decimal::from(500)).expect("amount"),
///         description: "Tools".to_owned(),
///         date,
///     },
///     AdvanceStatus::Open,
/// )
/// .expect("advance");
///
/// let outcome = settle(&advance, &[], Amount::new(Decimal::from(500)).expect("cash"), None, date)
///     .expect("settle");
/// assert_eq!(outcome.closed.status(), AdvanceStatus::Closed);
/// assert!(outcome.carry_forward.is_none());
/// ```
pub fn settle(
    advance: &Advance,
    expenses: &[Expense],
    returned_cash: Amount,
    notes: Option<String>,
    settlement_date: NaiveDate,
) -> Result<SettlementOutcome, SettlementError> {
    let notes = normalise_notes(notes)?;
    let preview = SettlementPreview::compute(advance, expenses, returned_cash);
    let closed = advance.close(SettlementData {
        total_approved_expenses: preview.approved_expenses,
        returned_cash_amount: returned_cash,
        deficit_amount: preview.deficit,
        notes,
        settlement_date,
    })?;
    let carry_forward = preview
        .carried_deficit()
        .map_err(SettlementError::Deficit)?
        .map(|deficit| Advance::carry_forward(&closed, deficit, settlement_date))
        .transpose()
        .map_err(SettlementError::CarryForward)?;
    Ok(SettlementOutcome {
        preview,
        closed,
        carry_forward,
    })
}

#[cfg(test)]
mod tests {
    //! Regression coverage for settlement figures and carry-forward.
    use super::*;
    use crate::domain::test_fixtures::{admin, advance, amount, expense, project, today};
    use crate::domain::{AdvanceStatus, ProjectStatus};
    use rstest::{fixture, rstest};

    struct Float {
        advance: Advance,
        expenses: Vec<Expense>,
    }

    /// An OPEN advance of 10000 with 7000 approved, 300 pending and 200
    /// rejected.
    #[fixture]
    fn float() -> Float {
        let owner = admin("Zaid");
        let site = project(&owner, ProjectStatus::Active);
        let advance = advance(&site, &owner, 10_000, AdvanceStatus::Open);
        let approved_a = expense(&advance, 4_000).approve().expect("approve");
        let approved_b = expense(&advance, 3_000).approve().expect("approve");
        let pending = expense(&advance, 300);
        let rejected = expense(&advance, 200).reject("duplicate").expect("reject");
        Float {
            advance,
            expenses: vec![approved_a, approved_b, pending, rejected],
        }
    }

    #[rstest]
    fn preview_counts_only_approved_expenses(float: Float) {
        let preview = SettlementPreview::compute(&float.advance, &float.expenses, amount(1_000));
        assert_eq!(preview.approved_expenses, Decimal::from(7_000));
        assert_eq!(preview.theoretical_balance, Decimal::from(3_000));
        assert_eq!(preview.deficit, Decimal::from(2_000));
    }

    #[rstest]
    fn deficit_is_carried_into_an_open_advance(float: Float) {
        let outcome = settle(
            &float.advance,
            &float.expenses,
            amount(1_000),
            Some("  short by two thousand ".to_owned()),
            today(),
        )
        .expect("settle");

        let data = outcome.closed.settlement().expect("settlement data");
        assert_eq!(data.total_approved_expenses, Decimal::from(7_000));
        assert_eq!(data.returned_cash_amount, amount(1_000));
        assert_eq!(data.deficit_amount, Decimal::from(2_000));
        assert_eq!(data.notes.as_deref(), Some("short by two thousand"));

        let debt = outcome.carry_forward.expect("carry-forward advance");
        assert_eq!(debt.status(), AdvanceStatus::Open);
        assert_eq!(debt.amount(), amount(2_000));
        assert_eq!(debt.remaining_amount(), Decimal::from(2_000));
        assert_eq!(debt.user_id(), float.advance.user_id());
        assert_eq!(debt.project_id(), float.advance.project_id());
    }

    #[rstest]
    fn zero_deficit_closes_without_follow_on(float: Float) {
        let outcome = settle(&float.advance, &float.expenses, amount(3_000), None, today())
            .expect("settle");
        assert_eq!(outcome.closed.status(), AdvanceStatus::Closed);
        assert_eq!(
            outcome.closed.settlement().map(|data| data.deficit_amount),
            Some(Decimal::ZERO)
        );
        assert!(outcome.carry_forward.is_none());
    }

    #[rstest]
    fn over_return_records_negative_deficit(float: Float) {
        let outcome = settle(&float.advance, &float.expenses, amount(3_500), None, today())
            .expect("settle");
        assert_eq!(
            outcome.closed.settlement().map(|data| data.deficit_amount),
            Some(Decimal::from(-500))
        );
        assert!(outcome.carry_forward.is_none());
    }

    #[rstest]
    fn only_open_advances_settle(float: Float) {
        let closed = settle(&float.advance, &float.expenses, amount(3_000), None, today())
            .expect("settle")
            .closed;
        assert!(matches!(
            settle(&closed, &float.expenses, amount(0), None, today()),
            Err(SettlementError::Transition(
                AdvanceTransitionError::UnexpectedStatus { .. }
            ))
        ));
    }

    #[rstest]
    fn overlong_notes_are_refused(float: Float) {
        let notes = "x".repeat(SETTLEMENT_NOTES_MAX + 1);
        assert_eq!(
            settle(&float.advance, &float.expenses, amount(0), Some(notes), today()),
            Err(SettlementError::NotesTooLong {
                max: SETTLEMENT_NOTES_MAX
            })
        );
    }
}
