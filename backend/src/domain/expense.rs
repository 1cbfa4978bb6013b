//! Expenses recorded against an advance.
//!
//! An expense is either a single fixed amount or an itemised invoice, plus
//! an optional additional amount. Its total is always derived from those
//! parts and never accepted from the caller.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::advance::require_reason;
use super::money::round_cents;
use super::{AdvanceId, Amount, AmountError, ExpenseId, UserId};

/// Maximum length of expense descriptions, notes and item names.
pub const EXPENSE_TEXT_MAX: usize = 500;

/// Flat expense status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpenseStatus {
    Pending,
    Approved,
    Rejected,
}

impl ExpenseStatus {
    /// Stable storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for ExpenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpenseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            other => Err(format!("unknown expense status: {other}")),
        }
    }
}

/// Validation errors for expense construction and edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpenseValidationError {
    EmptyDescription,
    TextTooLong { field: &'static str, max: usize },
    EmptyInvoice,
    EmptyItemName { index: usize },
    NonPositiveQuantity { index: usize },
    NonPositiveTotal,
    Amount(AmountError),
    EmptyRejectionReason,
    InconsistentState,
}

impl fmt::Display for ExpenseValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDescription => write!(f, "expense description must not be empty"),
            Self::TextTooLong { field, max } => {
                write!(f, "expense {field} must be at most {max} characters")
            }
            Self::EmptyInvoice => write!(f, "an invoice needs at least one item"),
            Self::EmptyItemName { index } => write!(f, "invoice item {index} needs a name"),
            Self::NonPositiveQuantity { index } => {
                write!(f, "invoice item {index} quantity must be greater than zero")
            }
            Self::NonPositiveTotal => write!(f, "expense total must be greater than zero"),
            Self::Amount(err) => err.fmt(f),
            Self::EmptyRejectionReason => write!(f, "a rejection reason is required"),
            Self::InconsistentState => {
                write!(f, "expense status does not match its rejection data")
            }
        }
    }
}

impl std::error::Error for ExpenseValidationError {}

impl From<AmountError> for ExpenseValidationError {
    fn from(value: AmountError) -> Self {
        Self::Amount(value)
    }
}

/// Transitions refused by the current state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpenseTransitionError {
    #[error("expense is {actual}, expected {expected}")]
    UnexpectedStatus {
        expected: ExpenseStatus,
        actual: ExpenseStatus,
    },
    #[error("expense is locked for editing")]
    Locked,
    #[error(transparent)]
    Invalid(#[from] ExpenseValidationError),
}

/// Caller-supplied invoice line.
#[derive(Debug, Clone)]
pub struct InvoiceItemDraft {
    pub item_name: String,
    pub quantity: Decimal,
    pub unit_price: Amount,
}

/// An invoice line with its derived total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    item_name: String,
    quantity: Decimal,
    unit_price: Amount,
    total: Amount,
}

impl InvoiceItem {
    fn new(index: usize, draft: InvoiceItemDraft) -> Result<Self, ExpenseValidationError> {
        let item_name = draft.item_name.trim().to_owned();
        if item_name.is_empty() {
            return Err(ExpenseValidationError::EmptyItemName { index });
        }
        check_length("item name", &item_name)?;
        if draft.quantity <= Decimal::ZERO {
            return Err(ExpenseValidationError::NonPositiveQuantity { index });
        }
        let total = Amount::new(round_cents(draft.quantity * draft.unit_price.value()))?;
        Ok(Self {
            item_name,
            quantity: draft.quantity.normalize(),
            unit_price: draft.unit_price,
            total,
        })
    }

    pub fn item_name(&self) -> &str {
        &self.item_name
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn unit_price(&self) -> Amount {
        self.unit_price
    }

    /// `quantity × unit_price`, rounded to cents.
    pub fn total(&self) -> Amount {
        self.total
    }
}

/// Caller-supplied composition of an expense.
#[derive(Debug, Clone)]
pub enum ExpenseBreakdownDraft {
    Fixed { base_amount: Amount },
    Invoice { items: Vec<InvoiceItemDraft> },
}

/// Validated composition of an expense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpenseBreakdown {
    Fixed { base_amount: Amount },
    Invoice { items: Vec<InvoiceItem> },
}

impl ExpenseBreakdown {
    fn new(draft: ExpenseBreakdownDraft) -> Result<Self, ExpenseValidationError> {
        match draft {
            ExpenseBreakdownDraft::Fixed { base_amount } => Ok(Self::Fixed { base_amount }),
            ExpenseBreakdownDraft::Invoice { items } => {
                if items.is_empty() {
                    return Err(ExpenseValidationError::EmptyInvoice);
                }
                let items = items
                    .into_iter()
                    .enumerate()
                    .map(|(index, item)| InvoiceItem::new(index, item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::Invoice { items })
            }
        }
    }

    /// Sum of the lines, excluding any additional amount.
    pub fn subtotal(&self) -> Decimal {
        match self {
            Self::Fixed { base_amount } => base_amount.value(),
            Self::Invoice { items } => items.iter().map(InvoiceItem::total).sum(),
        }
    }

    pub fn is_invoice(&self) -> bool {
        matches!(self, Self::Invoice { .. })
    }

    pub fn items(&self) -> &[InvoiceItem] {
        match self {
            Self::Fixed { .. } => &[],
            Self::Invoice { items } => items,
        }
    }
}

/// Status together with the data only that status carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpenseState {
    Pending,
    Approved,
    Rejected { reason: String },
}

impl ExpenseState {
    #[must_use]
    pub const fn status(&self) -> ExpenseStatus {
        match self {
            Self::Pending => ExpenseStatus::Pending,
            Self::Approved => ExpenseStatus::Approved,
            Self::Rejected { .. } => ExpenseStatus::Rejected,
        }
    }
}

/// Editable content of an expense.
#[derive(Debug, Clone)]
pub struct ExpenseContent {
    pub description: String,
    pub notes: Option<String>,
    pub image_url: Option<String>,
    pub breakdown: ExpenseBreakdownDraft,
    pub additional_amount: Amount,
}

/// Input for submitting a new expense.
#[derive(Debug, Clone)]
pub struct ExpenseDraft {
    pub id: ExpenseId,
    pub advance_id: AdvanceId,
    pub user_id: UserId,
    pub date: NaiveDate,
    pub content: ExpenseContent,
}

/// Spend recorded by an advance holder.
///
/// ## Invariants
/// - `amount == breakdown.subtotal() + additional_amount` and is positive.
/// - approving forces `is_editable` to false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ExpenseRecord", into = "ExpenseRecord")]
pub struct Expense {
    id: ExpenseId,
    advance_id: AdvanceId,
    user_id: UserId,
    description: String,
    notes: Option<String>,
    image_url: Option<String>,
    date: NaiveDate,
    breakdown: ExpenseBreakdown,
    additional_amount: Amount,
    amount: Amount,
    state: ExpenseState,
    is_editable: bool,
}

fn check_length(field: &'static str, value: &str) -> Result<(), ExpenseValidationError> {
    if value.chars().count() > EXPENSE_TEXT_MAX {
        return Err(ExpenseValidationError::TextTooLong {
            field,
            max: EXPENSE_TEXT_MAX,
        });
    }
    Ok(())
}

fn optional_text(
    field: &'static str,
    value: Option<String>,
) -> Result<Option<String>, ExpenseValidationError> {
    let text = value
        .map(|raw| raw.trim().to_owned())
        .filter(|raw| !raw.is_empty());
    if let Some(text) = text.as_deref() {
        check_length(field, text)?;
    }
    Ok(text)
}

struct ValidContent {
    description: String,
    notes: Option<String>,
    image_url: Option<String>,
    breakdown: ExpenseBreakdown,
    additional_amount: Amount,
    amount: Amount,
}

fn validate_content(content: ExpenseContent) -> Result<ValidContent, ExpenseValidationError> {
    let description = content.description.trim().to_owned();
    if description.is_empty() {
        return Err(ExpenseValidationError::EmptyDescription);
    }
    check_length("description", &description)?;
    let breakdown = ExpenseBreakdown::new(content.breakdown)?;
    let amount = Amount::new(breakdown.subtotal() + content.additional_amount.value())?;
    if amount.is_zero() {
        return Err(ExpenseValidationError::NonPositiveTotal);
    }
    Ok(ValidContent {
        description,
        notes: optional_text("notes", content.notes)?,
        image_url: optional_text("image url", content.image_url)?,
        breakdown,
        additional_amount: content.additional_amount,
        amount,
    })
}

impl Expense {
    /// Submit a new PENDING, editable expense.
    ///
    /// # Examples
    /// ```
    /// use advance_ledger::domain::{
    ///     AdvanceId, Amount, Expense, ExpenseBreakdownDraft, ExpenseContent, ExpenseDraft,
    ///     ExpenseId, ExpenseStatus, InvoiceItemDraft, UserId,
    /// };
    /// use chrono::NaiveDate;
    /// use rust_decimal::Decimal;
    ///
    /// let price = Amount::new(Decimal::from(40)).expect("price");
    /// let expense = Expense::submit(ExpenseDraft {
    ///     id: ExpenseId::random(),
    ///     advance_id: AdvanceId::random(),
    ///     user_id: UserId::random(),
    ///     date: NaiveDate::from_ymd_opt(2026, 1, 5).expect("date"),
    ///     content: ExpenseContent {
    ///         description: "Cement".to_owned(),
    ///         notes: None,
    ///         image_url: None,
    ///         breakdown: ExpenseBreakdownDraft::Invoice {
    ///             items: vec![InvoiceItemDraft {
    ///                 item_name: "Bag".to_owned(),
    ///                 quantity: Decimal::from(3),
    ///                 unit_price: price,
    ///             }],
    ///         },
    ///         additional_amount: Amount::new(Decimal::from(5)).expect("extra"),
    ///     },
    /// })
    /// .expect("valid expense");
    /// assert_eq!(expense.amount().value(), Decimal::from(125));
    /// assert_eq!(expense.status(), ExpenseStatus::Pending);
    /// ```
    pub fn submit(draft: ExpenseDraft) -> Result<Self, ExpenseValidationError> {
        let content = validate_content(draft.content)?;
        Ok(Self {
            id: draft.id,
            advance_id: draft.advance_id,
            user_id: draft.user_id,
            description: content.description,
            notes: content.notes,
            image_url: content.image_url,
            date: draft.date,
            breakdown: content.breakdown,
            additional_amount: content.additional_amount,
            amount: content.amount,
            state: ExpenseState::Pending,
            is_editable: true,
        })
    }

    pub fn id(&self) -> ExpenseId {
        self.id
    }

    pub fn advance_id(&self) -> AdvanceId {
        self.advance_id
    }

    /// The user who recorded the expense.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn breakdown(&self) -> &ExpenseBreakdown {
        &self.breakdown
    }

    pub fn additional_amount(&self) -> Amount {
        self.additional_amount
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn state(&self) -> &ExpenseState {
        &self.state
    }

    pub fn status(&self) -> ExpenseStatus {
        self.state.status()
    }

    pub fn is_editable(&self) -> bool {
        self.is_editable
    }

    pub fn is_invoice(&self) -> bool {
        self.breakdown.is_invoice()
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        match &self.state {
            ExpenseState::Rejected { reason } => Some(reason),
            _ => None,
        }
    }

    /// Whether the content may currently be changed by its owner.
    pub fn is_content_editable(&self) -> bool {
        match self.state {
            ExpenseState::Pending => true,
            ExpenseState::Approved => self.is_editable,
            ExpenseState::Rejected { .. } => false,
        }
    }

    fn expect_pending(&self) -> Result<(), ExpenseTransitionError> {
        match self.state {
            ExpenseState::Pending => Ok(()),
            _ => Err(ExpenseTransitionError::UnexpectedStatus {
                expected: ExpenseStatus::Pending,
                actual: self.status(),
            }),
        }
    }

    /// PENDING → APPROVED; locks the expense.
    pub fn approve(&self) -> Result<Self, ExpenseTransitionError> {
        self.expect_pending()?;
        Ok(Self {
            state: ExpenseState::Approved,
            is_editable: false,
            ..self.clone()
        })
    }

    /// PENDING → REJECTED with a non-empty reason.
    pub fn reject(&self, reason: &str) -> Result<Self, ExpenseTransitionError> {
        let reason =
            require_reason(reason).map_err(|_| ExpenseValidationError::EmptyRejectionReason)?;
        self.expect_pending()?;
        Ok(Self {
            state: ExpenseState::Rejected { reason },
            ..self.clone()
        })
    }

    /// Flip the edit gate without touching the status.
    pub fn toggle_editable(&self) -> Result<Self, ExpenseTransitionError> {
        if let ExpenseState::Rejected { .. } = self.state {
            return Err(ExpenseTransitionError::UnexpectedStatus {
                expected: ExpenseStatus::Approved,
                actual: ExpenseStatus::Rejected,
            });
        }
        Ok(Self {
            is_editable: !self.is_editable,
            ..self.clone()
        })
    }

    /// Replace the content, recomputing the total.
    ///
    /// An unlocked APPROVED expense stays APPROVED and is locked again.
    pub fn revise(&self, content: ExpenseContent) -> Result<Self, ExpenseTransitionError> {
        if !self.is_content_editable() {
            return Err(ExpenseTransitionError::Locked);
        }
        let content = validate_content(content)?;
        Ok(Self {
            description: content.description,
            notes: content.notes,
            image_url: content.image_url,
            breakdown: content.breakdown,
            additional_amount: content.additional_amount,
            amount: content.amount,
            is_editable: matches!(self.state, ExpenseState::Pending) && self.is_editable,
            ..self.clone()
        })
    }
}

/// Flat wire, storage and change-feed representation of an [`Expense`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRecord {
    pub id: ExpenseId,
    pub advance_id: AdvanceId,
    pub user_id: UserId,
    pub amount: Amount,
    pub base_amount: Option<Amount>,
    pub additional_amount: Amount,
    pub description: String,
    pub notes: Option<String>,
    pub image_url: Option<String>,
    pub date: NaiveDate,
    pub status: ExpenseStatus,
    pub is_editable: bool,
    pub is_invoice: bool,
    pub invoice_items: Vec<InvoiceItem>,
    pub rejection_reason: Option<String>,
}

impl From<Expense> for ExpenseRecord {
    fn from(value: Expense) -> Self {
        let status = value.status();
        let is_invoice = value.is_invoice();
        let (base_amount, invoice_items) = match value.breakdown {
            ExpenseBreakdown::Fixed { base_amount } => (Some(base_amount), Vec::new()),
            ExpenseBreakdown::Invoice { items } => (None, items),
        };
        let rejection_reason = match value.state {
            ExpenseState::Rejected { reason } => Some(reason),
            ExpenseState::Pending | ExpenseState::Approved => None,
        };
        Self {
            id: value.id,
            advance_id: value.advance_id,
            user_id: value.user_id,
            amount: value.amount,
            base_amount,
            additional_amount: value.additional_amount,
            description: value.description,
            notes: value.notes,
            image_url: value.image_url,
            date: value.date,
            status,
            is_editable: value.is_editable,
            is_invoice,
            invoice_items,
            rejection_reason,
        }
    }
}

impl TryFrom<ExpenseRecord> for Expense {
    type Error = ExpenseValidationError;

    /// Rebuild from storage; the stored total is recomputed, not trusted.
    fn try_from(value: ExpenseRecord) -> Result<Self, Self::Error> {
        let breakdown = match (value.is_invoice, value.base_amount) {
            (false, Some(base_amount)) => ExpenseBreakdownDraft::Fixed { base_amount },
            (true, None) => ExpenseBreakdownDraft::Invoice {
                items: value
                    .invoice_items
                    .into_iter()
                    .map(|item| InvoiceItemDraft {
                        item_name: item.item_name,
                        quantity: item.quantity,
                        unit_price: item.unit_price,
                    })
                    .collect(),
            },
            _ => return Err(ExpenseValidationError::InconsistentState),
        };
        let state = match (value.status, value.rejection_reason) {
            (ExpenseStatus::Pending, None) => ExpenseState::Pending,
            (ExpenseStatus::Approved, None) => ExpenseState::Approved,
            (ExpenseStatus::Rejected, Some(reason)) => ExpenseState::Rejected {
                reason: require_reason(&reason)
                    .map_err(|_| ExpenseValidationError::EmptyRejectionReason)?,
            },
            _ => return Err(ExpenseValidationError::InconsistentState),
        };
        let content = validate_content(ExpenseContent {
            description: value.description,
            notes: value.notes,
            image_url: value.image_url,
            breakdown,
            additional_amount: value.additional_amount,
        })?;
        Ok(Self {
            id: value.id,
            advance_id: value.advance_id,
            user_id: value.user_id,
            description: content.description,
            notes: content.notes,
            image_url: content.image_url,
            date: value.date,
            breakdown: content.breakdown,
            additional_amount: content.additional_amount,
            amount: content.amount,
            state,
            is_editable: value.is_editable,
        })
    }
}

#[cfg(test)]
#[path = "expense_tests.rs"]
mod tests;
