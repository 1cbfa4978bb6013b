//! Driving port for recording and reviewing expenses.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{
    AdvanceId, Amount, Error, Expense, ExpenseBreakdownDraft, ExpenseContent, ExpenseId,
    InvoiceItemDraft, UserId,
};

/// One invoice line as supplied by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItemPayload {
    pub item_name: String,
    pub quantity: Decimal,
    pub unit_price: Amount,
}

/// How the expense total is composed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpenseBreakdownPayload {
    #[serde(rename_all = "camelCase")]
    Fixed { base_amount: Amount },
    Invoice { items: Vec<InvoiceItemPayload> },
}

/// Editable expense content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpensePayload {
    pub description: String,
    pub notes: Option<String>,
    pub image_url: Option<String>,
    pub breakdown: ExpenseBreakdownPayload,
    #[serde(default)]
    pub additional_amount: Option<Amount>,
}

impl From<ExpensePayload> for ExpenseContent {
    fn from(value: ExpensePayload) -> Self {
        let breakdown = match value.breakdown {
            ExpenseBreakdownPayload::Fixed { base_amount } => {
                ExpenseBreakdownDraft::Fixed { base_amount }
            }
            ExpenseBreakdownPayload::Invoice { items } => ExpenseBreakdownDraft::Invoice {
                items: items
                    .into_iter()
                    .map(|item| InvoiceItemDraft {
                        item_name: item.item_name,
                        quantity: item.quantity,
                        unit_price: item.unit_price,
                    })
                    .collect(),
            },
        };
        Self {
            description: value.description,
            notes: value.notes,
            image_url: value.image_url,
            breakdown,
            additional_amount: value.additional_amount.unwrap_or(Amount::ZERO),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitExpenseRequest {
    pub requester: UserId,
    pub advance_id: AdvanceId,
    pub expense: ExpensePayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditExpenseRequest {
    pub requester: UserId,
    pub expense_id: ExpenseId,
    pub expense: ExpensePayload,
}

/// Driving port for expense changes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExpenseCommand: Send + Sync {
    async fn submit_expense(&self, request: SubmitExpenseRequest) -> Result<Expense, Error>;

    async fn edit_expense(&self, request: EditExpenseRequest) -> Result<Expense, Error>;

    /// Approve and debit the owning advance in one commit.
    async fn approve_expense(
        &self,
        requester: &UserId,
        expense_id: &ExpenseId,
    ) -> Result<Expense, Error>;

    async fn reject_expense(
        &self,
        requester: &UserId,
        expense_id: &ExpenseId,
        reason: &str,
    ) -> Result<Expense, Error>;

    /// Flip the edit gate.
    async fn toggle_editability(
        &self,
        requester: &UserId,
        expense_id: &ExpenseId,
    ) -> Result<Expense, Error>;
}
