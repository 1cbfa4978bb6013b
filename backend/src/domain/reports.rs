//! Read-side report projections.
//!
//! Reports are plain [`Workbook`] values: named sheets of typed cells. An
//! exporter adapter renders them into a downloadable file; nothing here
//! feeds back into ledger state.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::money::round_cents;
use super::{
    Advance, AdvanceId, AdvanceStatus, Expense, ExpenseStatus, Project, ProjectId, User, UserId,
    VisibleLedger,
};

/// One spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Cell {
    Text(String),
    Number(Decimal),
    Date(NaiveDate),
    Empty,
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }
}

impl From<Decimal> for Cell {
    fn from(value: Decimal) -> Self {
        Self::Number(value)
    }
}

impl From<NaiveDate> for Cell {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

/// A named grid of rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sheet {
    name: String,
    rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    pub fn blank(&mut self) {
        self.rows.push(Vec::new());
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }
}

/// Sheets exported together as one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Workbook {
    file_stem: String,
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(file_stem: impl Into<String>, sheets: Vec<Sheet>) -> Self {
        Self {
            file_stem: file_stem.into(),
            sheets,
        }
    }

    /// Base name for the downloaded file, without extension.
    pub fn file_stem(&self) -> &str {
        &self.file_stem
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }
}

/// Related records shown alongside an expense invoice.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvoiceContext<'a> {
    pub advance: Option<&'a Advance>,
    pub project: Option<&'a Project>,
    pub owner: Option<&'a User>,
}

fn or_dash(value: Option<&str>) -> Cell {
    Cell::text(value.unwrap_or("-"))
}

/// Itemised sheet for one expense.
///
/// Fixed-amount expenses appear as a single line carrying the base amount.
pub fn invoice_workbook(expense: &Expense, context: InvoiceContext<'_>) -> Workbook {
    let mut sheet = Sheet::new("Invoice Details");
    let short_id: String = expense.id().to_string().chars().take(8).collect();
    sheet.push(vec![Cell::text("Expense Invoice")]);
    sheet.blank();
    sheet.push(vec![
        Cell::text("Date"),
        expense.date().into(),
        Cell::text("Expense No."),
        Cell::text(short_id),
    ]);
    sheet.push(vec![
        Cell::text("Project"),
        or_dash(context.project.map(Project::name)),
        Cell::text("Employee"),
        or_dash(context.owner.map(User::name)),
    ]);
    sheet.push(vec![
        Cell::text("Advance"),
        or_dash(context.advance.map(Advance::description)),
        Cell::text("Status"),
        Cell::text(expense.status().as_str()),
    ]);
    sheet.blank();
    sheet.push(vec![Cell::text("Description"), Cell::text(expense.description())]);
    sheet.push(vec![Cell::text("Notes"), or_dash(expense.notes())]);
    sheet.blank();
    sheet.push(
        ["#", "Item", "Quantity", "Unit Price", "Total"]
            .into_iter()
            .map(Cell::text)
            .collect(),
    );
    if expense.is_invoice() {
        for (index, item) in expense.breakdown().items().iter().enumerate() {
            sheet.push(vec![
                Decimal::from(index + 1).into(),
                Cell::text(item.item_name()),
                item.quantity().into(),
                item.unit_price().value().into(),
                item.total().value().into(),
            ]);
        }
    } else {
        let base = expense.breakdown().subtotal();
        sheet.push(vec![
            Decimal::ONE.into(),
            Cell::text(expense.description()),
            Decimal::ONE.into(),
            base.into(),
            base.into(),
        ]);
    }
    sheet.blank();
    if !expense.additional_amount().is_zero() {
        sheet.push(vec![
            Cell::Empty,
            Cell::Empty,
            Cell::Empty,
            Cell::text("Additional Amounts"),
            expense.additional_amount().value().into(),
        ]);
    }
    sheet.push(vec![
        Cell::Empty,
        Cell::Empty,
        Cell::Empty,
        Cell::text("Grand Total"),
        expense.amount().value().into(),
    ]);
    Workbook::new(
        format!("Invoice_{}_{}", expense.id(), expense.date()),
        vec![sheet],
    )
}

fn approved_total<'a>(expenses: impl Iterator<Item = &'a Expense>) -> Decimal {
    round_cents(
        expenses
            .filter(|expense| expense.status() == ExpenseStatus::Approved)
            .map(Expense::amount)
            .sum(),
    )
}

fn names(users: &[User]) -> HashMap<UserId, &str> {
    users.iter().map(|user| (user.id(), user.name())).collect()
}

fn holder_name(names: &HashMap<UserId, &str>, id: UserId) -> Cell {
    names
        .get(&id)
        .map_or_else(|| Cell::text(id.to_string()), |name| Cell::text(*name))
}

/// Records a project archive report is built from.
#[derive(Debug, Clone, Copy)]
pub struct ProjectRecords<'a> {
    pub project: &'a Project,
    pub advances: &'a [Advance],
    pub expenses: &'a [Expense],
    pub users: &'a [User],
}

/// `Summary` and `Detailed Expenses` sheets for one project.
pub fn project_archive_workbook(records: ProjectRecords<'_>, generated_on: NaiveDate) -> Workbook {
    let project = records.project;
    let names = names(records.users);
    let advances: Vec<&Advance> = records
        .advances
        .iter()
        .filter(|advance| advance.project_id() == project.id())
        .collect();
    let expenses_of = |id: AdvanceId| {
        records
            .expenses
            .iter()
            .filter(move |expense| expense.advance_id() == id)
    };

    let mut summary = Sheet::new("Summary");
    summary.push(vec![Cell::text("Project Archive Report")]);
    summary.blank();
    summary.push(vec![Cell::text("Project Name"), Cell::text(project.name())]);
    summary.push(vec![Cell::text("Location"), Cell::text(project.location())]);
    summary.push(vec![Cell::text("Archived Date"), generated_on.into()]);
    summary.blank();
    summary.push(
        [
            "Advance Description",
            "Employee",
            "Date",
            "Status",
            "Amount",
            "Spent",
            "Returned",
            "Deficit",
        ]
        .into_iter()
        .map(Cell::text)
        .collect(),
    );
    for advance in &advances {
        let settlement = advance.settlement();
        summary.push(vec![
            Cell::text(advance.description()),
            holder_name(&names, advance.user_id()),
            advance.date().into(),
            Cell::text(advance.status().as_str()),
            advance.amount().value().into(),
            approved_total(expenses_of(advance.id())).into(),
            settlement
                .map_or(Decimal::ZERO, |data| data.returned_cash_amount.value())
                .into(),
            settlement
                .map_or(Decimal::ZERO, |data| data.deficit_amount)
                .into(),
        ]);
    }

    let mut detail = Sheet::new("Detailed Expenses");
    detail.push(
        [
            "Advance",
            "Expense Description",
            "Date",
            "Amount",
            "Status",
            "Notes",
            "Is Invoice?",
        ]
        .into_iter()
        .map(Cell::text)
        .collect(),
    );
    for advance in &advances {
        for expense in expenses_of(advance.id()) {
            detail.push(vec![
                Cell::text(advance.description()),
                Cell::text(expense.description()),
                expense.date().into(),
                expense.amount().value().into(),
                Cell::text(expense.status().as_str()),
                Cell::text(expense.notes().unwrap_or_default()),
                Cell::text(if expense.is_invoice() { "Yes" } else { "No" }),
            ]);
        }
    }

    Workbook::new(
        format!("Archive_Report_{}", project.name()),
        vec![summary, detail],
    )
}

/// Optional narrowing of the spend report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpendFilter {
    pub project_id: Option<ProjectId>,
    pub user_id: Option<UserId>,
    /// Inclusive lower bound on the advance date.
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on the advance date.
    pub to: Option<NaiveDate>,
}

impl SpendFilter {
    fn admits(&self, advance: &Advance) -> bool {
        self.user_id.is_none_or(|id| advance.user_id() == id)
            && self.from.is_none_or(|from| advance.date() >= from)
            && self.to.is_none_or(|to| advance.date() <= to)
    }
}

/// Approved spend on one advance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceSpend {
    pub advance_id: AdvanceId,
    pub description: String,
    pub holder_id: UserId,
    pub holder_name: Option<String>,
    pub date: NaiveDate,
    pub status: AdvanceStatus,
    pub amount: Decimal,
    pub spent: Decimal,
    pub settlement_notes: Option<String>,
    pub expense_count: usize,
}

/// Approved spend on one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSpend {
    pub project_id: ProjectId,
    pub name: String,
    pub location: String,
    pub advances: Vec<AdvanceSpend>,
    pub total_spent: Decimal,
}

/// Period spend across the projects a requester can see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendReport {
    pub projects: Vec<ProjectSpend>,
    pub grand_total: Decimal,
}

impl SpendReport {
    /// Build the report from an already-filtered ledger.
    ///
    /// Projects with no matching advances are omitted.
    pub fn build(ledger: &VisibleLedger, filter: SpendFilter) -> Self {
        let names = names(&ledger.users);
        let projects: Vec<ProjectSpend> = ledger
            .projects
            .iter()
            .filter(|project| filter.project_id.is_none_or(|id| project.id() == id))
            .filter_map(|project| {
                let advances: Vec<AdvanceSpend> = ledger
                    .advances
                    .iter()
                    .filter(|advance| advance.project_id() == project.id())
                    .filter(|advance| filter.admits(advance))
                    .map(|advance| {
                        let expenses: Vec<&Expense> = ledger
                            .expenses
                            .iter()
                            .filter(|expense| expense.advance_id() == advance.id())
                            .collect();
                        AdvanceSpend {
                            advance_id: advance.id(),
                            description: advance.description().to_owned(),
                            holder_id: advance.user_id(),
                            holder_name: names.get(&advance.user_id()).map(|name| (*name).to_owned()),
                            date: advance.date(),
                            status: advance.status(),
                            amount: advance.amount().value(),
                            spent: approved_total(expenses.iter().copied()),
                            settlement_notes: advance
                                .settlement()
                                .and_then(|data| data.notes.clone()),
                            expense_count: expenses.len(),
                        }
                    })
                    .collect();
                if advances.is_empty() {
                    return None;
                }
                let total_spent = round_cents(advances.iter().map(|advance| advance.spent).sum());
                Some(ProjectSpend {
                    project_id: project.id(),
                    name: project.name().to_owned(),
                    location: project.location().to_owned(),
                    advances,
                    total_spent,
                })
            })
            .collect();
        let grand_total = round_cents(projects.iter().map(|project| project.total_spent).sum());
        Self {
            projects,
            grand_total,
        }
    }

    /// Render as a single `Financial Report` sheet.
    pub fn to_workbook(&self, generated_on: NaiveDate, filter: SpendFilter) -> Workbook {
        let mut sheet = Sheet::new("Financial Report");
        sheet.push(vec![Cell::text("Expense and Advance Report")]);
        sheet.push(vec![Cell::text("Report Date"), generated_on.into()]);
        if filter.from.is_some() || filter.to.is_some() {
            sheet.push(vec![
                Cell::text("Period"),
                filter.from.map_or(Cell::text("-"), Cell::from),
                filter.to.map_or(Cell::text("-"), Cell::from),
            ]);
        }
        sheet.blank();
        for project in &self.projects {
            sheet.push(vec![
                Cell::text(format!("Project: {}", project.name)),
                Cell::text(format!("Location: {}", project.location)),
            ]);
            sheet.push(
                [
                    "#",
                    "Advance",
                    "Employee",
                    "Date",
                    "Amount",
                    "Spent",
                    "Status",
                    "Notes",
                ]
                .into_iter()
                .map(Cell::text)
                .collect(),
            );
            for (index, advance) in project.advances.iter().enumerate() {
                sheet.push(vec![
                    Decimal::from(index + 1).into(),
                    Cell::text(advance.description.clone()),
                    Cell::text(
                        advance
                            .holder_name
                            .clone()
                            .unwrap_or_else(|| advance.holder_id.to_string()),
                    ),
                    advance.date.into(),
                    advance.amount.into(),
                    advance.spent.into(),
                    Cell::text(advance.status.as_str()),
                    Cell::text(advance.settlement_notes.clone().unwrap_or_default()),
                ]);
            }
            sheet.push(vec![
                Cell::Empty,
                Cell::Empty,
                Cell::Empty,
                Cell::text("Project Total"),
                project.total_spent.into(),
            ]);
            sheet.blank();
        }
        sheet.push(vec![
            Cell::Empty,
            Cell::Empty,
            Cell::Empty,
            Cell::text("Grand Total"),
            self.grand_total.into(),
        ]);
        Workbook::new(format!("Spend_Report_{generated_on}"), vec![sheet])
    }
}

#[cfg(test)]
#[path = "reports_tests.rs"]
mod tests;
