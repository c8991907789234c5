//! # Expense Lifecycle Events
//!
//! Submission and review of member expenses.

use crate::publish_typed;
use serde::{Deserialize, Serialize};
use trailkit_bus::{EventBus, PublishOptions};

/// `metadata.source` for this domain.
pub const SOURCE: &str = "expenses";

/// An expense was submitted for review.
pub const EXPENSE_SUBMITTED: &str = "expense.submitted";

/// An expense passed review.
pub const EXPENSE_APPROVED: &str = "expense.approved";

/// An expense was rejected in review.
pub const EXPENSE_REJECTED: &str = "expense.rejected";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseSubmitted {
    pub expense_id: String,
    pub organization_id: String,
    /// Amount in minor currency units.
    pub amount_cents: u64,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseApproved {
    pub expense_id: String,
    pub organization_id: String,
    pub amount_cents: u64,
    pub approver_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRejected {
    pub expense_id: String,
    pub organization_id: String,
    pub reviewer_id: String,
    pub reason: String,
}

pub async fn publish_expense_submitted(
    bus: &EventBus,
    payload: &ExpenseSubmitted,
    options: PublishOptions,
) -> bool {
    publish_typed(bus, EXPENSE_SUBMITTED, SOURCE, payload, options).await
}

pub async fn publish_expense_approved(
    bus: &EventBus,
    payload: &ExpenseApproved,
    options: PublishOptions,
) -> bool {
    publish_typed(bus, EXPENSE_APPROVED, SOURCE, payload, options).await
}

pub async fn publish_expense_rejected(
    bus: &EventBus,
    payload: &ExpenseRejected,
    options: PublishOptions,
) -> bool {
    publish_typed(bus, EXPENSE_REJECTED, SOURCE, payload, options).await
}
