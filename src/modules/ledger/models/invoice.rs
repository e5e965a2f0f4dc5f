// An invoice aggregates the billable charges of one admission.
//
// `total_amount` is derived from the line item set and recomputed after
// every ledger mutation; it is never edited directly. Deleting an invoice
// cascades to its line items.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::modules::financials::DiscountRule;

/// Invoice payment status, derived from paid amount vs. payable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(20)", rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// No payment recorded yet
    #[serde(rename = "pending")]
    Pending,

    /// Paid in part
    #[serde(rename = "partial")]
    Partial,

    /// Paid in full (or overpaid)
    #[serde(rename = "paid")]
    Paid,
}

impl Default for InvoiceStatus {
    fn default() -> Self {
        InvoiceStatus::Pending
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvoiceStatus::Pending => write!(f, "pending"),
            InvoiceStatus::Partial => write!(f, "partial"),
            InvoiceStatus::Paid => write!(f, "paid"),
        }
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InvoiceStatus::Pending),
            "partial" => Ok(InvoiceStatus::Partial),
            "paid" => Ok(InvoiceStatus::Paid),
            _ => Err(format!("Invalid invoice status: {}", s)),
        }
    }
}

/// Represents one billing invoice for an admission
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub id: i64,

    /// Admission this invoice bills
    pub admission_id: i64,

    /// Sequential human-readable number, e.g. INV-000042
    pub invoice_number: String,

    pub status: InvoiceStatus,

    /// Sum of line item totals. Derived; recomputed on every mutation.
    pub total_amount: Decimal,

    /// Discount descriptor: none | percentage | fixed
    pub discount_type: String,
    pub discount_value: Decimal,

    pub include_tax: bool,

    /// Fractional tax rate, e.g. 0.18
    pub tax_rate: Decimal,

    pub paid_amount: Decimal,
    pub last_payment_date: Option<DateTime<Utc>>,

    /// Free-text payment metadata
    pub payment_note: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// The persisted discount descriptor as a calculator rule
    pub fn discount_rule(&self) -> DiscountRule {
        DiscountRule::from_parts(&self.discount_type, self.discount_value)
            .unwrap_or(DiscountRule::None)
    }

    /// Derive the payment status from what has been paid against payable
    pub fn derive_status(paid: Decimal, payable: Decimal) -> InvoiceStatus {
        if paid <= Decimal::ZERO {
            InvoiceStatus::Pending
        } else if paid < payable {
            InvoiceStatus::Partial
        } else {
            InvoiceStatus::Paid
        }
    }
}
