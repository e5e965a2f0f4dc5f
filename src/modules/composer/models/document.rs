use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::HospitalConfig;
use crate::modules::financials::InvoiceTotals;
use crate::modules::ledger::models::{AdmissionFacts, LineItem};

/// Hospital identity rendered in the branding header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HospitalIdentity {
    pub name: String,
    pub address: String,
    pub contact: String,
    pub currency_symbol: String,
}

impl From<&HospitalConfig> for HospitalIdentity {
    fn from(config: &HospitalConfig) -> Self {
        Self {
            name: config.name.clone(),
            address: config.address.clone(),
            contact: config.contact.clone(),
            currency_symbol: config.currency_symbol.clone(),
        }
    }
}

/// One free-text block on the appended clinical summary page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeSection {
    pub title: String,
    pub body: String,
}

/// Layout options for one composition
#[derive(Debug, Clone, Default)]
pub struct ComposeOptions {
    /// Collapse the summary table to one row per category instead of one
    /// row per line item
    pub collapse_summary: bool,

    /// Clinical summary sections; a non-empty list appends the narrative
    /// page
    pub narrative: Vec<NarrativeSection>,
}

/// Everything a composition reads. Composing is a pure function of this
/// value; no mutable external state is consulted.
#[derive(Debug, Clone)]
pub struct InvoiceDocumentData {
    pub invoice_number: String,
    pub bill_date: DateTime<Utc>,
    pub status_label: String,
    pub facts: AdmissionFacts,
    pub items: Vec<LineItem>,
    pub totals: InvoiceTotals,
}

/// Whole years between a date of birth and a reference instant
pub fn age_years(date_of_birth: DateTime<Utc>, at: DateTime<Utc>) -> i64 {
    let days = (at - date_of_birth).num_days();
    if days <= 0 {
        return 0;
    }
    (days as f64 / 365.25) as i64
}
