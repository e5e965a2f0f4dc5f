// Invoice document generation pipeline: ledger sync → financial cascade →
// composition → optional report merge. Every generation recomputes the
// ledger first, so the document never carries stale totals.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::core::{AppError, Result};
use crate::modules::composer::{ComposeOptions, DocumentComposer, InvoiceDocumentData};
use crate::modules::financials::FinancialCalculator;
use crate::modules::ledger::repositories::ChargeSourceRepository;
use crate::modules::ledger::services::LedgerService;
use crate::modules::reports::services::report_merger::{AttachmentLocation, ReportMerger};

/// A finished output document
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedDocument {
    pub filename: String,
    pub content_type: &'static str,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

pub struct InvoiceReportService {
    ledger: Arc<LedgerService>,
    sources: Arc<dyn ChargeSourceRepository>,
    composer: DocumentComposer,
    merger: ReportMerger,
    calculator: FinancialCalculator,
}

impl InvoiceReportService {
    pub fn new(
        ledger: Arc<LedgerService>,
        sources: Arc<dyn ChargeSourceRepository>,
        composer: DocumentComposer,
        merger: ReportMerger,
    ) -> Self {
        Self {
            ledger,
            sources,
            composer,
            merger,
            calculator: FinancialCalculator::new(),
        }
    }

    /// Generate the invoice document, optionally appending the
    /// admission's stored lab report documents.
    pub async fn generate(
        &self,
        invoice_id: i64,
        include_reports: bool,
        options: ComposeOptions,
    ) -> Result<GeneratedDocument> {
        // Never return stale totals: sync before composing
        self.ledger.sync_all(invoice_id).await?;

        let (invoice, items) = self.ledger.get_invoice(invoice_id).await?;
        let facts = self
            .sources
            .admission_facts(invoice.admission_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Admission {}", invoice.admission_id))
            })?;

        let totals = self.calculator.totals(
            invoice.total_amount,
            invoice.discount_rule(),
            invoice.include_tax,
            invoice.tax_rate,
            invoice.paid_amount,
        );

        let data = InvoiceDocumentData {
            invoice_number: invoice.invoice_number.clone(),
            bill_date: Utc::now(),
            status_label: invoice.status.to_string(),
            facts,
            items,
            totals,
        };

        let composed = self.composer.compose(&data, &options)?;

        let (bytes, with_reports) = if include_reports {
            let locations = self.report_locations(invoice.admission_id).await?;
            let appended = !locations.is_empty();
            (self.merger.merge(composed, &locations).await?, appended)
        } else {
            (composed, false)
        };

        let filename = if with_reports {
            format!("invoice-{}-with-reports.pdf", invoice.invoice_number)
        } else {
            format!("invoice-{}.pdf", invoice.invoice_number)
        };

        info!(
            invoice_id,
            filename = %filename,
            size = bytes.len(),
            "Invoice document generated"
        );

        Ok(GeneratedDocument {
            filename,
            content_type: "application/pdf",
            bytes,
        })
    }

    /// Stored lab report documents for the admission, in record order
    async fn report_locations(&self, admission_id: i64) -> Result<Vec<AttachmentLocation>> {
        let records = self.sources.lab_billing_records(admission_id).await?;

        Ok(records
            .into_iter()
            .filter_map(|record| record.report_key)
            .map(AttachmentLocation::StorageKey)
            .collect())
    }
}
