use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use crate::core::{AppError, Result};
use crate::modules::financials::{DiscountRule, FinancialCalculator};
use crate::modules::ledger::models::{
    ChargeSource, Invoice, LabBillingStatus, LineItem, LineItemType, RoomChargeBreakdown,
    RoomSegmentCharge,
};
use crate::modules::ledger::repositories::{ChargeSourceRepository, InvoiceRepository};

/// Per-invocation outcome of a full ledger sync.
///
/// A category that could not be fetched is listed in `skipped_categories`
/// and will be picked up by the next sync call.
#[derive(Debug, Clone, Serialize, Default)]
pub struct SyncReport {
    pub room_items_added: u32,
    pub medication_items_added: u32,
    pub lab_items_added: u32,
    pub skipped_categories: Vec<String>,
    pub total_amount: Decimal,
}

/// Charge Ledger: produces and keeps synchronized the line items backing
/// an invoice's total.
pub struct LedgerService {
    invoices: Arc<dyn InvoiceRepository>,
    sources: Arc<dyn ChargeSourceRepository>,
    calculator: FinancialCalculator,
}

impl LedgerService {
    pub fn new(
        invoices: Arc<dyn InvoiceRepository>,
        sources: Arc<dyn ChargeSourceRepository>,
    ) -> Self {
        Self {
            invoices,
            sources,
            calculator: FinancialCalculator::new(),
        }
    }

    /// Initiate billing for an admission
    pub async fn create_invoice(
        &self,
        admission_id: i64,
        tax_rate: Decimal,
        acting_staff: &str,
    ) -> Result<Invoice> {
        self.sources
            .admission_facts(admission_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Admission {}", admission_id)))?;

        let invoice = self.invoices.create_invoice(admission_id, tax_rate).await?;

        info!(
            invoice = %invoice.invoice_number,
            admission_id,
            staff = acting_staff,
            "Invoice created"
        );

        Ok(invoice)
    }

    pub async fn get_invoice(&self, invoice_id: i64) -> Result<(Invoice, Vec<LineItem>)> {
        let invoice = self
            .invoices
            .find_invoice(invoice_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Invoice {}", invoice_id)))?;
        let items = self.invoices.find_line_items(invoice_id).await?;
        Ok((invoice, items))
    }

    /// Room charges computed from the admission's occupancy history.
    ///
    /// days = ceiling of the occupied span (an open segment runs to now),
    /// charge = days × rate, total = Σ charges.
    pub async fn compute_room_charges(&self, admission_id: i64) -> Result<RoomChargeBreakdown> {
        let now = Utc::now();
        let segments = self.sources.occupancy_segments(admission_id).await?;

        let charges: Vec<RoomSegmentCharge> = segments
            .iter()
            .map(|segment| RoomSegmentCharge {
                segment_id: segment.id,
                room_label: segment.room_label.clone(),
                bed_label: segment.bed_label.clone(),
                days: segment.billable_days(now),
                rate_per_day: segment.rate_per_day,
                charge: segment.charge(now),
            })
            .collect();

        let total = charges.iter().map(|c| c.charge).sum();

        Ok(RoomChargeBreakdown {
            segments: charges,
            total,
        })
    }

    /// Ensure every eligible charge source is represented as a line item,
    /// then recompute the invoice total from the full current item set.
    ///
    /// Safe to call repeatedly: sources already materialized (by this or a
    /// concurrent call) are skipped. A category whose fetch fails is
    /// logged and left for the next sync; the other categories proceed.
    pub async fn sync_all(&self, invoice_id: i64) -> Result<SyncReport> {
        let invoice = self
            .invoices
            .find_invoice(invoice_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Invoice {}", invoice_id)))?;

        let existing = self.invoices.find_line_items(invoice_id).await?;
        let mut report = SyncReport::default();

        match self.sync_room_charges(&invoice, &existing).await {
            Ok(added) => report.room_items_added = added,
            Err(e) => {
                warn!(invoice_id, error = %e, "Room charge sync skipped");
                report.skipped_categories.push("room".to_string());
            }
        }

        match self.sync_medication_charges(&invoice, &existing).await {
            Ok(added) => report.medication_items_added = added,
            Err(e) => {
                warn!(invoice_id, error = %e, "Medication charge sync skipped");
                report.skipped_categories.push("medication".to_string());
            }
        }

        match self.sync_lab_charges(&invoice, &existing).await {
            Ok(added) => report.lab_items_added = added,
            Err(e) => {
                warn!(invoice_id, error = %e, "Lab charge sync skipped");
                report.skipped_categories.push("lab".to_string());
            }
        }

        report.total_amount = self.recompute_total(invoice_id).await?;

        info!(
            invoice_id,
            room = report.room_items_added,
            medication = report.medication_items_added,
            lab = report.lab_items_added,
            total = %report.total_amount,
            "Ledger sync complete"
        );

        Ok(report)
    }

    /// Materialize occupancy segments not yet present on the invoice
    async fn sync_room_charges(&self, invoice: &Invoice, existing: &[LineItem]) -> Result<u32> {
        let known = Self::reference_set(existing, LineItemType::Room);
        let now = Utc::now();
        let mut added = 0;

        for segment in self.sources.occupancy_segments(invoice.admission_id).await? {
            let reference = segment.id.to_string();
            if known.contains(reference.as_str()) {
                continue;
            }

            let item = ChargeSource::Room(segment).into_line_item(invoice.id, now)?;
            if self.invoices.insert_line_item(&item).await?.is_some() {
                added += 1;
            }
        }

        Ok(added)
    }

    /// Materialize medication aggregates with a positive charge
    async fn sync_medication_charges(
        &self,
        invoice: &Invoice,
        existing: &[LineItem],
    ) -> Result<u32> {
        let known = Self::reference_set(existing, LineItemType::Medication);
        let now = Utc::now();
        let mut added = 0;

        for aggregate in self
            .sources
            .medication_aggregates(invoice.admission_id)
            .await?
        {
            let reference = aggregate.id.to_string();
            if known.contains(reference.as_str()) {
                continue;
            }

            // Nothing administered yet is not billable
            if aggregate.charge() <= Decimal::ZERO {
                continue;
            }

            let item = ChargeSource::Medication(aggregate).into_line_item(invoice.id, now)?;
            if self.invoices.insert_line_item(&item).await?.is_some() {
                added += 1;
            }
        }

        Ok(added)
    }

    /// Materialize lab records whose billing status is `billed`
    async fn sync_lab_charges(&self, invoice: &Invoice, existing: &[LineItem]) -> Result<u32> {
        let known = Self::reference_set(existing, LineItemType::Lab);
        let now = Utc::now();
        let mut added = 0;

        for record in self
            .sources
            .lab_billing_records(invoice.admission_id)
            .await?
        {
            if record.billing_status != LabBillingStatus::Billed {
                continue;
            }

            let reference = record.id.to_string();
            if known.contains(reference.as_str()) {
                continue;
            }

            let item = ChargeSource::Lab(record).into_line_item(invoice.id, now)?;
            if self.invoices.insert_line_item(&item).await?.is_some() {
                added += 1;
            }
        }

        Ok(added)
    }

    /// Add a manually entered item. Custom items carry no reference and
    /// may repeat.
    pub async fn add_custom_item(
        &self,
        invoice_id: i64,
        name: String,
        description: Option<String>,
        quantity: Decimal,
        unit_price: Decimal,
        acting_staff: &str,
    ) -> Result<LineItem> {
        self.require_invoice(invoice_id).await?;

        let item = ChargeSource::Custom {
            name,
            description,
            quantity,
            unit_price,
        }
        .into_line_item(invoice_id, Utc::now())?;

        let stored = self
            .invoices
            .insert_line_item(&item)
            .await?
            .unwrap_or(item);
        let total = self.recompute_total(invoice_id).await?;

        info!(
            invoice_id,
            item = %stored.item_name,
            total = %total,
            staff = acting_staff,
            "Custom item added"
        );

        Ok(stored)
    }

    pub async fn update_item(
        &self,
        invoice_id: i64,
        item_id: i64,
        name: Option<String>,
        description: Option<String>,
        quantity: Option<Decimal>,
        unit_price: Option<Decimal>,
        acting_staff: &str,
    ) -> Result<LineItem> {
        let mut item = self
            .invoices
            .find_line_item(invoice_id, item_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Line item {} on invoice {}", item_id, invoice_id))
            })?;

        if let Some(name) = name {
            item.item_name = name;
        }
        if description.is_some() {
            item.item_description = description;
        }
        if let Some(quantity) = quantity {
            item.quantity = quantity;
        }
        if let Some(unit_price) = unit_price {
            item.unit_price = unit_price;
        }
        item.recalculate_total();

        if item.item_name.trim().is_empty() {
            return Err(AppError::validation("Line item name cannot be empty"));
        }
        if item.quantity <= Decimal::ZERO {
            return Err(AppError::validation("Quantity must be positive"));
        }
        if item.unit_price < Decimal::ZERO {
            return Err(AppError::validation("Unit price must be non-negative"));
        }

        self.invoices.update_line_item(&item).await?;
        let total = self.recompute_total(invoice_id).await?;

        info!(
            invoice_id,
            item_id,
            total = %total,
            staff = acting_staff,
            "Line item updated"
        );

        Ok(item)
    }

    pub async fn delete_item(
        &self,
        invoice_id: i64,
        item_id: i64,
        acting_staff: &str,
    ) -> Result<()> {
        self.require_invoice(invoice_id).await?;
        self.invoices.delete_line_item(invoice_id, item_id).await?;
        let total = self.recompute_total(invoice_id).await?;

        info!(
            invoice_id,
            item_id,
            total = %total,
            staff = acting_staff,
            "Line item deleted"
        );

        Ok(())
    }

    /// Update the invoice's discount descriptor and tax flag
    pub async fn set_discount(
        &self,
        invoice_id: i64,
        rule: DiscountRule,
        include_tax: bool,
        acting_staff: &str,
    ) -> Result<()> {
        self.require_invoice(invoice_id).await?;
        self.calculator.validate_discount(rule)?;

        let (discount_type, discount_value) = rule.as_parts();
        self.invoices
            .update_discount(invoice_id, discount_type, discount_value, include_tax)
            .await?;

        info!(
            invoice_id,
            discount_type,
            include_tax,
            staff = acting_staff,
            "Discount updated"
        );

        Ok(())
    }

    /// Record a payment and derive the new invoice status from the balance
    pub async fn record_payment(
        &self,
        invoice_id: i64,
        amount: Decimal,
        note: Option<String>,
        acting_staff: &str,
    ) -> Result<Invoice> {
        if amount <= Decimal::ZERO {
            return Err(AppError::validation("Payment amount must be positive"));
        }

        let (invoice, _) = self.get_invoice(invoice_id).await?;

        let totals = self.calculator.totals(
            invoice.total_amount,
            invoice.discount_rule(),
            invoice.include_tax,
            invoice.tax_rate,
            invoice.paid_amount,
        );

        let paid = invoice.paid_amount + amount;
        let status = Invoice::derive_status(paid, totals.payable);
        let paid_at = Utc::now();

        self.invoices
            .record_payment(invoice_id, paid, status, paid_at, note.as_deref())
            .await?;

        info!(
            invoice_id,
            amount = %amount,
            paid = %paid,
            status = %status,
            staff = acting_staff,
            "Payment recorded"
        );

        self.invoices
            .find_invoice(invoice_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Invoice {}", invoice_id)))
    }

    /// Recompute and persist the derived invoice total from the full
    /// current item set
    async fn recompute_total(&self, invoice_id: i64) -> Result<Decimal> {
        let items = self.invoices.find_line_items(invoice_id).await?;
        let total: Decimal = items.iter().map(|item| item.total_price).sum();
        self.invoices.update_total(invoice_id, total).await?;
        Ok(total)
    }

    async fn require_invoice(&self, invoice_id: i64) -> Result<Invoice> {
        self.invoices
            .find_invoice(invoice_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Invoice {}", invoice_id)))
    }

    fn reference_set(existing: &[LineItem], item_type: LineItemType) -> HashSet<&str> {
        existing
            .iter()
            .filter(|item| item.item_type == item_type)
            .filter_map(|item| item.reference_id.as_deref())
            .collect()
    }
}
