// Shared in-memory fakes for the repository and collaborator traits.
//
// The invoice fake enforces the same (invoice_id, item_type, reference_id)
// uniqueness the backing store does, so sync tests exercise the real dedup
// contract.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use medibill::core::{AppError, Result};
use medibill::modules::ledger::models::{
    AdmissionFacts, Invoice, InvoiceStatus, LabBillingRecord, LineItem, MedicationAggregate,
    OccupancySegment,
};
use medibill::modules::ledger::repositories::{ChargeSourceRepository, InvoiceRepository};
use medibill::modules::reports::services::{DocumentFetcher, DocumentStore};

#[derive(Default)]
struct InvoiceState {
    invoices: HashMap<i64, Invoice>,
    items: HashMap<i64, LineItem>,
    next_invoice_id: i64,
    next_item_id: i64,
}

/// In-memory stand-in for the MySQL invoice repository
#[derive(Default)]
pub struct InMemoryInvoiceRepository {
    state: Mutex<InvoiceState>,
}

impl InMemoryInvoiceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line_items_of(&self, invoice_id: i64) -> Vec<LineItem> {
        let state = self.state.lock().unwrap();
        let mut items: Vec<LineItem> = state
            .items
            .values()
            .filter(|item| item.invoice_id == invoice_id)
            .cloned()
            .collect();
        items.sort_by_key(|item| item.id);
        items
    }
}

#[async_trait]
impl InvoiceRepository for InMemoryInvoiceRepository {
    async fn create_invoice(&self, admission_id: i64, tax_rate: Decimal) -> Result<Invoice> {
        let mut state = self.state.lock().unwrap();
        state.next_invoice_id += 1;
        let id = state.next_invoice_id;

        let now = Utc::now();
        let invoice = Invoice {
            id,
            admission_id,
            invoice_number: format!("INV-{:06}", id),
            status: InvoiceStatus::Pending,
            total_amount: Decimal::ZERO,
            discount_type: "none".to_string(),
            discount_value: Decimal::ZERO,
            include_tax: true,
            tax_rate,
            paid_amount: Decimal::ZERO,
            last_payment_date: None,
            payment_note: None,
            created_at: now,
            updated_at: now,
        };

        state.invoices.insert(id, invoice.clone());
        Ok(invoice)
    }

    async fn find_invoice(&self, id: i64) -> Result<Option<Invoice>> {
        Ok(self.state.lock().unwrap().invoices.get(&id).cloned())
    }

    async fn find_line_items(&self, invoice_id: i64) -> Result<Vec<LineItem>> {
        Ok(self.line_items_of(invoice_id))
    }

    async fn find_line_item(&self, invoice_id: i64, item_id: i64) -> Result<Option<LineItem>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .items
            .get(&item_id)
            .filter(|item| item.invoice_id == invoice_id)
            .cloned())
    }

    async fn insert_line_item(&self, item: &LineItem) -> Result<Option<LineItem>> {
        let mut state = self.state.lock().unwrap();

        // Enforce the store-level dedup key
        if let Some(reference) = item.reference_id.as_deref() {
            let duplicate = state.items.values().any(|existing| {
                existing.invoice_id == item.invoice_id
                    && existing.item_type == item.item_type
                    && existing.reference_id.as_deref() == Some(reference)
            });
            if duplicate {
                return Ok(None);
            }
        }

        state.next_item_id += 1;
        let mut stored = item.clone();
        stored.id = state.next_item_id;
        state.items.insert(stored.id, stored.clone());
        Ok(Some(stored))
    }

    async fn update_line_item(&self, item: &LineItem) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.items.insert(item.id, item.clone());
        Ok(())
    }

    async fn delete_line_item(&self, invoice_id: i64, item_id: i64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match state.items.get(&item_id) {
            Some(item) if item.invoice_id == invoice_id => {
                state.items.remove(&item_id);
                Ok(())
            }
            _ => Err(AppError::not_found(format!(
                "Line item {} on invoice {}",
                item_id, invoice_id
            ))),
        }
    }

    async fn update_total(&self, invoice_id: i64, total: Decimal) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(invoice) = state.invoices.get_mut(&invoice_id) {
            invoice.total_amount = total;
            invoice.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_discount(
        &self,
        invoice_id: i64,
        discount_type: &str,
        discount_value: Decimal,
        include_tax: bool,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(invoice) = state.invoices.get_mut(&invoice_id) {
            invoice.discount_type = discount_type.to_string();
            invoice.discount_value = discount_value;
            invoice.include_tax = include_tax;
        }
        Ok(())
    }

    async fn record_payment(
        &self,
        invoice_id: i64,
        paid_amount: Decimal,
        status: InvoiceStatus,
        paid_at: DateTime<Utc>,
        note: Option<&str>,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(invoice) = state.invoices.get_mut(&invoice_id) {
            invoice.paid_amount = paid_amount;
            invoice.status = status;
            invoice.last_payment_date = Some(paid_at);
            if let Some(note) = note {
                invoice.payment_note = Some(note.to_string());
            }
        }
        Ok(())
    }
}

/// In-memory charge source store with per-category failure switches
#[derive(Default)]
pub struct InMemoryChargeSourceRepository {
    pub segments: Mutex<Vec<OccupancySegment>>,
    pub medications: Mutex<Vec<MedicationAggregate>>,
    pub labs: Mutex<Vec<LabBillingRecord>>,
    pub facts: Mutex<HashMap<i64, AdmissionFacts>>,
    pub fail_rooms: AtomicBool,
    pub fail_medications: AtomicBool,
    pub fail_labs: AtomicBool,
}

impl InMemoryChargeSourceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_admission(self, facts: AdmissionFacts) -> Self {
        self.facts.lock().unwrap().insert(facts.admission_id, facts);
        self
    }
}

#[async_trait]
impl ChargeSourceRepository for InMemoryChargeSourceRepository {
    async fn occupancy_segments(&self, admission_id: i64) -> Result<Vec<OccupancySegment>> {
        if self.fail_rooms.load(Ordering::SeqCst) {
            return Err(AppError::internal("occupancy store unreachable"));
        }
        Ok(self
            .segments
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.admission_id == admission_id)
            .cloned()
            .collect())
    }

    async fn medication_aggregates(&self, admission_id: i64) -> Result<Vec<MedicationAggregate>> {
        if self.fail_medications.load(Ordering::SeqCst) {
            return Err(AppError::internal("medication store unreachable"));
        }
        Ok(self
            .medications
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.admission_id == admission_id)
            .cloned()
            .collect())
    }

    async fn lab_billing_records(&self, admission_id: i64) -> Result<Vec<LabBillingRecord>> {
        if self.fail_labs.load(Ordering::SeqCst) {
            return Err(AppError::internal("lab store unreachable"));
        }
        Ok(self
            .labs
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.admission_id == admission_id)
            .cloned()
            .collect())
    }

    async fn admission_facts(&self, admission_id: i64) -> Result<Option<AdmissionFacts>> {
        Ok(self.facts.lock().unwrap().get(&admission_id).cloned())
    }
}

/// Fetcher serving canned responses per URL; unknown URLs fail
#[derive(Default)]
pub struct FakeDocumentFetcher {
    pub responses: Mutex<HashMap<String, Vec<u8>>>,
    /// Per-URL artificial delay, to shuffle completion order
    pub delays_ms: Mutex<HashMap<String, u64>>,
}

impl FakeDocumentFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, url: &str, bytes: Vec<u8>) {
        self.responses.lock().unwrap().insert(url.to_string(), bytes);
    }

    pub fn delay(&self, url: &str, millis: u64) {
        self.delays_ms.lock().unwrap().insert(url.to_string(), millis);
    }
}

#[async_trait]
impl DocumentFetcher for FakeDocumentFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let delay = self.delays_ms.lock().unwrap().get(url).copied();
        if let Some(millis) = delay {
            tokio::time::sleep(std::time::Duration::from_millis(millis)).await;
        }

        let response = self.responses.lock().unwrap().get(url).cloned();
        response.ok_or_else(|| AppError::storage(format!("fetch failed for {}", url)))
    }
}

/// Store resolving every key to a deterministic fake URL
#[derive(Default)]
pub struct FakeDocumentStore;

#[async_trait]
impl DocumentStore for FakeDocumentStore {
    async fn resolve_signed_url(&self, key: &str) -> Result<String> {
        Ok(format!("https://store.test/{}", key))
    }
}

/// Minimal single-page PDF carrying `text`, built object by object
pub fn make_pdf(text: &str) -> Vec<u8> {
    use lopdf::dictionary;
    use lopdf::{Document, Object, Stream};

    let mut doc = Document::with_version("1.4");

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let content = format!("BT /F1 12 Tf 100 700 Td ({text}) Tj ET");
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

    let resources = dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    };

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Contents" => content_id,
        "Resources" => resources,
    });

    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
    });

    if let Some(Ok(dict)) = doc
        .objects
        .get_mut(&page_id)
        .map(|object| object.as_dict_mut())
    {
        dict.set("Parent", Object::Reference(pages_id));
    }

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("fixture PDF serializes");
    bytes
}

/// Admission facts fixture
pub fn admission_facts(admission_id: i64) -> AdmissionFacts {
    use chrono::TimeZone;

    AdmissionFacts {
        admission_id,
        admission_number: format!("ADM-{:04}", admission_id),
        patient_name: "Asha Rao".to_string(),
        patient_code: "PAT-0091".to_string(),
        date_of_birth: Some(Utc.with_ymd_and_hms(1984, 2, 11, 0, 0, 0).unwrap()),
        gender: "F".to_string(),
        address: "14 Lakeview Road, Pune".to_string(),
        room_label: "Ward B".to_string(),
        bed_label: "Bed 12".to_string(),
        attending_clinician: "Dr. Kulkarni".to_string(),
        admitted_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap(),
    }
}
