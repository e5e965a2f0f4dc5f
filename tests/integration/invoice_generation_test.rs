// End-to-end invoice generation against in-memory stores: sync → cascade
// → compose → merge, producing a parseable PDF with the right filename.

#[path = "../common/fakes.rs"]
mod fakes;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use chrono::{Duration, Utc};
use lopdf::Document;
use rust_decimal_macros::dec;

use fakes::{
    admission_facts, make_pdf, FakeDocumentFetcher, FakeDocumentStore,
    InMemoryChargeSourceRepository, InMemoryInvoiceRepository,
};
use medibill::modules::composer::{
    ComposeOptions, DocumentComposer, HospitalIdentity, NarrativeSection,
};
use medibill::modules::financials::DiscountRule;
use medibill::modules::ledger::models::{
    LabBillingRecord, LabBillingStatus, MedicationAggregate, OccupancySegment,
};
use medibill::modules::ledger::services::LedgerService;
use medibill::modules::reports::services::{InvoiceReportService, ReportMerger};

const ADMISSION: i64 = 7;

struct Harness {
    invoices: Arc<InMemoryInvoiceRepository>,
    sources: Arc<InMemoryChargeSourceRepository>,
    fetcher: Arc<FakeDocumentFetcher>,
    ledger: Arc<LedgerService>,
    reports: InvoiceReportService,
}

fn identity() -> HospitalIdentity {
    HospitalIdentity {
        name: "Lakeside General Hospital".to_string(),
        address: "2 Hill Road, Pune 411001".to_string(),
        contact: "billing@lakeside.example | +91 20 5550 1234".to_string(),
        currency_symbol: "Rs.".to_string(),
    }
}

fn harness() -> Harness {
    let invoices = Arc::new(InMemoryInvoiceRepository::new());
    let sources =
        Arc::new(InMemoryChargeSourceRepository::new().with_admission(admission_facts(ADMISSION)));

    sources.segments.lock().unwrap().push(OccupancySegment {
        id: 1,
        admission_id: ADMISSION,
        room_label: "Ward B".to_string(),
        bed_label: "Bed 12".to_string(),
        rate_per_day: dec!(1500),
        start_date: Utc::now() - Duration::days(2),
        end_date: None,
    });

    sources.medications.lock().unwrap().push(MedicationAggregate {
        id: 10,
        admission_id: ADMISSION,
        medication_name: "Amoxicillin 500mg".to_string(),
        price_per_unit: dec!(25),
        units_per_dose: dec!(2),
        doses_administered: 6,
    });

    sources.labs.lock().unwrap().push(LabBillingRecord {
        id: 20,
        admission_id: ADMISSION,
        test_name: "Complete Blood Count".to_string(),
        price: dec!(450),
        billing_status: LabBillingStatus::Billed,
        report_key: Some("lab-reports/cbc-20.pdf".to_string()),
    });

    let ledger = Arc::new(LedgerService::new(invoices.clone(), sources.clone()));

    let fetcher = Arc::new(FakeDocumentFetcher::new());
    let merger = ReportMerger::new(fetcher.clone(), Arc::new(FakeDocumentStore));
    let composer = DocumentComposer::new(identity());

    let reports = InvoiceReportService::new(ledger.clone(), sources.clone(), composer, merger);

    Harness {
        invoices,
        sources,
        fetcher,
        ledger,
        reports,
    }
}

#[tokio::test]
async fn test_generates_a_parseable_invoice_pdf() {
    let h = harness();
    let invoice = h
        .ledger
        .create_invoice(ADMISSION, dec!(0.18), "tester")
        .await
        .unwrap();

    let document = h
        .reports
        .generate(invoice.id, false, ComposeOptions::default())
        .await
        .unwrap();

    assert_eq!(document.filename, format!("invoice-{}.pdf", invoice.invoice_number));
    assert_eq!(document.content_type, "application/pdf");

    let parsed = Document::load_mem(&document.bytes).expect("composed PDF parses");
    assert!(!parsed.get_pages().is_empty());
}

#[tokio::test]
async fn test_generation_syncs_the_ledger_first() {
    let h = harness();
    let invoice = h
        .ledger
        .create_invoice(ADMISSION, dec!(0.18), "tester")
        .await
        .unwrap();

    // No explicit sync call: generation must not render stale totals
    h.reports
        .generate(invoice.id, false, ComposeOptions::default())
        .await
        .unwrap();

    let (stored, items) = h.ledger.get_invoice(invoice.id).await.unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(stored.total_amount, dec!(5250));
    assert_eq!(
        stored.total_amount,
        h.invoices
            .line_items_of(invoice.id)
            .iter()
            .map(|i| i.total_price)
            .sum()
    );
}

#[tokio::test]
async fn test_with_reports_appends_stored_lab_documents() {
    let h = harness();
    h.fetcher.serve(
        "https://store.test/lab-reports/cbc-20.pdf",
        make_pdf("CBCREPORT"),
    );

    let invoice = h
        .ledger
        .create_invoice(ADMISSION, dec!(0.18), "tester")
        .await
        .unwrap();

    let document = h
        .reports
        .generate(invoice.id, true, ComposeOptions::default())
        .await
        .unwrap();

    assert_eq!(
        document.filename,
        format!("invoice-{}-with-reports.pdf", invoice.invoice_number)
    );

    let invoice_only = h
        .reports
        .generate(invoice.id, false, ComposeOptions::default())
        .await
        .unwrap();

    let merged_pages = Document::load_mem(&document.bytes).unwrap().get_pages().len();
    let base_pages = Document::load_mem(&invoice_only.bytes).unwrap().get_pages().len();
    assert_eq!(merged_pages, base_pages + 1);
}

#[tokio::test]
async fn test_unreachable_report_degrades_to_invoice_only() {
    let h = harness();
    // Nothing served: the stored lab report cannot be fetched

    let invoice = h
        .ledger
        .create_invoice(ADMISSION, dec!(0.18), "tester")
        .await
        .unwrap();

    let document = h
        .reports
        .generate(invoice.id, true, ComposeOptions::default())
        .await
        .expect("generation succeeds without the attachment");

    let parsed = Document::load_mem(&document.bytes).expect("output parses");
    assert!(!parsed.get_pages().is_empty());
}

#[tokio::test]
async fn test_narrative_page_is_appended_when_requested() {
    let h = harness();
    let invoice = h
        .ledger
        .create_invoice(ADMISSION, dec!(0.18), "tester")
        .await
        .unwrap();

    let plain = h
        .reports
        .generate(invoice.id, false, ComposeOptions::default())
        .await
        .unwrap();

    let options = ComposeOptions {
        collapse_summary: false,
        narrative: vec![NarrativeSection {
            title: "Course in Hospital".to_string(),
            body: "Admitted with community acquired pneumonia. Responded well to \
                   intravenous antibiotics and was afebrile from day three onwards."
                .to_string(),
        }],
    };
    let with_narrative = h.reports.generate(invoice.id, false, options).await.unwrap();

    let plain_pages = Document::load_mem(&plain.bytes).unwrap().get_pages().len();
    let narrative_pages = Document::load_mem(&with_narrative.bytes)
        .unwrap()
        .get_pages()
        .len();
    assert_eq!(narrative_pages, plain_pages + 1);
}

#[tokio::test]
async fn test_discount_and_payment_flow_into_the_document_run() {
    let h = harness();
    let invoice = h
        .ledger
        .create_invoice(ADMISSION, dec!(0.18), "tester")
        .await
        .unwrap();
    h.ledger.sync_all(invoice.id).await.unwrap();

    h.ledger
        .set_discount(
            invoice.id,
            DiscountRule::Percentage(dec!(10)),
            true,
            "tester",
        )
        .await
        .unwrap();
    h.ledger
        .record_payment(invoice.id, dec!(1000), None, "tester")
        .await
        .unwrap();

    let document = h
        .reports
        .generate(invoice.id, false, ComposeOptions::default())
        .await
        .unwrap();
    assert!(Document::load_mem(&document.bytes).is_ok());
}

#[tokio::test]
async fn test_generation_for_unknown_invoice_fails_fast() {
    let h = harness();
    let result = h
        .reports
        .generate(404, false, ComposeOptions::default())
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_partial_source_failure_still_generates() {
    let h = harness();
    h.sources.fail_medications.store(true, Ordering::SeqCst);

    let invoice = h
        .ledger
        .create_invoice(ADMISSION, dec!(0.18), "tester")
        .await
        .unwrap();

    let document = h
        .reports
        .generate(invoice.id, false, ComposeOptions::default())
        .await
        .expect("one unreachable category does not abort generation");

    assert!(Document::load_mem(&document.bytes).is_ok());

    let (_, items) = h.ledger.get_invoice(invoice.id).await.unwrap();
    // Room and lab items synced; medication skipped this run
    assert_eq!(items.len(), 2);
}
