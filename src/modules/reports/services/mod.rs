pub mod invoice_report_service;
pub mod notification;
pub mod report_merger;

pub use invoice_report_service::{GeneratedDocument, InvoiceReportService};
pub use notification::{NotificationService, SmtpNotifier};
pub use report_merger::{
    merge_documents, AttachmentLocation, DocumentFetcher, DocumentStore, HttpDocumentFetcher,
    HttpDocumentStore, ReportMerger,
};
