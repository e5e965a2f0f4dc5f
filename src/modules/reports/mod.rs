// Report generation and merging module

pub mod controllers;
pub mod services;

pub use services::{
    AttachmentLocation, DocumentFetcher, DocumentStore, GeneratedDocument, InvoiceReportService,
    NotificationService, ReportMerger,
};
