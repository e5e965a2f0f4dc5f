// Document Composer module

pub mod layout;
pub mod models;
pub mod services;

pub use models::{ComposeOptions, HospitalIdentity, InvoiceDocumentData, NarrativeSection};
pub use services::DocumentComposer;
