pub mod document;

pub use document::{
    age_years, ComposeOptions, HospitalIdentity, InvoiceDocumentData, NarrativeSection,
};
