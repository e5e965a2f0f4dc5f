// Charge Ledger module

pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{Invoice, InvoiceStatus, LineItem, LineItemType};
pub use repositories::{ChargeSourceRepository, InvoiceRepository};
pub use services::LedgerService;
