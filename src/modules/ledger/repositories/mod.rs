pub mod charge_source_repository;
pub mod invoice_repository;

pub use charge_source_repository::{ChargeSourceRepository, MySqlChargeSourceRepository};
pub use invoice_repository::{InvoiceRepository, MySqlInvoiceRepository};
