// Financials module

pub mod models;
pub mod services;

pub use models::{DiscountRule, InvoiceTotals};
pub use services::FinancialCalculator;
