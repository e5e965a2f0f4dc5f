pub mod discount;
pub mod totals;

pub use discount::DiscountRule;
pub use totals::InvoiceTotals;
