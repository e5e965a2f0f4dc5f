use rust_decimal::Decimal;
use serde::Serialize;

/// Output of the discount/tax cascade for one invoice.
///
/// All values are unrounded; display rounding happens at the output
/// boundary (`core::money`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InvoiceTotals {
    /// Sum of line item totals (the ledger subtotal)
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub discounted_subtotal: Decimal,
    pub tax_amount: Decimal,
    /// Fractional tax rate actually applied (zero when tax is excluded)
    pub tax_rate: Decimal,
    pub payable: Decimal,
    pub paid: Decimal,
    /// payable − paid; negative on overpayment
    pub balance: Decimal,
}

impl InvoiceTotals {
    pub fn is_settled(&self) -> bool {
        self.balance <= Decimal::ZERO
    }
}
