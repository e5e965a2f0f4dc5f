use rust_decimal::Decimal;

use crate::core::error::AppError;
use crate::modules::financials::models::{DiscountRule, InvoiceTotals};

/// FinancialCalculator turns a ledger subtotal plus the invoice's
/// discount/tax settings into payable/paid/balance figures.
///
/// The cascade order is a business rule: discount first, then tax on the
/// discounted amount. Reordering changes the payable figure.
pub struct FinancialCalculator;

impl FinancialCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Discount portion of the subtotal for the given rule.
    ///
    /// A fixed discount is clamped to the subtotal so the discounted
    /// amount can never go negative.
    pub fn discount_amount(&self, subtotal: Decimal, rule: DiscountRule) -> Decimal {
        match rule {
            DiscountRule::None => Decimal::ZERO,
            DiscountRule::Percentage(percent) => subtotal * percent / Decimal::from(100),
            DiscountRule::Fixed(amount) => amount.min(subtotal),
        }
    }

    /// Run the full cascade:
    /// discount → discounted subtotal → tax → payable → balance.
    ///
    /// No rounding happens here; intermediate values stay exact.
    pub fn totals(
        &self,
        subtotal: Decimal,
        rule: DiscountRule,
        include_tax: bool,
        tax_rate: Decimal,
        paid: Decimal,
    ) -> InvoiceTotals {
        let discount_amount = self.discount_amount(subtotal, rule);
        let discounted_subtotal = subtotal - discount_amount;

        let applied_rate = if include_tax { tax_rate } else { Decimal::ZERO };
        let tax_amount = discounted_subtotal * applied_rate;

        let payable = discounted_subtotal + tax_amount;
        let balance = payable - paid;

        InvoiceTotals {
            subtotal,
            discount_amount,
            discounted_subtotal,
            tax_amount,
            tax_rate: applied_rate,
            payable,
            paid,
            balance,
        }
    }

    /// Validate a discount descriptor before it is stored on an invoice
    pub fn validate_discount(&self, rule: DiscountRule) -> Result<(), AppError> {
        match rule {
            DiscountRule::None => Ok(()),
            DiscountRule::Percentage(percent) => {
                if percent < Decimal::ZERO {
                    return Err(AppError::Validation(
                        "Discount percentage cannot be negative".to_string(),
                    ));
                }
                if percent > Decimal::from(100) {
                    return Err(AppError::Validation(
                        "Discount percentage cannot exceed 100".to_string(),
                    ));
                }
                Ok(())
            }
            DiscountRule::Fixed(amount) => {
                if amount < Decimal::ZERO {
                    return Err(AppError::Validation(
                        "Fixed discount cannot be negative".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }

    /// Validate a fractional tax rate (0 to 1.0)
    pub fn validate_tax_rate(&self, tax_rate: Decimal) -> Result<(), AppError> {
        if tax_rate < Decimal::ZERO {
            return Err(AppError::Validation(
                "Tax rate cannot be negative".to_string(),
            ));
        }

        if tax_rate > Decimal::ONE {
            return Err(AppError::Validation(
                "Tax rate cannot exceed 1.0 (100%)".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for FinancialCalculator {
    fn default() -> Self {
        Self::new()
    }
}
