use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Invoice-level discount descriptor.
///
/// Stored on the invoice as a `(type, value)` pair and applied by the
/// financial calculator before tax.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "discount_type", content = "discount_value", rename_all = "lowercase")]
pub enum DiscountRule {
    None,
    /// Percentage of the subtotal, expressed as 0-100
    Percentage(Decimal),
    /// Fixed amount, clamped so the discounted subtotal never goes negative
    Fixed(Decimal),
}

impl DiscountRule {
    pub fn from_parts(discount_type: &str, value: Decimal) -> Option<Self> {
        match discount_type {
            "none" => Some(DiscountRule::None),
            "percentage" => Some(DiscountRule::Percentage(value)),
            "fixed" => Some(DiscountRule::Fixed(value)),
            _ => None,
        }
    }

    /// The `(type, value)` pair as persisted on the invoice record
    pub fn as_parts(&self) -> (&'static str, Decimal) {
        match self {
            DiscountRule::None => ("none", Decimal::ZERO),
            DiscountRule::Percentage(v) => ("percentage", *v),
            DiscountRule::Fixed(v) => ("fixed", *v),
        }
    }
}

impl Default for DiscountRule {
    fn default() -> Self {
        DiscountRule::None
    }
}
