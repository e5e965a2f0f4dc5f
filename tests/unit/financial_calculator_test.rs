// Discount/tax cascade laws.
//
// The fixed order (discount first, tax on the discounted amount) is a
// business rule; the exact-value tests pin it, the property tests cover
// the cascade across the input space.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use medibill::core::money;
use medibill::modules::financials::{DiscountRule, FinancialCalculator};

#[test]
fn test_discount_before_tax_order_law() {
    let calculator = FinancialCalculator::new();
    let totals = calculator.totals(
        dec!(1000),
        DiscountRule::Percentage(dec!(10)),
        true,
        dec!(0.18),
        Decimal::ZERO,
    );

    // Tax is computed on the discounted amount, not the raw subtotal
    assert_eq!(totals.discount_amount, dec!(100));
    assert_eq!(totals.discounted_subtotal, dec!(900));
    assert_eq!(totals.tax_amount, dec!(162));
    assert_eq!(totals.payable, dec!(1062));
}

#[test]
fn test_fixed_discount_clamps_to_subtotal() {
    let calculator = FinancialCalculator::new();
    let totals = calculator.totals(
        dec!(500),
        DiscountRule::Fixed(dec!(800)),
        false,
        dec!(0.18),
        Decimal::ZERO,
    );

    assert_eq!(totals.discount_amount, dec!(500));
    assert_eq!(totals.discounted_subtotal, Decimal::ZERO);
    assert_eq!(totals.payable, Decimal::ZERO);
}

#[test]
fn test_tax_excluded_is_zero() {
    let calculator = FinancialCalculator::new();
    let totals = calculator.totals(
        dec!(1000),
        DiscountRule::None,
        false,
        dec!(0.18),
        Decimal::ZERO,
    );

    assert_eq!(totals.tax_amount, Decimal::ZERO);
    assert_eq!(totals.payable, dec!(1000));
}

#[test]
fn test_balance_may_go_negative_on_overpayment() {
    let calculator = FinancialCalculator::new();
    let totals = calculator.totals(dec!(100), DiscountRule::None, false, dec!(0.18), dec!(150));

    assert_eq!(totals.balance, dec!(-50));
    assert!(totals.is_settled());
}

#[test]
fn test_rounding_happens_only_at_display() {
    let calculator = FinancialCalculator::new();
    let totals = calculator.totals(
        dec!(99.99),
        DiscountRule::Percentage(dec!(3.33)),
        true,
        dec!(0.18),
        Decimal::ZERO,
    );

    // Intermediate values stay exact; only the display helper rounds
    assert!(totals.discount_amount.scale() > 2);
    assert_eq!(money::round_display(totals.discount_amount).scale(), 2);
}

#[test]
fn test_discount_validation() {
    let calculator = FinancialCalculator::new();
    assert!(calculator
        .validate_discount(DiscountRule::Percentage(dec!(101)))
        .is_err());
    assert!(calculator
        .validate_discount(DiscountRule::Percentage(dec!(-1)))
        .is_err());
    assert!(calculator
        .validate_discount(DiscountRule::Fixed(dec!(-10)))
        .is_err());
    assert!(calculator
        .validate_discount(DiscountRule::Percentage(dec!(100)))
        .is_ok());
    assert!(calculator.validate_discount(DiscountRule::None).is_ok());
}

#[test]
fn test_tax_rate_validation() {
    let calculator = FinancialCalculator::new();
    assert!(calculator.validate_tax_rate(dec!(0.18)).is_ok());
    assert!(calculator.validate_tax_rate(Decimal::ONE).is_ok());
    assert!(calculator.validate_tax_rate(dec!(1.01)).is_err());
    assert!(calculator.validate_tax_rate(dec!(-0.1)).is_err());
}

proptest! {
    #[test]
    fn test_cascade_is_deterministic(
        subtotal in 0u64..1_000_000_000u64,
        percent in 0u8..=100u8,
        paid in 0u64..1_000_000u64
    ) {
        let calculator = FinancialCalculator::new();
        let subtotal = Decimal::from(subtotal);
        let rule = DiscountRule::Percentage(Decimal::from(percent));
        let paid = Decimal::from(paid);

        let first = calculator.totals(subtotal, rule, true, dec!(0.18), paid);
        let second = calculator.totals(subtotal, rule, true, dec!(0.18), paid);

        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_discount_never_exceeds_subtotal(
        subtotal in 0u64..1_000_000_000u64,
        fixed in 0u64..2_000_000_000u64
    ) {
        let calculator = FinancialCalculator::new();
        let subtotal = Decimal::from(subtotal);

        let discount =
            calculator.discount_amount(subtotal, DiscountRule::Fixed(Decimal::from(fixed)));

        prop_assert!(discount <= subtotal);
        prop_assert!(discount >= Decimal::ZERO);
    }

    #[test]
    fn test_payable_is_never_negative(
        subtotal in 0u64..1_000_000_000u64,
        percent in 0u8..=100u8,
        include_tax in any::<bool>()
    ) {
        let calculator = FinancialCalculator::new();
        let totals = calculator.totals(
            Decimal::from(subtotal),
            DiscountRule::Percentage(Decimal::from(percent)),
            include_tax,
            dec!(0.18),
            Decimal::ZERO,
        );

        prop_assert!(totals.payable >= Decimal::ZERO);
    }

    #[test]
    fn test_tax_applies_to_discounted_amount(
        subtotal in 1u64..1_000_000u64,
        percent in 1u8..100u8
    ) {
        let calculator = FinancialCalculator::new();
        let subtotal = Decimal::from(subtotal);
        let rule = DiscountRule::Percentage(Decimal::from(percent));

        let totals = calculator.totals(subtotal, rule, true, dec!(0.18), Decimal::ZERO);

        // payable == discounted × 1.18 exactly, which can only hold when
        // tax was taken after the discount
        prop_assert_eq!(totals.payable, totals.discounted_subtotal * dec!(1.18));
        prop_assert!(totals.tax_amount <= subtotal * dec!(0.18));
    }

    #[test]
    fn test_no_discount_means_payable_equals_subtotal(
        subtotal in 0u64..1_000_000_000u64
    ) {
        let calculator = FinancialCalculator::new();
        let subtotal = Decimal::from(subtotal);

        let totals =
            calculator.totals(subtotal, DiscountRule::None, false, dec!(0.18), Decimal::ZERO);

        prop_assert_eq!(totals.payable, subtotal);
        prop_assert_eq!(totals.balance, subtotal);
    }
}
