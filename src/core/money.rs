use rust_decimal::Decimal;

/// Decimal places used for all displayed monetary values.
///
/// Intermediate cascade values (discount, tax, payable) stay unrounded;
/// rounding happens once, at the display/output boundary.
pub const DISPLAY_SCALE: u32 = 2;

/// Rounds an amount to the display scale (banker's rounding, 2 dp).
pub fn round_display(amount: Decimal) -> Decimal {
    amount.round_dp(DISPLAY_SCALE)
}

/// Formats an amount for document output with exactly two decimal places.
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", round_display(amount))
}

/// Formats an amount with the configured currency symbol prefix.
pub fn format_amount_with_symbol(symbol: &str, amount: Decimal) -> String {
    format!("{} {}", symbol, format_amount(amount))
}

/// Converts a percentage value (e.g. 18) into its fractional rate (0.18).
pub fn percent_to_rate(percent: Decimal) -> Decimal {
    percent / Decimal::from(100)
}
