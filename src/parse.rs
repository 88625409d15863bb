//! Free-text input parsers for conversation steps.
//!
//! Monetary amounts accept either comma or dot as the decimal separator and
//! spaces as thousands separators ("15 000,50" and "15000.50" are the same
//! value). Interest rates accept the same separators but intentionally carry
//! no range check beyond being numeric.

use rust_decimal::Decimal;

/// Parse a monetary amount. Rejects non-numeric, zero, and negative input.
pub fn parse_amount(input: &str) -> Option<Decimal> {
    let cleaned = input.trim().replace(' ', "").replace(',', ".");
    let value = cleaned.parse::<Decimal>().ok()?;
    (value > Decimal::ZERO).then_some(value)
}

/// Parse a percentage rate. Numeric-only check, no bounds.
pub fn parse_rate(input: &str) -> Option<Decimal> {
    input.trim().replace(',', ".").parse::<Decimal>().ok()
}

/// Parse a day of month, accepting exactly the integers 1..=31.
pub fn parse_day(input: &str) -> Option<u8> {
    let day = input.trim().parse::<u8>().ok()?;
    (1..=31).contains(&day).then_some(day)
}
