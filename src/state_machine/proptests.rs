//! Property tests for input parsing and payload encoding.

use crate::parse::{parse_amount, parse_day};
use crate::state_machine::ButtonPayload;
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Render `whole.frac` the way users type it: spaces as thousands
/// separators, a comma before the fraction.
fn grouped_input(whole: u64, frac: u8) -> String {
    let digits = whole.to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    format!("{grouped},{frac:02}")
}

proptest! {
    #[test]
    fn grouped_comma_amounts_parse_like_canonical(whole in 1u64..1_000_000_000, frac in 0u8..100) {
        let canonical = format!("{whole}.{frac:02}").parse::<Decimal>().unwrap();
        prop_assert_eq!(parse_amount(&grouped_input(whole, frac)), Some(canonical));
    }

    #[test]
    fn amounts_are_strictly_positive(whole in 0u64..1_000_000) {
        let negative = format!("-{whole}");
        prop_assert_eq!(parse_amount(&negative), None);
        prop_assert_eq!(parse_amount("0"), None);
        prop_assert_eq!(parse_amount("0,00"), None);
    }

    #[test]
    fn day_accepts_exactly_one_through_thirty_one(day in 0u32..200) {
        let parsed = parse_day(&day.to_string());
        if (1..=31).contains(&day) {
            prop_assert_eq!(parsed, Some(day as u8));
        } else {
            prop_assert_eq!(parsed, None);
        }
    }

    #[test]
    fn arbitrary_text_never_panics_the_parsers(input in ".*") {
        let _ = parse_amount(&input);
        let _ = parse_day(&input);
        let _ = ButtonPayload::decode(&input);
    }

    #[test]
    fn debt_payload_round_trips_any_id(id in proptest::num::i64::ANY) {
        let payload = ButtonPayload::Debt(id);
        prop_assert_eq!(ButtonPayload::decode(&payload.encode()), payload);
    }
}
