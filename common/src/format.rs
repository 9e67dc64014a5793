//! Numeric formatting for conversion display text.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places shown for amounts.
pub const AMOUNT_DECIMALS: u32 = 2;

/// Decimal places shown for unit rates.
pub const RATE_DECIMALS: usize = 6;

/// Round a value to two decimal places, half away from zero.
///
/// Values outside the decimal range are returned unchanged.
pub fn round_amount(value: f64) -> f64 {
    match Decimal::from_f64(value) {
        Some(d) => {
            d.round_dp_with_strategy(AMOUNT_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
                .to_f64()
                .unwrap_or(value)
        }
        None => value,
    }
}

/// Format an amount with thousands separators and exactly two decimals,
/// e.g. `1234567.891` becomes `1,234,567.89`.
pub fn format_amount(value: f64) -> String {
    let fixed = match Decimal::from_f64(value) {
        Some(d) => {
            let mut rounded =
                d.round_dp_with_strategy(AMOUNT_DECIMALS, RoundingStrategy::MidpointAwayFromZero);
            rounded.rescale(AMOUNT_DECIMALS);
            rounded.to_string()
        }
        None => format!("{:.*}", AMOUNT_DECIMALS as usize, value),
    };
    group_thousands(&fixed)
}

/// Format a unit rate with six decimals and no grouping.
pub fn format_rate(rate: f64) -> String {
    format!("{:.*}", RATE_DECIMALS, rate)
}

/// Insert `,` separators into the integer part of a plain decimal string.
fn group_thousands(fixed: &str) -> String {
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}
