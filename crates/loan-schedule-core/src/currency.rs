use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::types::Money;

/// Smallest currency unit. Balances below this are treated as settled.
pub const CENT: Money = dec!(0.01);

/// Round to the cent, half away from zero.
///
/// Applied to every currency value the schedule produces, not only at the
/// end: the last row's remainder depends on the exact rounded values of the
/// rows before it.
pub fn round2(value: Decimal) -> Money {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Render an amount with two decimals and optional digit grouping.
///
/// `format_amount(dec!(-1234567.891), Some(','))` gives `-1,234,567.89`.
pub fn format_amount(amount: Money, thousands_separator: Option<char>) -> String {
    let rounded = round2(amount);
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let grouped = match thousands_separator {
        Some(sep) => group_digits(int_part, sep),
        None => int_part.to_string(),
    };

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{frac_part}")
}

fn group_digits(digits: &str, sep: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(ch);
    }
    out
}
