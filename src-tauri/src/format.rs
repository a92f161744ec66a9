use chrono::NaiveDateTime;
use rust_decimal::{Decimal, RoundingStrategy};

/// Two decimals of the exact binary value, ties away from zero.
fn two_places(value: f64) -> String {
    match Decimal::from_f64_retain(value.abs()) {
        Some(exact) => {
            let rounded = exact.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            format!("{rounded:.2}")
        }
        None => format!("{:.2}", value.abs()),
    }
}

/// `R$ 1.234,56` the way pt-BR browsers render BRL (non-breaking space after
/// the symbol, minus sign in front of it).
pub fn currency_brl(value: f64) -> String {
    let cents = two_places(value);
    let (integer, fraction) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (index, digit) in integer.chars().enumerate() {
        if index > 0 && (integer.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && cents != "0.00" { "-" } else { "" };
    format!("{sign}R$\u{a0}{grouped},{fraction}")
}

pub fn date_br(date: &NaiveDateTime) -> String {
    date.format("%d/%m/%Y").to_string()
}
