//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;
use std::str::FromStr;

use rust_decimal::Decimal;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats a decimal amount with two decimal places.
///
/// Non-numeric input is passed through unchanged.
///
/// Usage in templates: `{{ order.total()|money }}`
#[askama::filter_fn]
pub fn money(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let raw = value.to_string();
    Ok(Decimal::from_str(raw.trim()).map_or(raw, |amount| format!("{:.2}", amount.round_dp(2))))
}
