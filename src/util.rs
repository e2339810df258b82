use chrono::DateTime;
use num_format::{Locale, ToFormattedString};

/// Placeholder for anything the provider did not send.
pub const NOT_AVAILABLE: &str = "N/A";

const CURRENCY_SYMBOLS: [(&str, &str); 20] = [
    ("USD", "$"),
    ("EUR", "€"),
    ("GBP", "£"),
    ("JPY", "¥"),
    ("CAD", "C$"),
    ("AUD", "A$"),
    ("CHF", "Fr."),
    ("CNY", "¥"),
    ("SEK", "kr"),
    ("NZD", "NZ$"),
    ("KRW", "₩"),
    ("NOK", "kr"),
    ("MXN", "Mex$"),
    ("SGD", "S$"),
    ("HKD", "HK$"),
    ("INR", "₹"),
    ("BRL", "R$"),
    ("ZAR", "R"),
    ("RUB", "₽"),
    ("TRY", "₺"),
];

/// Symbol for an ISO currency code; unknown or missing codes give `N/A`.
pub fn currency_symbol(code: Option<&str>) -> &'static str {
    code.and_then(|code| {
        CURRENCY_SYMBOLS
            .iter()
            .find(|(iso, _)| *iso == code)
            .map(|(_, symbol)| *symbol)
    })
    .unwrap_or(NOT_AVAILABLE)
}

/// Fixed precision with comma thousands separators, `1234567.891` at 2
/// places gives `1,234,567.89`.
pub fn format_decimal(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }

    let fixed = format!("{:.*}", precision, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };
    let whole = match int_part.parse::<u128>() {
        Ok(whole) => whole,
        Err(_) => return NOT_AVAILABLE.to_string(),
    };

    let mut formatted = whole.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        formatted.push('.');
        formatted.push_str(frac);
    }

    // -0.00 prints as 0.00
    let is_zero = whole == 0 && frac_part.map_or(true, |f| f.chars().all(|c| c == '0'));
    if value.is_sign_negative() && !is_zero {
        formatted.insert(0, '-');
    }
    formatted
}

/// Unix seconds to a `YYYY-MM-DD` UTC date.
pub fn timestamp_to_date(secs: i64) -> Option<String> {
    DateTime::from_timestamp(secs, 0).map(|dt| dt.format("%Y-%m-%d").to_string())
}
