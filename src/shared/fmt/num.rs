//! Number formatting for conversion rates.
//!
//! Rates travel through the crate as strings so the cached snapshot keeps the
//! exact text the decoder produced. `rate_string` defines that text;
//! `display_rate` renders it for humans.

/// Canonical text of a decoded rate: shortest round-trip form with at least
/// one fractional digit (`43.0`, `42.5`, `0.00001`).
pub fn rate_string(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        format!("{}.0", text)
    } else {
        text
    }
}

/// Adds thousands separators to the integer part and limits the fraction.
///
/// Values of 1 or more keep two fractional digits, smaller values keep up to
/// eight so sub-cent coins stay readable. Non-numeric input is returned as-is.
pub fn display_rate(rate: &str) -> String {
    let value = match rate.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => return rate.to_string(),
    };
    let decimals = if value.abs() >= 1.0 || value == 0.0 { 2 } else { 8 };
    let fixed = format!("{:.1$}", value, decimals);

    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, f.trim_end_matches('0')),
        None => (fixed.as_str(), ""),
    };
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(d) => ("-", d),
        None => ("", int_part),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if frac_part.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, frac_part)
    }
}
