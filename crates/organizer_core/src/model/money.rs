//! Currency helpers for BRL amounts stored as `f64`.

/// Rounds to two decimal places (cents).
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Formats an amount the way pt-BR renders BRL, e.g. `R$ 1.234,56`.
pub fn format_brl(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let integer = group_thousands(cents / 100);
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}R$ {integer},{:02}", cents % 100)
}

/// Parses user or spreadsheet amounts.
///
/// Accepts `1234.56`, `1.234,56`, `1234,56` and an optional `R$` prefix.
/// When a comma is present it is the decimal separator and dots are
/// thousands separators; otherwise the dot is the decimal separator.
pub fn parse_amount(text: &str) -> Option<f64> {
    let trimmed = text.trim().trim_start_matches("R$").trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = if trimmed.contains(',') {
        trimmed.replace('.', "").replace(',', ".")
    } else {
        trimmed.to_string()
    };
    normalized
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::{format_brl, parse_amount, round_cents};

    #[test]
    fn format_brl_groups_thousands_and_uses_comma_decimals() {
        assert_eq!(format_brl(1234.5), "R$ 1.234,50");
        assert_eq!(format_brl(0.0), "R$ 0,00");
        assert_eq!(format_brl(-1_000_000.0), "-R$ 1.000.000,00");
        assert_eq!(format_brl(999.999), "R$ 1.000,00");
    }

    #[test]
    fn parse_amount_accepts_both_decimal_conventions() {
        assert_eq!(parse_amount("1234.56"), Some(1234.56));
        assert_eq!(parse_amount("1.234,56"), Some(1234.56));
        assert_eq!(parse_amount("R$ 12,5"), Some(12.5));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("abc"), None);
    }

    #[test]
    fn round_cents_keeps_two_decimals() {
        assert_eq!(round_cents(100.0 / 3.0), 33.33);
    }
}
