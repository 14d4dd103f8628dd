//! German number formatting for terminal output.
//!
//! Thousands are separated by a dot and decimals by a comma, as in the
//! exported workbook when it is opened with a German locale.

/// Group digits by thousands with `.`: `1234567` -> `1.234.567`.
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

/// Fixed decimals with a decimal comma and grouped integer part:
/// `1234.5` with two decimals -> `1.234,50`.
pub fn format_decimal(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }

    let formatted = format!("{:.*}", decimals, value.abs());
    let (integer, fraction) = formatted
        .split_once('.')
        .map_or((formatted.as_str(), None), |(i, f)| (i, Some(f)));

    let grouped = integer
        .parse::<u64>()
        .map(format_thousands)
        .unwrap_or_else(|_| integer.to_string());

    let mut out = String::new();
    if value < 0.0 && formatted.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(fraction) = fraction {
        out.push(',');
        out.push_str(fraction);
    }
    out
}

/// A percentage with one decimal: `4.26` -> `4,3%`.
pub fn format_percent(value: f64) -> String {
    format!("{}%", format_decimal(value, 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1_000), "1.000");
        assert_eq!(format_thousands(1_234_567), "1.234.567");
    }

    #[test]
    fn test_format_decimal() {
        assert_eq!(format_decimal(12.5, 2), "12,50");
        assert_eq!(format_decimal(1234.5, 2), "1.234,50");
        assert_eq!(format_decimal(1234.4, 0), "1.234");
        assert_eq!(format_decimal(-3.26, 1), "-3,3");
        assert_eq!(format_decimal(-0.001, 2), "0,00");
        assert_eq!(format_decimal(f64::NAN, 2), "0");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(20.0), "20,0%");
        assert_eq!(format_percent(0.0), "0,0%");
    }
}
