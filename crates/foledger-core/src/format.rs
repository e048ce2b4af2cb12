//! Number formatting for dashboard cards and tables
//!
//! Amounts use `.` as thousands separator and `,` as decimal separator.

/// Format an amount with two fixed decimals: `1234.5` → `"1.234,50"`
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{value:.2}");
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, "00"));

    format!("{sign}{},{frac_part}", group_thousands(int_part))
}

/// Format a meter count, truncated to whole meters: `3600.7` → `"3600 m"`
pub fn format_meters(value: f64) -> String {
    format!("{} m", value.trunc() as i64)
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    grouped
}
