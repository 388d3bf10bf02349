//! Formatting of money amounts for messages shown to users.

use std::sync::OnceLock;

use numfmt::{Formatter, Precision};

/// Format `number` as US dollars with thousands separators and two decimal places,
/// e.g. "$1,234.50" or "-$12.00".
pub fn format_currency(number: f64) -> String {
    static POSITIVE_FMT: OnceLock<Option<Formatter>> = OnceLock::new();

    let positive_fmt = POSITIVE_FMT.get_or_init(|| {
        Formatter::currency("$")
            .ok()
            .map(|formatter| formatter.precision(Precision::Decimals(2)))
    });

    static NEGATIVE_FMT: OnceLock<Option<Formatter>> = OnceLock::new();

    let negative_fmt = NEGATIVE_FMT.get_or_init(|| {
        Formatter::currency("-$")
            .ok()
            .map(|formatter| formatter.precision(Precision::Decimals(2)))
    });

    if number == 0.0 {
        // Zero is hardcoded as "0", so we must specify the formatted string for zero
        return "$0.00".to_owned();
    }

    let formatter = if number < 0.0 {
        negative_fmt
    } else {
        positive_fmt
    };

    match formatter {
        Some(formatter) => pad_decimals(formatter.fmt_string(number.abs())),
        None => {
            tracing::warn!("Could not create the currency formatter, using the plain format");
            let sign = if number < 0.0 { "-" } else { "" };
            format!("{sign}${:.2}", number.abs())
        }
    }
}

/// numfmt omits trailing zeros, so we must add them ourselves.
/// For example, "12.3" is rendered as "12.30" and "12" as "12.00".
fn pad_decimals(formatted_string: String) -> String {
    match formatted_string.rfind('.') {
        None => format!("{formatted_string}.00"),
        Some(point) if formatted_string.len() - point == 2 => format!("{formatted_string}0"),
        Some(_) => formatted_string,
    }
}
