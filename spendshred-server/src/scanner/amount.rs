//! Monetary amount extraction from subjects and snippets

use std::sync::OnceLock;

use regex::Regex;

/// Currency symbol, digits (grouped by `,` or plain), optional 2-digit cents.
fn re_amount() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[$€£](\d{1,3}(?:,\d{3})+|\d+)(\.\d{2})?").expect("amount pattern compiles")
    })
}

/// First amount in `text`, or `0.0` when there is none.
///
/// Only the first match counts, so "Subtotal $10 Total $12" yields 10.0.
pub fn extract_amount(text: &str) -> f64 {
    let Some(caps) = re_amount().captures(text) else {
        return 0.0;
    };
    let whole = caps.get(1).map_or("", |m| m.as_str()).replace(',', "");
    let cents = caps.get(2).map_or("", |m| m.as_str());
    format!("{whole}{cents}").parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_cents() {
        assert_eq!(extract_amount("$9.99 due"), 9.99);
    }

    #[test]
    fn extracts_grouped_thousands() {
        assert_eq!(extract_amount("$1,200.00"), 1200.00);
        assert_eq!(extract_amount("Total: $1,200"), 1200.0);
        assert_eq!(extract_amount("$12,345,678.90 wire"), 12_345_678.90);
    }

    #[test]
    fn extracts_whole_dollars() {
        assert_eq!(extract_amount("Your $15 plan"), 15.0);
        assert_eq!(extract_amount("$1200 annual"), 1200.0);
    }

    #[test]
    fn first_match_wins() {
        assert_eq!(extract_amount("$15 and $20"), 15.0);
    }

    #[test]
    fn no_amount_is_zero() {
        assert_eq!(extract_amount("no price here"), 0.0);
        assert_eq!(extract_amount("15 USD"), 0.0);
        assert_eq!(extract_amount("$"), 0.0);
        assert_eq!(extract_amount(""), 0.0);
    }

    #[test]
    fn other_currency_symbols() {
        assert_eq!(extract_amount("Invoice €49.00"), 49.0);
        assert_eq!(extract_amount("£7.50 renewal"), 7.5);
    }

    #[test]
    fn single_decimal_digit_is_not_cents() {
        assert_eq!(extract_amount("$9.9"), 9.0);
    }
}
