//! Currency detection.

use super::patterns::{CURRENCY_CODE_PATTERNS, CURRENCY_SYMBOLS};
use super::{first_match, Rule};

/// Detect the document currency: the highest-priority ISO code written as a
/// word anywhere in the text, otherwise the first currency symbol found.
pub fn detect_currency(text: &str) -> Option<String> {
    let rules: [Rule<String>; 2] = [currency_code, currency_symbol];
    first_match(text, &rules)
}

fn currency_code(text: &str) -> Option<String> {
    CURRENCY_CODE_PATTERNS
        .iter()
        .find(|(_, pattern)| pattern.is_match(text))
        .map(|(code, _)| code.to_string())
}

fn currency_symbol(text: &str) -> Option<String> {
    CURRENCY_SYMBOLS
        .iter()
        .filter_map(|(symbol, code)| text.find(symbol).map(|pos| (pos, *code)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, code)| code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_wins_over_symbol() {
        assert_eq!(detect_currency("€ 100.00\nTotal: 100.00 USD"), Some("USD".to_string()));
    }

    #[test]
    fn test_codes_in_priority_order() {
        assert_eq!(
            detect_currency("Amount 100.00 GBP\nRate to EUR 1.17"),
            Some("EUR".to_string())
        );
        assert_eq!(detect_currency("CHF 10.00, paid in usd"), Some("USD".to_string()));
    }

    #[test]
    fn test_codes_ignore_case() {
        assert_eq!(detect_currency("Total: 100.00 eur"), Some("EUR".to_string()));
        assert_eq!(detect_currency("Сума: 50,00 bgn"), Some("BGN".to_string()));
    }

    #[test]
    fn test_word_like_codes_need_capitals() {
        assert_eq!(detect_currency("Please try to pay $ 100.00"), Some("USD".to_string()));
        assert_eq!(detect_currency("Total 450.00 TRY"), Some("TRY".to_string()));
    }

    #[test]
    fn test_symbols() {
        assert_eq!(detect_currency("Total £ 250.00"), Some("GBP".to_string()));
        assert_eq!(detect_currency("Общо: 700,00 лв."), Some("BGN".to_string()));
        assert_eq!(detect_currency("Total 1,000.00"), None);
    }

    #[test]
    fn test_code_needs_word_boundary() {
        assert_eq!(detect_currency("NEURON labs 10.00"), None);
    }
}
