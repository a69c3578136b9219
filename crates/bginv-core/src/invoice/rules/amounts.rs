//! Amount normalization for invoices written with either separator convention.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::{AMOUNT, LINE_AMOUNT};
use super::ExtractionMatch;
use crate::models::invoice::round2;

/// Parse a number written as `4,700.00`, `5.640,00`, `1 234,5` or `-12.50`.
///
/// When both separators are present the rightmost one is the decimal
/// separator. With a single kind of separator, it is read as a thousands
/// separator only when the leading group has one to three digits and is not
/// `0`, and every group after it has exactly three digits.
pub fn clean_number(raw: &str) -> Option<Decimal> {
    let negative = raw.trim_start().starts_with('-');
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(comma), Some(dot)) => {
            if comma > dot {
                cleaned.replace('.', "").replace(',', ".")
            } else {
                cleaned.replace(',', "")
            }
        }
        (Some(_), None) => normalize_single_separator(&cleaned, ','),
        (None, Some(_)) => normalize_single_separator(&cleaned, '.'),
        (None, None) => cleaned,
    };

    let value = Decimal::from_str(&normalized).ok()?;
    Some(if negative { -value } else { value })
}

fn normalize_single_separator(s: &str, sep: char) -> String {
    let groups: Vec<&str> = s.split(sep).collect();
    let lead = groups[0];
    let thousands = (1..=3).contains(&lead.len())
        && lead != "0"
        && groups[1..].iter().all(|g| g.len() == 3);

    if thousands {
        return groups.concat();
    }

    let (integer, fraction) = groups.split_at(groups.len() - 1);
    format!("{}.{}", integer.concat(), fraction[0])
}

/// Format an amount with exactly two decimals, e.g. `2933.75`.
pub fn format_amount(amount: Decimal) -> String {
    let mut value = round2(amount);
    value.rescale(2);
    value.to_string()
}

/// The amount a line ends with, with its byte offset in the line.
pub fn trailing_amount(line: &str) -> Option<ExtractionMatch<Decimal>> {
    let caps = LINE_AMOUNT.captures(line)?;
    let amount = caps.get(1)?;
    let value = clean_number(amount.as_str())?;

    Some(
        ExtractionMatch::new(value, 0.9, amount.as_str())
            .with_position(amount.start(), amount.end()),
    )
}

/// The last parseable amount anywhere in a line.
pub fn last_amount(line: &str) -> Option<Decimal> {
    AMOUNT
        .find_iter(line)
        .filter_map(|m| clean_number(m.as_str()))
        .last()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_clean_number_both_conventions() {
        assert_eq!(clean_number("4,700.00"), Some(dec("4700")));
        assert_eq!(clean_number("5.640,00"), Some(dec("5640")));
        assert_eq!(clean_number("1,234,567.89"), Some(dec("1234567.89")));
        assert_eq!(clean_number("1.234.567,89"), Some(dec("1234567.89")));
    }

    #[test]
    fn test_clean_number_single_separator() {
        assert_eq!(clean_number("1.234.567"), Some(dec("1234567")));
        assert_eq!(clean_number("4,700"), Some(dec("4700")));
        assert_eq!(clean_number("12.50"), Some(dec("12.50")));
        assert_eq!(clean_number("1234,5"), Some(dec("1234.5")));
        assert_eq!(clean_number("700"), Some(dec("700")));
        assert_eq!(clean_number("0.500"), Some(dec("0.5")));
        assert_eq!(clean_number("0,5"), Some(dec("0.5")));
        assert_eq!(clean_number("1234.567"), Some(dec("1234.567")));
    }

    #[test]
    fn test_clean_number_noise() {
        assert_eq!(clean_number("€ 1 000.00"), Some(dec("1000.00")));
        assert_eq!(clean_number("-12.50"), Some(dec("-12.50")));
        assert_eq!(clean_number(""), None);
        assert_eq!(clean_number("N/A"), None);
        assert_eq!(clean_number(",."), None);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec("2933.745")), "2933.75");
        assert_eq!(format_amount(dec("700")), "700.00");
        assert_eq!(format_amount(dec("1.955830")), "1.96");
    }

    #[test]
    fn test_trailing_amount() {
        let m = trailing_amount("Consulting August 2021   1,000.00 EUR").unwrap();
        assert_eq!(m.value, dec("1000.00"));
        assert_eq!(m.source, "1,000.00");

        assert!(trailing_amount("Consulting services").is_none());
    }

    #[test]
    fn test_last_amount() {
        assert_eq!(last_amount("Total: 1,500.00 EUR"), Some(dec("1500.00")));
        assert_eq!(last_amount("Общо: 5.640,00 лв."), Some(dec("5640.00")));
        assert_eq!(last_amount("Total due"), None);
    }
}
