//! VAT percent extraction.

use rust_decimal::Decimal;

use super::amounts::clean_number;
use super::patterns::VAT_PERCENT;
use super::{ExtractionMatch, FieldExtractor};

/// Extracts the VAT percent stated next to a `VAT` / `ДДС` label.
pub struct VatExtractor;

impl VatExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for VatExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for VatExtractor {
    type Output = ExtractionMatch<Decimal>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        VAT_PERCENT
            .captures_iter(text)
            .filter_map(|caps| {
                let full_match = caps.get(0)?;
                let percent = clean_number(&caps[1])?;
                (percent <= Decimal::ONE_HUNDRED).then(|| {
                    ExtractionMatch::new(percent, 0.9, full_match.as_str())
                        .with_position(full_match.start(), full_match.end())
                })
            })
            .collect()
    }
}

/// The first VAT percent in the text.
pub fn extract_vat_percent(text: &str) -> Option<Decimal> {
    VatExtractor::new().extract(text).map(|m| m.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_extract_vat_percent() {
        assert_eq!(extract_vat_percent("VAT 20%: 586.75"), Some(Decimal::from(20)));
        assert_eq!(extract_vat_percent("ДДС 9 %"), Some(Decimal::from(9)));
        assert_eq!(
            extract_vat_percent("VAT rate: 7.5%"),
            Some(Decimal::from_str("7.5").unwrap())
        );
    }

    #[test]
    fn test_vat_without_percent() {
        assert_eq!(extract_vat_percent("VAT No: BG203743737"), None);
        assert_eq!(extract_vat_percent("Discount 10%"), None);
    }

    #[test]
    fn test_extract_all() {
        let text = "VAT 20%\nДДС 0%";
        let all = VatExtractor::new().extract_all(text);
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].value, Decimal::ZERO);
    }
}
