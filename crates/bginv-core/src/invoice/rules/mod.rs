//! Rule-based field extractors for English and Bulgarian invoices.

pub mod amounts;
pub mod currency;
pub mod dates;
pub mod lines;
pub mod patterns;
pub mod recipient;
pub mod reference;
pub mod vat;

pub use amounts::{clean_number, format_amount};
pub use currency::detect_currency;
pub use dates::{extract_invoice_date, extract_service_date, format_date, parse_date};
pub use lines::{stated_total, LineExtractor, ServiceLines};
pub use recipient::RecipientExtractor;
pub use reference::extract_invoice_number;
pub use vat::{extract_vat_percent, VatExtractor};

/// A single matcher in an ordered rule list.
pub type Rule<T> = fn(&str) -> Option<T>;

/// Apply rules in order and return the first success.
pub fn first_match<T>(input: &str, rules: &[Rule<T>]) -> Option<T> {
    rules.iter().find_map(|rule| rule(input))
}

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// Extraction context with confidence scores.
#[derive(Debug, Clone)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
    /// Position in source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: f32, source: impl Into<String>) -> Self {
        Self {
            value,
            confidence,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn never(_: &str) -> Option<u32> {
        None
    }

    fn length(s: &str) -> Option<u32> {
        Some(s.len() as u32)
    }

    fn always_one(_: &str) -> Option<u32> {
        Some(1)
    }

    #[test]
    fn test_first_match_order() {
        let rules: [Rule<u32>; 3] = [never, length, always_one];
        assert_eq!(first_match("abc", &rules), Some(3));

        let rules: [Rule<u32>; 1] = [never];
        assert_eq!(first_match("abc", &rules), None);
    }
}
