//! Rule-based invoice parser.

use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::error::ExtractionError;
use crate::models::config::{ExtractionConfig, LineOverflow};
use crate::models::invoice::{round2, DateSource, ParsedInvoice, SupplierHint};

use super::rules::{
    detect_currency, extract_invoice_date, extract_invoice_number, extract_vat_percent,
    format_amount, stated_total, LineExtractor, RecipientExtractor, ServiceLines,
};
use super::Result;

/// Trait for invoice parsing.
pub trait InvoiceParser {
    /// Parse invoice fields from plain text, never taking `supplier` as the
    /// recipient.
    fn parse(&self, text: &str, supplier: &SupplierHint) -> Result<ParsedInvoice>;
}

/// Parser built from ordered regex rules with explicit fallbacks.
///
/// Parsing is pure: the same text, supplier and reference date always give
/// the same result.
pub struct RuleBasedParser {
    config: ExtractionConfig,
    /// Date used when the document has none. Today when unset.
    reference_date: Option<NaiveDate>,
}

impl RuleBasedParser {
    pub fn new(config: ExtractionConfig) -> Self {
        Self {
            config,
            reference_date: None,
        }
    }

    /// Fix the date used when the document states none.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    fn reference_date(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Local::now().date_naive())
    }
}

impl Default for RuleBasedParser {
    fn default() -> Self {
        Self::new(ExtractionConfig::default())
    }
}

impl InvoiceParser for RuleBasedParser {
    fn parse(&self, text: &str, supplier: &SupplierHint) -> Result<ParsedInvoice> {
        if text.trim().is_empty() {
            return Err(ExtractionError::EmptyText);
        }

        info!("Parsing invoice from {} characters of text", text.len());

        let mut warnings = Vec::new();
        let mut confidence = 1.0f32;

        // Recipient
        let recipient = RecipientExtractor::new(supplier)
            .with_scan_window(self.config.scan_window)
            .extract(text);

        if recipient.name.is_empty() {
            warnings.push("Recipient name not found".to_string());
            confidence -= 0.3;
        } else {
            let missing = recipient.missing_fields();
            if !missing.is_empty() {
                warnings.push(format!("Recipient {} not found", missing.join(", ")));
            }
        }

        // Service lines
        let ServiceLines {
            mut items,
            used_fallback,
        } = LineExtractor::new(self.config.fallback_description.clone()).extract(text);

        if used_fallback {
            warnings.push("No service table found, invoice total used as a single line".to_string());
            confidence -= 0.2;
        }
        if items.is_empty() {
            warnings.push("No service lines found".to_string());
        }
        let line_sum: Decimal = items.iter().map(|item| item.line_total).sum();

        let max = self.config.service_line_limit();
        if items.len() > max {
            match self.config.line_overflow {
                LineOverflow::Reject => {
                    return Err(ExtractionError::TooManyServiceLines {
                        found: items.len(),
                        max,
                    });
                }
                LineOverflow::Truncate => {
                    warnings.push(format!(
                        "Document has {} service lines, only the first {} are kept",
                        items.len(),
                        max
                    ));
                    items.truncate(max);
                }
            }
        }

        // Invoice date
        let (invoice_date, date_source) = match extract_invoice_date(text) {
            Some(found) => found,
            None => {
                let date = self.reference_date();
                warnings.push(format!("Invoice date not found, using {}", date.format("%d.%m.%Y")));
                confidence -= 0.2;
                (date, DateSource::Defaulted)
            }
        };

        // Currency
        let currency = match detect_currency(text) {
            Some(code) => code,
            None => {
                warnings.push(format!(
                    "Currency not found, assuming {}",
                    self.config.default_currency
                ));
                confidence -= 0.1;
                self.config.default_currency.clone()
            }
        };

        // VAT
        let vat_percent = match extract_vat_percent(text) {
            Some(percent) => percent,
            None => {
                warnings.push(format!(
                    "VAT rate not found, assuming {}%",
                    self.config.default_vat_percent
                ));
                confidence -= 0.1;
                self.config.default_vat_percent
            }
        };

        // Stated total against the table rows
        let stated = stated_total(text);
        let mismatch = stated.filter(|total| {
            !used_fallback && !items.is_empty() && !total_matches(*total, line_sum, vat_percent)
        });
        if let Some(total) = mismatch {
            warnings.push(format!(
                "Stated total {} does not match the service lines ({})",
                format_amount(total),
                format_amount(line_sum)
            ));
            confidence -= 0.1;
        }

        let confidence = confidence.clamp(0.0, 1.0);

        debug!(
            "Extracted {} service lines for {:?} with confidence {:.2}",
            items.len(),
            recipient.name,
            confidence
        );

        Ok(ParsedInvoice {
            recipient,
            lines: items,
            source_invoice_number: extract_invoice_number(text),
            stated_total: stated,
            invoice_date,
            date_source,
            currency,
            vat_percent: vat_percent.normalize(),
            used_fallback_line: used_fallback,
            confidence,
            warnings,
        })
    }
}

/// A stated total agrees with the line sum before or after VAT.
fn total_matches(stated: Decimal, line_sum: Decimal, vat_percent: Decimal) -> bool {
    let net = round2(line_sum);
    let gross = round2(net + round2(net * vat_percent / Decimal::ONE_HUNDRED));
    let stated = round2(stated);
    stated == net || stated == gross
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
    }

    fn parser() -> RuleBasedParser {
        RuleBasedParser::default().with_reference_date(reference())
    }

    const INVOICE: &str = r#"
        INVOICE No 2021-118
        Invoice date: August 18, 2021

        Supplier: Banana Express EOOD
        VAT: BG204567890

        Customer Name: QUESTE LTD
        ID No: 203743737
        VAT No: BG203743737
        Address: Aleksandar Stamboliiski 134
        City: Sofia

        Description                         Amount
        Backend development August 2021     1,000.00 EUR
        Code review August 2021             500.00 EUR
        Subtotal                            1,500.00 EUR
        VAT 20%                             0.00 EUR
        Total                               1,500.00 EUR
    "#;

    #[test]
    fn test_parse_full_invoice() {
        let supplier = SupplierHint::new("Banana Express EOOD", "BG204567890");
        let parsed = parser().parse(INVOICE, &supplier).unwrap();

        assert_eq!(parsed.recipient.name, "QUESTE LTD");
        assert_eq!(parsed.recipient.vat_id, "BG203743737");
        assert_eq!(parsed.lines.len(), 2);
        assert_eq!(parsed.lines[0].line_total, dec("1000.00"));
        assert_eq!(parsed.lines[1].description, "Code review August 2021");
        assert_eq!(parsed.invoice_date, NaiveDate::from_ymd_opt(2021, 8, 18).unwrap());
        assert_eq!(parsed.date_source, DateSource::Labelled);
        assert_eq!(parsed.currency, "EUR");
        assert_eq!(parsed.vat_percent, dec("20"));
        assert!(!parsed.used_fallback_line);
        assert_eq!(parsed.source_invoice_number.as_deref(), Some("2021-118"));
        assert_eq!(parsed.stated_total, Some(dec("1500.00")));
        assert_eq!(parsed.confidence, 1.0);
    }

    #[test]
    fn test_stated_total_cross_check() {
        let supplier = SupplierHint::default();
        let table = "Customer: Northwind Ltd\nInvoice date: 01.03.2024\nDescription Amount\nHosting 100.00 EUR\nSupport 200.00 EUR\nVAT 20%\n";

        let mismatch = |parsed: &ParsedInvoice| {
            parsed.warnings.iter().find(|w| w.starts_with("Stated total")).cloned()
        };

        let net = parser().parse(&format!("{table}Total 300.00 EUR"), &supplier).unwrap();
        assert_eq!(mismatch(&net), None);

        let gross = parser().parse(&format!("{table}Total 360.00 EUR"), &supplier).unwrap();
        assert_eq!(mismatch(&gross), None);
        assert_eq!(gross.stated_total, Some(dec("360.00")));

        let wrong = parser().parse(&format!("{table}Total 500.00 EUR"), &supplier).unwrap();
        assert_eq!(
            mismatch(&wrong).as_deref(),
            Some("Stated total 500.00 does not match the service lines (300.00)")
        );
        assert!(wrong.confidence < net.confidence);
        assert_eq!(wrong.lines.len(), 2);
    }

    #[test]
    fn test_parse_is_idempotent() {
        let supplier = SupplierHint::new("Banana Express EOOD", "BG204567890");
        let first = parser().parse(INVOICE, &supplier).unwrap();
        let second = parser().parse(INVOICE, &supplier).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_defaults_and_penalties() {
        let text = "Thanks for the work.\nTotal: 700.00";
        let parsed = parser().parse(text, &SupplierHint::default()).unwrap();

        assert!(parsed.recipient.name.is_empty());
        assert!(parsed.used_fallback_line);
        assert_eq!(parsed.invoice_date, reference());
        assert_eq!(parsed.date_source, DateSource::Defaulted);
        assert_eq!(parsed.currency, "EUR");
        assert_eq!(parsed.vat_percent, dec("20"));
        // 1.0 - 0.3 - 0.2 - 0.2 - 0.1 - 0.1
        assert!(parsed.confidence < 0.11);
        assert_eq!(parsed.warnings.len(), 5);
    }

    #[test]
    fn test_empty_text_is_rejected() {
        let err = parser().parse("  \n\t", &SupplierHint::default()).unwrap_err();
        assert_eq!(err, ExtractionError::EmptyText);
    }

    fn six_line_invoice() -> String {
        let mut text = String::from("Customer: Northwind Ltd\n\nDescription Amount\n");
        for name in ["Alpha", "Beta", "Gamma", "Delta", "Epsilon", "Zeta"] {
            text.push_str(&format!("Service {} 100.00 BGN\n", name));
        }
        text.push_str("Total 600.00 BGN\n");
        text
    }

    #[test]
    fn test_overflow_truncates() {
        let parsed = parser()
            .parse(&six_line_invoice(), &SupplierHint::default())
            .unwrap();

        assert_eq!(parsed.lines.len(), 5);
        assert_eq!(parsed.lines[4].description, "Service Epsilon");
        assert!(parsed.warnings.iter().any(|w| w.contains("only the first 5")));
    }

    #[test]
    fn test_overflow_rejects() {
        let config = ExtractionConfig {
            line_overflow: LineOverflow::Reject,
            ..Default::default()
        };
        let err = RuleBasedParser::new(config)
            .with_reference_date(reference())
            .parse(&six_line_invoice(), &SupplierHint::default())
            .unwrap_err();

        assert_eq!(err, ExtractionError::TooManyServiceLines { found: 6, max: 5 });
    }

    #[test]
    fn test_line_limit_never_exceeds_templates() {
        let config = ExtractionConfig {
            max_service_lines: 9,
            ..Default::default()
        };
        let parsed = RuleBasedParser::new(config)
            .with_reference_date(reference())
            .parse(&six_line_invoice(), &SupplierHint::default())
            .unwrap();

        assert_eq!(parsed.lines.len(), 5);
    }
}
