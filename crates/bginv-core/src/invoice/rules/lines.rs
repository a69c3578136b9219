//! Service line extraction: table rows first, the invoice total as fallback.

use tracing::debug;

use super::amounts::{last_amount, trailing_amount};
use super::dates::extract_service_date;
use super::patterns::{
    CURRENCY_CODES, CURRENCY_SYMBOLS, ROW_ORDINAL, SERVICE_DATE_DMY, SERVICE_DATE_MONTH_NAME,
    SERVICE_DATE_MY, TABLE_FOOTER_PREFIXES, TABLE_HEADER, TABLE_HEADER_KEYWORDS, TOTAL_LINE,
};
use crate::models::invoice::ServiceLineItem;

/// Service lines found in a document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceLines {
    pub items: Vec<ServiceLineItem>,
    /// True when the single item was synthesized from the invoice total.
    pub used_fallback: bool,
}

/// Extracts service rows from the table between a header and its footer.
pub struct LineExtractor {
    fallback_description: String,
}

impl LineExtractor {
    pub fn new(fallback_description: impl Into<String>) -> Self {
        Self {
            fallback_description: fallback_description.into(),
        }
    }

    pub fn extract(&self, text: &str) -> ServiceLines {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        let items = table_rows(&lines);
        if !items.is_empty() {
            debug!("Found {} service rows in table", items.len());
            return ServiceLines {
                items,
                used_fallback: false,
            };
        }

        match invoice_total(&lines) {
            Some(total) => {
                debug!("No service table, using invoice total {}", total);
                ServiceLines {
                    items: vec![ServiceLineItem::new(self.fallback_description.clone(), total)],
                    used_fallback: true,
                }
            }
            None => ServiceLines::default(),
        }
    }
}

impl Default for LineExtractor {
    fn default() -> Self {
        Self::new("Consulting services per invoice")
    }
}

/// A line naming the columns of a service table.
pub fn is_table_header(line: &str) -> bool {
    TABLE_HEADER.is_match(line)
}

/// A line closing a service table (subtotal, VAT, closing words).
pub fn is_table_footer(line: &str) -> bool {
    let lower = line.trim().to_lowercase();
    TABLE_FOOTER_PREFIXES.iter().any(|p| lower.starts_with(p)) || lower.contains("thank you")
}

/// Rows under the first header-like line whose region holds any.
fn table_rows(lines: &[&str]) -> Vec<ServiceLineItem> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, l)| is_table_header(l))
        .map(|(header, _)| region_rows(&lines[header + 1..]))
        .find(|rows| !rows.is_empty())
        .unwrap_or_default()
}

fn region_rows(lines: &[&str]) -> Vec<ServiceLineItem> {
    lines
        .iter()
        .take_while(|l| !is_table_footer(l))
        .filter_map(|l| parse_service_line(l))
        .collect()
}

/// The amount on the document's last total line, as stated by the issuer.
pub fn stated_total(text: &str) -> Option<rust_decimal::Decimal> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    invoice_total(&lines)
}

/// The last total-like line carrying an amount.
fn invoice_total(lines: &[&str]) -> Option<rust_decimal::Decimal> {
    lines
        .iter()
        .rev()
        .filter(|l| TOTAL_LINE.is_match(l))
        .find_map(|l| last_amount(l))
}

/// Split a table row into description and line total.
///
/// The amount is the one the line ends with. Numeric columns before it
/// (quantity, unit price) and a leading row number are dropped from the
/// description.
pub fn parse_service_line(line: &str) -> Option<ServiceLineItem> {
    let amount = trailing_amount(line)?;
    let (start, _) = amount.position?;

    let description = strip_trailing_columns(&line[..start]);
    let description = ROW_ORDINAL.replace(&description, "").trim().to_string();

    if description.is_empty() || is_header_keyword(&description) {
        return None;
    }

    Some(ServiceLineItem {
        description,
        line_total: amount.value,
        service_date: extract_service_date(line),
    })
}

fn is_header_keyword(description: &str) -> bool {
    let lower = description.to_lowercase();
    TABLE_HEADER_KEYWORDS.contains(&lower.as_str())
}

fn is_column_separator(c: char) -> bool {
    c.is_whitespace() || c == '|' || c == ';'
}

fn strip_trailing_columns(raw: &str) -> String {
    let mut rest = raw.trim_end_matches(is_column_separator);

    while let Some(token) = rest.rsplit(is_column_separator).next() {
        if token.is_empty() || !is_numeric_column(token) || ends_with_date(rest) {
            break;
        }
        rest = rest[..rest.len() - token.len()].trim_end_matches(is_column_separator);
    }

    rest.trim().to_string()
}

/// True when `s` ends with a service period such as `18.08.2021`, `08/2021`
/// or `August 2021`, which belongs to the description.
fn ends_with_date(s: &str) -> bool {
    [&*SERVICE_DATE_DMY, &*SERVICE_DATE_MY, &*SERVICE_DATE_MONTH_NAME]
        .iter()
        .any(|re| re.find_iter(s).any(|m| m.end() == s.len()))
}

fn is_numeric_column(token: &str) -> bool {
    let bare = token.trim_end_matches('.');
    if CURRENCY_CODES.iter().any(|code| code.eq_ignore_ascii_case(bare))
        || CURRENCY_SYMBOLS.iter().any(|(symbol, _)| *symbol == bare)
    {
        return true;
    }

    token.chars().any(|c| c.is_ascii_digit())
        && token
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '%' | '-' | 'x'))
}
