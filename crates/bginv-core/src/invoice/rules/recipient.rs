//! Recipient block extraction.
//!
//! Two tiers are tried in order: a labelled block introduced by a recipient
//! keyword (`Customer Name:`, `Bill To:`, `Получател:` ...), then the first
//! free-standing multi-line block that is neither the supplier, a title nor a
//! table. Any block that mentions the supplier's own VAT number is skipped.

use regex::Regex;
use tracing::{debug, trace};

use super::amounts::trailing_amount;
use super::dates::parse_date;
use super::patterns::{
    ADDRESS_LABEL, BG_VAT, CITY_LABEL, COMPANY_ID, COUNTRY_LABEL, DOCUMENT_TITLE, KNOWN_CITIES,
    KNOWN_COUNTRIES, LABELLED_VAT, LEGAL_FORMS, NAME_LABELS, POSTCODE_CITY, RECIPIENT_KEYWORD,
    STREET_LIKE, SUPPLIER_KEYWORD, TABLE_HEADER, TOTAL_LINE,
};
use crate::models::invoice::{normalize_vat, RecipientDetails, SupplierHint};

/// Extracts the recipient while excluding the known supplier.
pub struct RecipientExtractor<'a> {
    supplier: &'a SupplierHint,
    supplier_vat: Option<String>,
    scan_window: usize,
}

impl<'a> RecipientExtractor<'a> {
    pub fn new(supplier: &'a SupplierHint) -> Self {
        Self {
            supplier,
            supplier_vat: supplier.normalized_vat(),
            scan_window: 7,
        }
    }

    /// Set how many non-empty lines after a keyword are scanned for sub-fields.
    pub fn with_scan_window(mut self, lines: usize) -> Self {
        self.scan_window = lines;
        self
    }

    /// Extract the recipient. Fields that cannot be found stay empty.
    pub fn extract(&self, text: &str) -> RecipientDetails {
        let lines: Vec<&str> = text.lines().map(str::trim).collect();

        self.keyword_block(&lines)
            .or_else(|| self.free_block(&lines))
            .unwrap_or_default()
    }

    fn keyword_block(&self, lines: &[&str]) -> Option<RecipientDetails> {
        let content: Vec<&str> = lines.iter().copied().filter(|l| !l.is_empty()).collect();

        for (i, line) in content.iter().enumerate() {
            let Some(caps) = RECIPIENT_KEYWORD.captures(line) else {
                continue;
            };

            let inline = caps[1].trim();
            let (raw_name, body_start) = if inline.is_empty() {
                match content.get(i + 1) {
                    Some(next) if !is_section_boundary(next) => (*next, i + 2),
                    _ => continue,
                }
            } else {
                (inline, i + 1)
            };

            let body: Vec<&str> = content
                .get(body_start..)
                .unwrap_or_default()
                .iter()
                .copied()
                .take_while(|l| !is_section_boundary(l))
                .take(self.scan_window)
                .collect();

            if self.mentions_supplier_vat(line)
                || self.mentions_supplier_vat(raw_name)
                || body.iter().any(|l| self.mentions_supplier_vat(l))
            {
                debug!("Skipping recipient candidate {:?}: carries the supplier VAT", raw_name);
                continue;
            }

            let name = self.clean_name(raw_name);
            if name.is_empty() {
                trace!("Recipient keyword on line {} has no usable name", i);
                continue;
            }

            let mut details = self.scan_fields(&body);
            details.name = name;
            return Some(details);
        }

        None
    }

    fn free_block(&self, lines: &[&str]) -> Option<RecipientDetails> {
        for block in lines.split(|l| l.is_empty()) {
            if block.len() < 2 {
                continue;
            }
            if block.iter().any(|l| self.mentions_supplier_vat(l)) {
                continue;
            }
            if block
                .iter()
                .any(|l| TABLE_HEADER.is_match(l) || TOTAL_LINE.is_match(l) || trailing_amount(l).is_some())
            {
                continue;
            }

            let first = block[0];
            if DOCUMENT_TITLE.is_match(first)
                || SUPPLIER_KEYWORD.is_match(first)
                || self.is_supplier_name(first)
                || first.contains(':')
                || parse_date(first).is_some()
                || !first.chars().any(char::is_alphabetic)
            {
                continue;
            }

            let name = self.clean_name(first);
            if name.is_empty() {
                continue;
            }

            debug!("Recipient taken from free-standing block starting {:?}", first);
            let mut details = self.scan_fields(&block[1..]);
            details.name = name;
            return Some(details);
        }

        None
    }

    /// Scan the lines of a recipient block for VAT, ID, address, city and country.
    fn scan_fields(&self, lines: &[&str]) -> RecipientDetails {
        let mut details = RecipientDetails::default();

        for line in lines {
            if details.vat_id.is_empty() {
                if let Some(vat) = self.find_vat(line) {
                    details.vat_id = vat;
                    continue;
                }
            }

            if details.company_id.is_empty() {
                if let Some(caps) = COMPANY_ID.captures(line) {
                    details.company_id = caps[1].to_string();
                    continue;
                }
            }

            if let Some(caps) = ADDRESS_LABEL.captures(line) {
                if details.address.is_empty() {
                    details.address = caps[1].trim().to_string();
                }
                if details.city.is_empty() {
                    details.city = find_known(line, &KNOWN_CITIES).unwrap_or_default();
                }
                continue;
            }

            if let Some(caps) = CITY_LABEL.captures(line) {
                if details.city.is_empty() {
                    details.city = caps[1].trim().to_string();
                }
                continue;
            }

            if let Some(caps) = COUNTRY_LABEL.captures(line) {
                if details.country.is_empty() {
                    details.country = caps[1].trim().to_string();
                }
                continue;
            }

            if details.city.is_empty() {
                if let Some(city) = POSTCODE_CITY
                    .captures(line)
                    .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
                {
                    details.city = city.as_str().trim().to_string();
                    continue;
                }
            }

            if details.address.is_empty() && STREET_LIKE.is_match(line) {
                details.address = line.to_string();
                if details.city.is_empty() {
                    details.city = find_known(line, &KNOWN_CITIES).unwrap_or_default();
                }
                continue;
            }

            if details.city.is_empty() {
                if let Some(city) = find_known(line, &KNOWN_CITIES) {
                    details.city = city;
                    continue;
                }
            }

            if details.country.is_empty() {
                if let Some(country) = find_known(line, &KNOWN_COUNTRIES) {
                    details.country = country;
                }
            }
        }

        details
    }

    fn find_vat(&self, line: &str) -> Option<String> {
        let bg = BG_VAT.captures(line).map(|caps| normalize_vat(&caps[1]));
        let labelled = || {
            LABELLED_VAT
                .captures(line)
                .map(|caps| normalize_vat(&caps[1]))
                .filter(|vat| vat.chars().filter(char::is_ascii_digit).count() >= 8)
        };

        bg.or_else(labelled)
            .filter(|vat| self.supplier_vat.as_deref() != Some(vat.as_str()))
    }

    fn mentions_supplier_vat(&self, line: &str) -> bool {
        self.supplier_vat
            .as_deref()
            .is_some_and(|vat| normalize_vat(line).contains(vat))
    }

    fn is_supplier_name(&self, line: &str) -> bool {
        let name = self.supplier.name.trim();
        !name.is_empty() && line.to_lowercase().contains(&name.to_lowercase())
    }

    /// Remove the supplier's name and party labels from a candidate name.
    fn clean_name(&self, raw: &str) -> String {
        let mut removals: Vec<String> = Vec::new();

        let supplier = self.supplier.name.trim();
        if !supplier.is_empty() {
            removals.push(supplier.to_string());
            let stripped = strip_legal_form(supplier);
            if stripped != supplier && stripped.chars().count() >= 3 {
                removals.push(stripped);
            }
        }
        removals.extend(NAME_LABELS.iter().map(|label| label.to_string()));

        let mut name = raw.to_string();
        for needle in &removals {
            if let Ok(re) = Regex::new(&format!("(?i){}", regex::escape(needle))) {
                name = re.replace_all(&name, " ").into_owned();
            }
        }

        name.split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .trim_matches(|c: char| c.is_whitespace() || ":;,|-".contains(c))
            .to_string()
    }
}

/// Drop trailing legal-form tokens, e.g. `Banana Express EOOD` -> `Banana Express`.
pub fn strip_legal_form(name: &str) -> String {
    let mut tokens: Vec<&str> = name.split_whitespace().collect();

    while let Some(last) = tokens.last() {
        let bare = last.trim_end_matches(['.', ',']).to_uppercase();
        if tokens.len() > 1 && LEGAL_FORMS.contains(&bare.as_str()) {
            tokens.pop();
        } else {
            break;
        }
    }

    tokens.join(" ")
}

/// A line that ends the current party block.
fn is_section_boundary(line: &str) -> bool {
    RECIPIENT_KEYWORD.is_match(line)
        || SUPPLIER_KEYWORD.is_match(line)
        || TABLE_HEADER.is_match(line)
        || TOTAL_LINE.is_match(line)
}

/// The first entry of `table` that appears in `line` as a whole word.
fn find_known(line: &str, table: &[&str]) -> Option<String> {
    let haystack = line.to_lowercase();

    table
        .iter()
        .find(|entry| contains_word(&haystack, &entry.to_lowercase()))
        .map(|entry| entry.to_string())
}

fn contains_word(haystack: &str, word: &str) -> bool {
    haystack.match_indices(word).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + word.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}
