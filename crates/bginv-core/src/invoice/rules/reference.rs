//! Number the issuer gave the source invoice.

use super::patterns::INVOICE_NUMBER;

const MAX_LEN: usize = 64;

/// The first labelled invoice number, e.g. `2021-118` in "Invoice No 2021-118".
pub fn extract_invoice_number(text: &str) -> Option<String> {
    INVOICE_NUMBER.captures_iter(text).find_map(|caps| {
        let number = caps.get(1)?.as_str().trim_end_matches(['.', '-', '/']);
        (!number.is_empty()).then(|| number.chars().take(MAX_LEN).collect())
    })
}
