//! Common regex patterns and lookup tables for invoice field extraction.

use lazy_static::lazy_static;
use regex::Regex;

/// English month names with the abbreviation chrono's `%b` accepts.
pub const MONTHS: [(&str, &str); 12] = [
    ("January", "Jan"),
    ("February", "Feb"),
    ("March", "Mar"),
    ("April", "Apr"),
    ("May", "May"),
    ("June", "Jun"),
    ("July", "Jul"),
    ("August", "Aug"),
    ("September", "Sep"),
    ("October", "Oct"),
    ("November", "Nov"),
    ("December", "Dec"),
];

/// Currency codes recognized as words, in priority order.
pub const CURRENCY_CODES: [&str; 10] = [
    "EUR", "USD", "BGN", "GBP", "RON", "PLN", "HUF", "TRY", "ILS", "CHF",
];

/// Codes that are also everyday words ("try", "Ron"), matched in capitals only.
pub const UPPERCASE_ONLY_CODES: [&str; 2] = ["RON", "TRY"];

/// Currency symbols and the code they stand for.
pub const CURRENCY_SYMBOLS: [(&str, &str); 4] = [("€", "EUR"), ("$", "USD"), ("£", "GBP"), ("лв", "BGN")];

/// Lowercase words that mark the header row of a service table.
pub const TABLE_HEADER_KEYWORDS: [&str; 5] = ["description", "item", "activity", "услуга", "описание"];

/// Lowercase prefixes of the lines that close a service table.
pub const TABLE_FOOTER_PREFIXES: [&str; 7] = [
    "subtotal",
    "total",
    "tax",
    "vat",
    "общо",
    "данъчна основа",
    "ддс",
];

/// Labels stripped from recipient names.
pub const NAME_LABELS: [&str; 5] = ["Supplier", "Customer", "Client", "Доставчик", "Получател"];

/// Legal-form suffixes removed from the supplier name before matching.
pub const LEGAL_FORMS: [&str; 14] = [
    "LTD", "LIMITED", "EOOD", "OOD", "EAD", "AD", "ET", "GMBH", "LLC", "INC", "ЕООД", "ООД", "ЕАД",
    "АД",
];

/// Bulgarian cities recognized without a label.
pub const KNOWN_CITIES: [&str; 10] = [
    "Sofia", "Varna", "Plovdiv", "Burgas", "Ruse", "София", "Варна", "Пловдив", "Бургас", "Русе",
];

/// Country names recognized without a label.
pub const KNOWN_COUNTRIES: [&str; 12] = [
    "Bulgaria",
    "България",
    "Germany",
    "Austria",
    "Romania",
    "Greece",
    "Israel",
    "Poland",
    "United Kingdom",
    "United States",
    "Switzerland",
    "Netherlands",
];

fn month_alternation(full: bool) -> String {
    MONTHS
        .iter()
        .map(|(long, short)| if full { *long } else { *short })
        .collect::<Vec<_>>()
        .join("|")
}

lazy_static! {
    /// Date patterns paired with the chrono format each match is parsed with.
    pub static ref DATE_FORMATS: Vec<(Regex, &'static str)> = vec![
        (Regex::new(r"\b\d{1,2}/\d{1,2}/\d{4}\b").unwrap(), "%d/%m/%Y"),
        (Regex::new(r"\b\d{4}-\d{1,2}-\d{1,2}\b").unwrap(), "%Y-%m-%d"),
        (Regex::new(r"\b\d{1,2}\.\d{1,2}\.\d{4}\b").unwrap(), "%d.%m.%Y"),
        (
            Regex::new(&format!(r"\b(?:{})\s+\d{{1,2}},\s*\d{{4}}\b", month_alternation(true))).unwrap(),
            "%B %d, %Y",
        ),
        (
            Regex::new(&format!(r"\b(?:{})\s+\d{{1,2}},\s*\d{{4}}\b", month_alternation(false))).unwrap(),
            "%b %d, %Y",
        ),
    ];

    // Labelled invoice date
    pub static ref INVOICE_DATE_LABEL: Regex = Regex::new(
        r"(?im)^\s*(?:invoice\s+date|date\s+of\s+issue|issue\s+date|date|дата\s+на\s+издаване|дата)\s*[:.]?\s*(.+)$"
    ).unwrap();

    // Service period inside a line
    pub static ref SERVICE_DATE_DMY: Regex = Regex::new(
        r"\b\d{1,2}\.(\d{1,2})\.(\d{4})\b"
    ).unwrap();

    pub static ref SERVICE_DATE_MY: Regex = Regex::new(
        r"\b(\d{1,2})/(\d{4})\b"
    ).unwrap();

    pub static ref SERVICE_DATE_MONTH_NAME: Regex = Regex::new(&format!(
        r"(?i)\b({}|{})\s+(\d{{4}})\b",
        month_alternation(true),
        month_alternation(false)
    )).unwrap();

    // Amount at the end of a service line, optionally followed by a currency
    pub static ref LINE_AMOUNT: Regex = Regex::new(
        r"(?i)(-?\d[\d,]*\.\d{2}|-?\d[\d.]*,\d{2})\s*(?:EUR|USD|BGN|GBP|RON|PLN|HUF|TRY|ILS|CHF|лв\.?|€|\$|£)?\s*$"
    ).unwrap();

    // Any amount with two decimals
    pub static ref AMOUNT: Regex = Regex::new(
        r"-?\d[\d,]*\.\d{2}\b|-?\d[\d.]*,\d{2}\b"
    ).unwrap();

    // Lines carrying the invoice total
    pub static ref TOTAL_LINE: Regex = Regex::new(
        r"(?i)(?:grand\s+total|amount\s+due|total|общо|сума\s+за\s+плащане)"
    ).unwrap();

    // Leading row number of a table line ("1. ", "2)", "3 |")
    pub static ref ROW_ORDINAL: Regex = Regex::new(
        r"^\d{1,2}(?:\s*[)|\t]\s*|\.\s+)"
    ).unwrap();

    // Header row of a service table
    pub static ref TABLE_HEADER: Regex = Regex::new(&format!(
        r"(?i)\b(?:{})\b",
        TABLE_HEADER_KEYWORDS.join("|")
    )).unwrap();

    // Number of the source invoice ("Invoice No 2021-118", "Фактура № 0000123")
    pub static ref INVOICE_NUMBER: Regex = Regex::new(
        r"(?i)(?:\b(?:invoice|inv\.|фактура|ф-ра)(?:\s*(?:no\.?|number|nr\.?|#|№))?|№)\s*[:#]?\s*([A-Z0-9/-]*\d[A-Z0-9/.-]*)"
    ).unwrap();

    // VAT percent
    pub static ref VAT_PERCENT: Regex = Regex::new(
        r"(?i)\b(?:ДДС|VAT)[^\d%\n]{0,8}(\d{1,2}(?:[.,]\d{1,2})?)\s*%"
    ).unwrap();

    // Currency detection, one pattern per code in priority order
    pub static ref CURRENCY_CODE_PATTERNS: Vec<(&'static str, Regex)> = CURRENCY_CODES
        .iter()
        .map(|code| {
            let flags = if UPPERCASE_ONLY_CODES.contains(code) { "" } else { "(?i)" };
            (*code, Regex::new(&format!(r"{}\b{}\b", flags, code)).unwrap())
        })
        .collect();

    // Party sections
    pub static ref RECIPIENT_KEYWORD: Regex = Regex::new(
        r"(?i)^\s*(?:customer\s+name|bill\s+to|invoice\s+to|client|customer|recipient|получател|клиент|купувач)\s*:\s*(.*)$"
    ).unwrap();

    pub static ref SUPPLIER_KEYWORD: Regex = Regex::new(
        r"(?i)^\s*(?:supplier|seller|vendor|issued\s+by|доставчик|продавач|изпълнител)\b"
    ).unwrap();

    pub static ref DOCUMENT_TITLE: Regex = Regex::new(
        r"(?i)^\s*(?:tax\s+invoice|invoice|proforma|credit\s+note|фактура|проформа)\b"
    ).unwrap();

    // Recipient sub-fields
    pub static ref BG_VAT: Regex = Regex::new(
        r"(?i)\b(BG\s?\d{9,10})\b"
    ).unwrap();

    pub static ref LABELLED_VAT: Regex = Regex::new(
        r"(?i)(?:VAT|ДДС|ЗДДС)[^:\n]{0,12}[:#№]?\s*([A-Z]{2}\s?[0-9A-Z]{8,12})\b"
    ).unwrap();

    pub static ref COMPANY_ID: Regex = Regex::new(
        r"(?i)(?:\bID\s*No|\bCompany\s*ID|\bEIK|ЕИК|\bUIC|Булстат|\bReg(?:istration)?\.?\s*No)\.?\s*[:#№]?\s*(\d{6,13})\b"
    ).unwrap();

    pub static ref ADDRESS_LABEL: Regex = Regex::new(
        r"(?i)^\s*(?:address|адрес)\s*:\s*(.+)$"
    ).unwrap();

    pub static ref STREET_LIKE: Regex = Regex::new(
        r"(?i)(?:\bstr\.|\bstreet\b|\bblvd\.?|\bbul\.|\bboulevard\b|\bavenue\b|\bave\.|\broad\b|ул\.|бул\.|ж\.к\.)"
    ).unwrap();

    pub static ref CITY_LABEL: Regex = Regex::new(
        r"(?i)^\s*(?:city|town|град)\s*:\s*(.+)$"
    ).unwrap();

    pub static ref COUNTRY_LABEL: Regex = Regex::new(
        r"(?i)^\s*(?:country|държава)\s*:\s*(.+)$"
    ).unwrap();

    // "1000 Sofia" or "Sofia 1000"
    pub static ref POSTCODE_CITY: Regex = Regex::new(
        r"^\s*(?:\d{4}\s+(\p{L}[\p{L} .-]*)|(\p{L}[\p{L} .-]*?),?\s+\d{4})\s*$"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_amount_conventions() {
        let caps = LINE_AMOUNT.captures("Consulting services 4,700.00 EUR").unwrap();
        assert_eq!(&caps[1], "4,700.00");

        let caps = LINE_AMOUNT.captures("Услуга 5.640,00 лв.").unwrap();
        assert_eq!(&caps[1], "5.640,00");

        assert!(LINE_AMOUNT.captures("Hours worked 12").is_none());
    }

    #[test]
    fn test_recipient_keyword() {
        let caps = RECIPIENT_KEYWORD.captures("Customer Name: QUESTE LTD").unwrap();
        assert_eq!(caps[1].trim(), "QUESTE LTD");

        let caps = RECIPIENT_KEYWORD.captures("Bill To:").unwrap();
        assert_eq!(caps[1].trim(), "");

        assert!(RECIPIENT_KEYWORD.is_match("Получател: Банана ЕООД"));
        assert!(!RECIPIENT_KEYWORD.is_match("Customer support is available"));
    }

    #[test]
    fn test_company_id() {
        let caps = COMPANY_ID.captures("ID No: 203743737").unwrap();
        assert_eq!(&caps[1], "203743737");

        let caps = COMPANY_ID.captures("ЕИК 131234567").unwrap();
        assert_eq!(&caps[1], "131234567");
    }

    #[test]
    fn test_invoice_number() {
        let caps = INVOICE_NUMBER.captures("INVOICE No 2021-118").unwrap();
        assert_eq!(&caps[1], "2021-118");

        assert!(INVOICE_NUMBER.captures("Invoice date: August 18, 2021").is_none());
        assert!(INVOICE_NUMBER.captures("VAT No: BG203743737").is_none());
    }

    #[test]
    fn test_vat_percent() {
        let caps = VAT_PERCENT.captures("VAT 20%: 586.75").unwrap();
        assert_eq!(&caps[1], "20");

        let caps = VAT_PERCENT.captures("ДДС (9 %)").unwrap();
        assert_eq!(&caps[1], "9");
    }
}
