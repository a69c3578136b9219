//! Invoice data models: supplier profile, extracted recipient, service lines
//! and the derived totals.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Static billing profile of the supplier issuing the invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupplierProfile {
    /// Supplier identifier used as the lookup key.
    pub id: String,

    /// Registered company name.
    pub name: String,

    /// VAT number (e.g. BG123456789).
    pub vat_id: String,

    /// Company registration number (EIK).
    pub company_id: String,

    /// Street address.
    pub address: String,

    /// City.
    pub city: String,

    /// Bank name.
    pub bank_name: String,

    /// Bank code (BIC).
    pub bank_code: String,

    /// IBAN the invoice is payable to.
    pub iban: String,

    /// Contact person, also printed as the invoice compiler.
    pub contact_person: String,

    /// Last invoice number issued for this supplier.
    pub last_invoice_number: u64,
}

impl SupplierProfile {
    /// Names of fields that must be present before an invoice can be issued.
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.iban.trim().is_empty() {
            missing.push("IBAN");
        }
        if self.vat_id.trim().is_empty() {
            missing.push("VAT");
        }
        if self.bank_name.trim().is_empty() {
            missing.push("bank name");
        }
        missing
    }

    /// Fail when a field required on an invoice is missing.
    pub fn validate(&self) -> Result<(), StoreError> {
        let missing = self.missing_required_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(StoreError::IncompleteProfile {
                id: self.id.clone(),
                fields: missing.join(", "),
            })
        }
    }

    /// Hint passed to the parser so the supplier is never taken as recipient.
    pub fn hint(&self) -> SupplierHint {
        SupplierHint {
            name: self.name.clone(),
            vat_id: self.vat_id.clone(),
        }
    }
}

/// The known supplier's identity, excluded from recipient matching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupplierHint {
    pub name: String,
    pub vat_id: String,
}

impl SupplierHint {
    pub fn new(name: impl Into<String>, vat_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vat_id: vat_id.into(),
        }
    }

    /// VAT number normalized for comparison (uppercase, no whitespace).
    pub fn normalized_vat(&self) -> Option<String> {
        let vat = normalize_vat(&self.vat_id);
        (!vat.is_empty()).then_some(vat)
    }
}

/// Uppercase a VAT/ID number and drop whitespace and separators.
pub fn normalize_vat(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Recipient (customer) block extracted from the document.
///
/// Every field defaults to empty, meaning "not found".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientDetails {
    pub name: String,
    pub vat_id: String,
    pub company_id: String,
    pub address: String,
    pub city: String,
    pub country: String,
}

impl RecipientDetails {
    /// Sub-fields that were not found, for warnings.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.vat_id.is_empty() {
            missing.push("VAT");
        }
        if self.company_id.is_empty() {
            missing.push("ID");
        }
        if self.address.is_empty() {
            missing.push("address");
        }
        if self.city.is_empty() {
            missing.push("city");
        }
        missing
    }
}

/// Month and year a service was rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDate {
    pub month: u32,
    pub year: i32,
}

const BG_MONTH_ABBR: [&str; 12] = [
    "яну.", "фев.", "март", "апр.", "май", "юни", "юли", "авг.", "септ.", "окт.", "ноем.", "дек.",
];

impl ServiceDate {
    pub fn new(month: u32, year: i32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { month, year })
    }

    /// Localized label, e.g. "авг. 2021".
    pub fn label(&self) -> String {
        format!("{} {}", BG_MONTH_ABBR[(self.month - 1) as usize], self.year)
    }
}

/// A single service row on the output invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceLineItem {
    /// Service description as found in the document.
    pub description: String,

    /// Line total in the document currency.
    pub line_total: Decimal,

    /// Month/year of the service, when the line mentions one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_date: Option<ServiceDate>,
}

impl ServiceLineItem {
    pub fn new(description: impl Into<String>, line_total: Decimal) -> Self {
        Self {
            description: description.into(),
            line_total,
            service_date: None,
        }
    }
}

/// Round to two decimal places, half away from zero, the way every step of
/// the totals does.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Totals in the base currency (BGN), derived from the service lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    /// Currency the document was issued in.
    pub currency: String,

    /// Units of BGN per unit of `currency`.
    pub exchange_rate: Decimal,

    /// Sum of line totals in the document currency.
    pub subtotal_original: Decimal,

    /// Subtotal converted to BGN.
    pub subtotal_base_currency: Decimal,

    /// VAT percent applied (e.g. 20).
    pub vat_percent: Decimal,

    /// VAT amount in BGN.
    pub vat_amount: Decimal,

    /// Subtotal plus VAT in BGN.
    pub grand_total: Decimal,
}

impl InvoiceTotals {
    /// Compute totals from line items. Each step is rounded to 2 places
    /// before it feeds the next one.
    pub fn compute(
        lines: &[ServiceLineItem],
        currency: &str,
        exchange_rate: Decimal,
        vat_percent: Decimal,
    ) -> Self {
        let subtotal_original: Decimal = lines.iter().map(|l| l.line_total).sum();
        let subtotal_base_currency = round2(subtotal_original * exchange_rate);
        let vat_amount = round2(subtotal_base_currency * vat_percent / Decimal::ONE_HUNDRED);
        let grand_total = round2(subtotal_base_currency + vat_amount);

        Self {
            currency: currency.to_string(),
            exchange_rate,
            subtotal_original,
            subtotal_base_currency,
            vat_percent,
            vat_amount,
            grand_total,
        }
    }
}

/// Where the invoice date came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateSource {
    /// A labelled date line ("Invoice date: ...").
    Labelled,
    /// The first recognizable date anywhere in the text.
    Scanned,
    /// Nothing found; the reference date was used.
    Defaulted,
}

/// Output of the field-extraction heuristic for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedInvoice {
    pub recipient: RecipientDetails,
    pub lines: Vec<ServiceLineItem>,
    /// Number the issuer gave the source document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_invoice_number: Option<String>,
    /// Amount on the document's total line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stated_total: Option<Decimal>,
    pub invoice_date: NaiveDate,
    pub date_source: DateSource,
    pub currency: String,
    pub vat_percent: Decimal,
    /// True when the single line was synthesized from a total.
    pub used_fallback_line: bool,
    /// Overall extraction confidence (0.0 - 1.0).
    pub confidence: f32,
    /// Non-fatal issues met while applying fallbacks.
    pub warnings: Vec<String>,
}

/// Everything extracted and computed for one invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub recipient: RecipientDetails,
    pub lines: Vec<ServiceLineItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_invoice_number: Option<String>,
    pub invoice_date: NaiveDate,
    pub totals: InvoiceTotals,
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub processing_errors: Vec<String>,
}
