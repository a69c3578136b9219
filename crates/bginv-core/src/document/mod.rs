//! The output invoice: typed context, flat template fields and template
//! selection.

mod render;

pub use render::{DocumentRenderer, JsonRenderer, RenderedDocument};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::RenderError;
use crate::invoice::rules::{format_amount, format_date};
use crate::models::invoice::{InvoiceTotals, RecipientDetails, SupplierProfile};

/// Templates exist for 1 to this many service rows.
pub const MAX_TEMPLATE_ROWS: usize = 5;

/// One service row as printed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentLine {
    pub description: String,
    /// Line total in the document currency.
    pub amount: Decimal,
    /// Localized service period label, empty when unknown.
    pub service_date: String,
}

/// Everything printed on a generated invoice, already localized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDocument {
    pub invoice_number: String,
    pub date: NaiveDate,
    pub supplier: SupplierProfile,
    pub recipient: RecipientDetails,
    pub lines: Vec<DocumentLine>,
    pub totals: InvoiceTotals,
    pub total_in_words: String,
    pub transaction_country: String,
    pub transaction_basis: String,
    pub compiled_by: String,
}

impl InvoiceDocument {
    pub fn row_count(&self) -> usize {
        self.lines.len()
    }

    /// Flatten into the key/value pairs the templates reference.
    ///
    /// Row keys are numbered from 1 (`ServiceDescription1`, `Amount1`,
    /// `ServiceDate1`, ...).
    pub fn to_template_fields(&self) -> BTreeMap<String, String> {
        let mut fields = BTreeMap::new();
        let mut put = |key: &str, value: String| {
            fields.insert(key.to_string(), value);
        };

        put("InvoiceNumber", self.invoice_number.clone());
        put("Date", format_date(self.date));

        put("SupplierName", self.supplier.name.clone());
        put("SupplierCompanyID", self.supplier.company_id.clone());
        put("SupplierCompanyVAT", self.supplier.vat_id.clone());
        put("SupplierAddress", self.supplier.address.clone());
        put("SupplierCity", self.supplier.city.clone());
        put("SupplierContactPerson", self.supplier.contact_person.clone());
        put("IBAN", self.supplier.iban.clone());
        put("BankName", self.supplier.bank_name.clone());
        put("BankCode", self.supplier.bank_code.clone());

        put("RecipientName", self.recipient.name.clone());
        put("RecipientID", self.recipient.company_id.clone());
        put("RecipientVAT", self.recipient.vat_id.clone());
        put("RecipientAddress", self.recipient.address.clone());
        put("RecipientCity", self.recipient.city.clone());
        put("RecipientCountry", self.recipient.country.clone());

        put("Currency", self.totals.currency.clone());
        put("ExchangeRate", self.totals.exchange_rate.normalize().to_string());
        put("Amount", format_amount(self.totals.subtotal_original));
        put("AmountBGN", format_amount(self.totals.subtotal_base_currency));
        put("VATPercent", self.totals.vat_percent.normalize().to_string());
        put("VATAmount", format_amount(self.totals.vat_amount));
        put("TotalBGN", format_amount(self.totals.grand_total));
        put("TotalInWords", self.total_in_words.clone());

        put("TransactionCountry", self.transaction_country.clone());
        put("TransactionBasis", self.transaction_basis.clone());
        put("CompiledBy", self.compiled_by.clone());

        for (i, line) in self.lines.iter().enumerate() {
            let n = i + 1;
            put(&format!("ServiceDescription{n}"), line.description.clone());
            put(&format!("Amount{n}"), format_amount(line.amount));
            put(&format!("ServiceDate{n}"), line.service_date.clone());
        }

        fields
    }
}

/// A template chosen for a row count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub rows: usize,
    pub path: PathBuf,
}

impl Template {
    pub fn name(&self) -> String {
        template_file_name(self.rows)
    }
}

fn template_file_name(rows: usize) -> String {
    format!("invoice_template_{}_rows.docx", rows)
}

/// Directory of per-row-count templates.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    dir: PathBuf,
}

impl TemplateSet {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Template for a document with `rows` service lines.
    pub fn select(&self, rows: usize) -> Result<Template, RenderError> {
        if !(1..=MAX_TEMPLATE_ROWS).contains(&rows) {
            return Err(RenderError::UnsupportedRowCount(rows));
        }
        Ok(Template {
            rows,
            path: self.dir.join(template_file_name(rows)),
        })
    }
}
