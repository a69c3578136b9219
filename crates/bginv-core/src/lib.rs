//! Core library for generating Bulgarian invoices from foreign invoices.
//!
//! This crate provides:
//! - Document text extraction (PDF text layer, OCR of scans, DOCX)
//! - Rule-based invoice field extraction for English and Bulgarian documents
//! - Exchange rates to BGN and VAT totals
//! - Bulgarian localization (amounts in words, transliteration, translation)
//! - Supplier profiles with serialized invoice numbering
//! - Invoice document assembly and rendering

pub mod currency;
pub mod document;
pub mod error;
pub mod invoice;
pub mod localization;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod suppliers;
pub mod text;

pub use currency::{CurrencyConverter, RateQuote, RateSource, RateSourceKind, EUR_BGN_PEG};
pub use document::{DocumentRenderer, InvoiceDocument, JsonRenderer, TemplateSet};
pub use error::{BginvError, Result};
pub use invoice::{InvoiceParser, RuleBasedParser};
pub use localization::{amount_in_words, is_cyrillic, transliterate, Localizer};
pub use models::config::BginvConfig;
pub use models::invoice::{
    ExtractionResult, InvoiceTotals, ParsedInvoice, RecipientDetails, ServiceLineItem, SupplierHint,
    SupplierProfile,
};
pub use ocr::{OcrBackend, OcrResult, TextBox};
#[cfg(feature = "ocr")]
pub use ocr::PureOcrEngine;
pub use pipeline::{ApiResponse, GeneratedInvoice, InvoiceData, InvoiceError, InvoicePipeline};
pub use suppliers::{CsvSupplierStore, MemorySupplierStore, SupplierStore};
pub use text::{DocumentKind, ExtractedText, TextExtractor};
