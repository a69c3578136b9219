//! End-to-end invoice generation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::currency::CurrencyConverter;
use crate::document::{DocumentLine, DocumentRenderer, InvoiceDocument, JsonRenderer, TemplateSet};
use crate::error::{BginvError, ExtractionError, RateError, RenderError, StoreError};
use crate::invoice::{InvoiceParser, RuleBasedParser};
use crate::localization::{amount_in_words, Localizer};
use crate::models::config::{BginvConfig, MissingRecipient};
use crate::models::invoice::{
    ExtractionResult, InvoiceTotals, ParsedInvoice, RecipientDetails, SupplierHint, SupplierProfile,
};
use crate::suppliers::SupplierStore;
use crate::text::{DocumentKind, ExtractedText, TextExtractor};

/// Printed on every invoice.
pub const TRANSACTION_COUNTRY: &str = "България";
pub const TRANSACTION_BASIS: &str = "По сметка";

/// Failure of one invoice request.
#[derive(Error, Debug)]
pub enum InvoiceError {
    /// The file is neither PDF nor DOCX.
    #[error("unsupported document type: {0}")]
    UnsupportedDocument(String),

    /// The document could not be read.
    #[error("could not read document: {0}")]
    Document(#[from] BginvError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Rate(#[from] RateError),

    #[error(transparent)]
    Render(#[from] RenderError),

    /// A background task died.
    #[error("internal error: {0}")]
    Internal(String),
}

impl InvoiceError {
    /// HTTP-style status for the response envelope.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::UnsupportedDocument(_) => 400,
            Self::Document(BginvError::Io(_)) => 500,
            Self::Document(_) => 422,
            Self::Extraction(_) => 422,
            Self::Store(StoreError::UnknownSupplier(_)) => 404,
            Self::Store(StoreError::IncompleteProfile { .. }) => 422,
            Self::Store(_) => 500,
            Self::Rate(_) => 502,
            Self::Render(RenderError::UnsupportedRowCount(_)) => 422,
            Self::Render(_) => 500,
            Self::Internal(_) => 500,
        }
    }
}

/// Identifies a generated invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceData {
    pub invoice_number: String,
    pub file_path: String,
}

/// Response envelope returned for every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<InvoiceData>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ApiResponse {
    pub fn ok(data: InvoiceData, warnings: Vec<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            errors: Vec::new(),
            warnings,
        }
    }

    pub fn failure(error: &InvoiceError) -> Self {
        Self {
            success: false,
            data: None,
            errors: vec![error.to_string()],
            warnings: Vec::new(),
        }
    }
}

impl From<&Result<GeneratedInvoice, InvoiceError>> for ApiResponse {
    fn from(result: &Result<GeneratedInvoice, InvoiceError>) -> Self {
        match result {
            Ok(generated) => Self::ok(
                InvoiceData {
                    invoice_number: generated.invoice_number.clone(),
                    file_path: generated.file_path.display().to_string(),
                },
                generated.warnings.clone(),
            ),
            Err(e) => Self::failure(e),
        }
    }
}

/// A successfully generated invoice.
#[derive(Debug, Clone)]
pub struct GeneratedInvoice {
    pub invoice_number: String,
    pub file_path: PathBuf,
    pub document: InvoiceDocument,
    pub result: ExtractionResult,
    pub warnings: Vec<String>,
}

/// Document in, rendered Bulgarian invoice out.
pub struct InvoicePipeline<S: SupplierStore> {
    config: BginvConfig,
    extractor: TextExtractor,
    parser: RuleBasedParser,
    store: Arc<S>,
    converter: CurrencyConverter,
    localizer: Localizer,
    templates: TemplateSet,
    renderer: Arc<dyn DocumentRenderer>,
}

impl<S: SupplierStore> InvoicePipeline<S> {
    /// Pipeline with the configured services and the JSON renderer.
    pub fn new(config: BginvConfig, store: Arc<S>) -> Result<Self, BginvError> {
        let converter = CurrencyConverter::new(&config.currency)?;
        let localizer = Localizer::new(&config.localization)?;

        Ok(Self {
            extractor: TextExtractor::from_config(&config),
            parser: RuleBasedParser::new(config.extraction.clone()),
            templates: TemplateSet::new(config.documents.template_dir.clone()),
            renderer: Arc::new(JsonRenderer),
            store,
            converter,
            localizer,
            config,
        })
    }

    /// Pipeline without network services or OCR models.
    pub fn offline(config: BginvConfig, store: Arc<S>) -> Self {
        Self {
            extractor: TextExtractor::new(config.pdf.clone()),
            parser: RuleBasedParser::new(config.extraction.clone()),
            templates: TemplateSet::new(config.documents.template_dir.clone()),
            renderer: Arc::new(JsonRenderer),
            converter: CurrencyConverter::offline(&config.currency),
            localizer: Localizer::offline(&config.localization),
            store,
            config,
        }
    }

    pub fn with_extractor(mut self, extractor: TextExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_converter(mut self, converter: CurrencyConverter) -> Self {
        self.converter = converter;
        self
    }

    pub fn with_localizer(mut self, localizer: Localizer) -> Self {
        self.localizer = localizer;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn DocumentRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Fix the date used for documents that state none.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.parser = RuleBasedParser::new(self.config.extraction.clone()).with_reference_date(date);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Text of a document, read on a blocking thread.
    pub async fn extract_text(&self, path: &Path) -> Result<ExtractedText, InvoiceError> {
        let kind = DocumentKind::from_path(path)
            .ok_or_else(|| InvoiceError::UnsupportedDocument(path.display().to_string()))?;

        let extractor = self.extractor.clone();
        let path = path.to_path_buf();
        let extracted = tokio::task::spawn_blocking(move || extractor.try_extract(&path, kind))
            .await
            .map_err(|e| InvoiceError::Internal(e.to_string()))??;

        debug!(
            "Extracted {} characters ({:?}, {} pages)",
            extracted.text.len(),
            extracted.source,
            extracted.pages
        );
        Ok(extracted)
    }

    /// Parse a document and compute its totals without issuing an invoice.
    pub async fn analyze(
        &self,
        path: &Path,
        supplier: &SupplierHint,
    ) -> Result<ExtractionResult, InvoiceError> {
        let extracted = self.extract_text(path).await?;
        self.analyze_text(&extracted.text, supplier).await
    }

    pub async fn analyze_text(
        &self,
        text: &str,
        supplier: &SupplierHint,
    ) -> Result<ExtractionResult, InvoiceError> {
        let parsed = self.parser.parse(text, supplier)?;
        let mut warnings = parsed.warnings.clone();

        let quote = self
            .converter
            .exchange_rate(parsed.invoice_date, &parsed.currency)
            .await?;
        warnings.extend(quote.warning);

        let totals = InvoiceTotals::compute(&parsed.lines, &parsed.currency, quote.rate, parsed.vat_percent);

        Ok(ExtractionResult {
            recipient: parsed.recipient,
            lines: parsed.lines,
            source_invoice_number: parsed.source_invoice_number,
            invoice_date: parsed.invoice_date,
            totals,
            confidence: parsed.confidence,
            processing_errors: warnings,
        })
    }

    /// Generate an invoice for supplier `supplier_id` from a document file.
    pub async fn generate(&self, supplier_id: &str, path: &Path) -> Result<GeneratedInvoice, InvoiceError> {
        let supplier = self.supplier(supplier_id)?;
        let extracted = self.extract_text(path).await?;
        self.generate_for(supplier, &extracted.text).await
    }

    /// Generate an invoice from already extracted text.
    pub async fn generate_from_text(
        &self,
        supplier_id: &str,
        text: &str,
    ) -> Result<GeneratedInvoice, InvoiceError> {
        let supplier = self.supplier(supplier_id)?;
        self.generate_for(supplier, text).await
    }

    /// Like [`generate`](Self::generate), folded into the response envelope.
    pub async fn process(&self, supplier_id: &str, path: &Path) -> (ApiResponse, u16) {
        let result = self.generate(supplier_id, path).await;
        let status = match &result {
            Ok(_) => 200,
            Err(e) => {
                warn!("Invoice generation failed: {}", e);
                e.status_code()
            }
        };
        (ApiResponse::from(&result), status)
    }

    fn supplier(&self, supplier_id: &str) -> Result<SupplierProfile, InvoiceError> {
        let supplier = self.store.get(supplier_id)?;
        supplier.validate()?;
        Ok(supplier)
    }

    async fn generate_for(
        &self,
        supplier: SupplierProfile,
        text: &str,
    ) -> Result<GeneratedInvoice, InvoiceError> {
        let mut parsed = self.parser.parse(text, &supplier.hint())?;
        let mut warnings = parsed.warnings.clone();

        if parsed.recipient.name.is_empty() {
            match self.config.extraction.missing_recipient {
                MissingRecipient::Reject => return Err(ExtractionError::MissingRecipient.into()),
                MissingRecipient::Placeholder => {
                    parsed.recipient.name = self.config.extraction.recipient_placeholder.clone();
                }
            }
        }

        if parsed.lines.is_empty() {
            return Err(ExtractionError::NoServiceLines.into());
        }

        let template = self.templates.select(parsed.lines.len())?;

        let (quote, localized) = tokio::join!(
            self.converter
                .exchange_rate(parsed.invoice_date, &parsed.currency),
            self.localize(&supplier, &parsed)
        );
        let quote = quote?;
        let (supplier_bg, recipient_bg, lines, localization_warnings) = localized;
        warnings.extend(quote.warning.clone());
        warnings.extend(localization_warnings);

        let totals = InvoiceTotals::compute(&parsed.lines, &parsed.currency, quote.rate, parsed.vat_percent);
        let total_in_words = amount_in_words(totals.grand_total);

        info!(
            "Invoice for {}: {} {} at rate {}, total {} BGN",
            parsed.recipient.name, totals.subtotal_original, totals.currency, quote.rate, totals.grand_total
        );

        let width = self.config.documents.invoice_number_width;
        let output_dir = self.config.documents.output_dir.clone();

        // Set once the output exists, so a failed counter commit can remove it
        let mut written: Option<PathBuf> = None;
        let committed = self.store.with_next_invoice_number(&supplier.id, |_, number| {
            let document = InvoiceDocument {
                invoice_number: format!("{:0width$}", number, width = width),
                date: parsed.invoice_date,
                compiled_by: supplier_bg.contact_person.clone(),
                supplier: supplier_bg.clone(),
                recipient: recipient_bg.clone(),
                lines: lines.clone(),
                totals: totals.clone(),
                total_in_words: total_in_words.clone(),
                transaction_country: TRANSACTION_COUNTRY.to_string(),
                transaction_basis: TRANSACTION_BASIS.to_string(),
            };
            let rendered = self.renderer.render(&document, &template, &output_dir)?;
            written = Some(rendered.path.clone());
            Ok::<_, InvoiceError>((document, rendered))
        });

        let (document, rendered) = match committed {
            Ok(output) => output,
            Err(e) => {
                if let Some(path) = written {
                    warn!("Counter update failed, removing {}", path.display());
                    if let Err(remove) = std::fs::remove_file(&path) {
                        warn!("Could not remove {}: {}", path.display(), remove);
                    }
                }
                return Err(e);
            }
        };

        info!("Generated invoice {} at {}", document.invoice_number, rendered.path.display());

        Ok(GeneratedInvoice {
            invoice_number: document.invoice_number.clone(),
            file_path: rendered.path,
            result: ExtractionResult {
                recipient: parsed.recipient,
                lines: parsed.lines,
                source_invoice_number: parsed.source_invoice_number,
                invoice_date: parsed.invoice_date,
                totals,
                confidence: parsed.confidence,
                processing_errors: warnings.clone(),
            },
            document,
            warnings,
        })
    }

    /// Bulgarian renderings of the supplier, recipient and service lines.
    async fn localize(
        &self,
        supplier: &SupplierProfile,
        parsed: &ParsedInvoice,
    ) -> (SupplierProfile, RecipientDetails, Vec<DocumentLine>, Vec<String>) {
        let mut warnings = Vec::new();
        let mut bg = |localized: crate::localization::Localized| {
            warnings.extend(localized.warning);
            localized.text
        };

        let mut supplier_bg = supplier.clone();
        supplier_bg.name = bg(self.localizer.localize(&supplier.name).await);
        supplier_bg.address = bg(self.localizer.localize(&supplier.address).await);
        supplier_bg.city = bg(self.localizer.localize(&supplier.city).await);
        supplier_bg.bank_name = bg(self.localizer.localize(&supplier.bank_name).await);
        supplier_bg.contact_person = bg(self.localizer.localize(&supplier.contact_person).await);

        let recipient = &parsed.recipient;
        let mut recipient_bg = recipient.clone();
        recipient_bg.name = bg(self.localizer.localize(&recipient.name).await);
        recipient_bg.address = bg(self.localizer.localize(&recipient.address).await);
        recipient_bg.city = bg(self.localizer.localize(&recipient.city).await);
        recipient_bg.country = bg(self.localizer.localize(&recipient.country).await);

        let mut lines = Vec::with_capacity(parsed.lines.len());
        for item in &parsed.lines {
            lines.push(DocumentLine {
                description: bg(self.localizer.localize(&item.description).await),
                amount: item.line_total,
                service_date: item.service_date.as_ref().map(|d| d.label()).unwrap_or_default(),
            });
        }

        (supplier_bg, recipient_bg, lines, warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(InvoiceError::UnsupportedDocument("a.txt".into()).status_code(), 400);
        assert_eq!(InvoiceError::Store(StoreError::UnknownSupplier("1".into())).status_code(), 404);
        assert_eq!(InvoiceError::Extraction(ExtractionError::EmptyText).status_code(), 422);
        assert_eq!(InvoiceError::Rate(RateError::NotFound("JPY".into())).status_code(), 502);
        assert_eq!(InvoiceError::Render(RenderError::UnsupportedRowCount(6)).status_code(), 422);
        assert_eq!(InvoiceError::Internal("x".into()).status_code(), 500);
    }

    #[test]
    fn test_failure_envelope() {
        let response = ApiResponse::failure(&InvoiceError::Extraction(ExtractionError::NoServiceLines));
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["success"], false);
        assert!(json["data"].is_null());
        assert_eq!(json["errors"][0], "no service lines found in document");
        assert!(json.get("warnings").is_none());
    }
}
