//! Error types for the bginv-core library.

use thiserror::Error;

/// Main error type for the bginv library.
#[derive(Error, Debug)]
pub enum BginvError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// DOCX processing error.
    #[error("DOCX error: {0}")]
    Docx(String),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Invoice extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Exchange rate error.
    #[error("exchange rate error: {0}")]
    Rate(#[from] RateError),

    /// Translation service error.
    #[error("translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Supplier store error.
    #[error("supplier store error: {0}")]
    Store(#[from] StoreError),

    /// Document rendering error.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),
}

/// Errors related to invoice field extraction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// No text was available to extract from.
    #[error("document contains no readable text")]
    EmptyText,

    /// No service line or total could be found.
    #[error("no service lines found in document")]
    NoServiceLines,

    /// More service lines than the templates support.
    #[error("document has {found} service lines, at most {max} are supported")]
    TooManyServiceLines { found: usize, max: usize },

    /// No recipient name could be identified.
    #[error("recipient name not found in document")]
    MissingRecipient,
}

/// Errors related to exchange rate lookup.
#[derive(Error, Debug)]
pub enum RateError {
    /// Network or HTTP error.
    #[error("rate service request failed: {0}")]
    Network(String),

    /// The service answered but had no usable rate.
    #[error("rate service returned no rate for {currency} on {date}")]
    Unpublished { currency: String, date: String },

    /// Failed to parse the response.
    #[error("malformed rate response: {0}")]
    Parse(String),

    /// Neither the service nor the fallback table had a rate.
    #[error("no exchange rate available for {0}")]
    NotFound(String),
}

/// Errors related to the translation service.
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Network or HTTP error.
    #[error("translation request failed: {0}")]
    Network(String),

    /// The service rejected the request.
    #[error("translation service error: {0}")]
    Api(String),

    /// Failed to parse the response.
    #[error("malformed translation response: {0}")]
    Parse(String),
}

/// Errors related to the supplier table.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Supplier ID not present in the table.
    #[error("supplier not found: {0}")]
    UnknownSupplier(String),

    /// Supplier profile lacks a field required on an invoice.
    #[error("supplier {id} is missing required fields: {fields}")]
    IncompleteProfile { id: String, fields: String },

    /// A required column is absent from the table header.
    #[error("supplier table has no {0:?} column")]
    MissingColumn(String),

    /// The stored invoice counter is not a whole number.
    #[error("supplier {id} has an invalid invoice counter: {value:?}")]
    InvalidCounter { id: String, value: String },

    /// Reading or writing the table failed.
    #[error("supplier table I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The table could not be parsed or serialized.
    #[error("supplier table is malformed: {0}")]
    Csv(#[from] csv::Error),

    /// A lock guarding the table was poisoned by a panicking writer.
    #[error("supplier table lock poisoned")]
    Poisoned,
}

/// Errors related to document assembly and rendering.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Row count has no matching template.
    #[error("no template for {0} service rows (supported: 1-5)")]
    UnsupportedRowCount(usize),

    /// Writing the output failed.
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing the output failed.
    #[error("failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for the bginv library.
pub type Result<T> = std::result::Result<T, BginvError>;
