//! PDF processing module.

mod extractor;

pub use extractor::PdfDocument;

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;
