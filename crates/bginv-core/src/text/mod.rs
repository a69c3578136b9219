//! Document to plain text: PDF text layer, OCR of scanned pages, DOCX.

mod docx;

pub use docx::extract_docx_text;

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::config::{BginvConfig, PdfConfig};
use crate::ocr::OcrBackend;
use crate::pdf::PdfDocument;

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Kind from the file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }

    /// Kind from the leading magic bytes.
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if data.starts_with(b"%PDF") {
            Some(Self::Pdf)
        } else if data.starts_with(b"PK\x03\x04") {
            Some(Self::Docx)
        } else {
            None
        }
    }
}

/// Where the text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Embedded PDF text layer.
    TextLayer,
    /// OCR of PDF page images.
    Ocr,
    /// DOCX paragraphs.
    Docx,
}

/// Plain text of one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedText {
    pub text: String,
    pub source: SourceKind,
    /// Page count (1 for DOCX).
    pub pages: u32,
    /// OCR ran, whether or not its text was kept.
    pub used_ocr: bool,
}

impl ExtractedText {
    /// Trimmed, non-empty lines in document order.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines().map(str::trim).filter(|l| !l.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Extracts text from PDF and DOCX files, with optional OCR of scans.
#[derive(Clone)]
pub struct TextExtractor {
    config: PdfConfig,
    ocr: Option<Arc<dyn OcrBackend>>,
}

impl TextExtractor {
    pub fn new(config: PdfConfig) -> Self {
        Self { config, ocr: None }
    }

    /// Use `backend` for PDFs without a usable text layer.
    pub fn with_ocr(mut self, backend: Arc<dyn OcrBackend>) -> Self {
        self.ocr = Some(backend);
        self
    }

    /// Build an extractor from configuration, loading the OCR models when
    /// OCR is enabled. Missing models only disable OCR.
    pub fn from_config(config: &BginvConfig) -> Self {
        let extractor = Self::new(config.pdf.clone());

        #[cfg(feature = "ocr")]
        if config.ocr.enabled {
            match crate::ocr::PureOcrEngine::from_config(&config.ocr) {
                Ok(engine) => return extractor.with_ocr(Arc::new(engine)),
                Err(e) => warn!("OCR disabled: {}", e),
            }
        }

        extractor
    }

    /// Text of the file, empty when it cannot be read.
    pub fn extract(&self, path: &Path, kind: DocumentKind) -> String {
        match self.try_extract(path, kind) {
            Ok(extracted) => extracted.text,
            Err(e) => {
                warn!("Text extraction failed for {}: {}", path.display(), e);
                String::new()
            }
        }
    }

    pub fn try_extract(&self, path: &Path, kind: DocumentKind) -> Result<ExtractedText> {
        info!("Extracting text from {}", path.display());
        let data = std::fs::read(path)?;
        self.try_extract_bytes(&data, kind)
    }

    pub fn try_extract_bytes(&self, data: &[u8], kind: DocumentKind) -> Result<ExtractedText> {
        match kind {
            DocumentKind::Pdf => self.extract_pdf(data),
            DocumentKind::Docx => Ok(ExtractedText {
                text: extract_docx_text(data)?,
                source: SourceKind::Docx,
                pages: 1,
                used_ocr: false,
            }),
        }
    }

    fn extract_pdf(&self, data: &[u8]) -> Result<ExtractedText> {
        let pdf = PdfDocument::load(data)?;
        let pages = pdf.page_count();

        let text = match pdf.text() {
            Ok(text) => text,
            Err(e) => {
                warn!("PDF text layer unreadable: {}", e);
                String::new()
            }
        };

        let text_len = text.trim().chars().count();
        debug!("PDF text layer has {} characters on {} pages", text_len, pages);

        if text_len >= self.config.min_text_length {
            return Ok(ExtractedText {
                text,
                source: SourceKind::TextLayer,
                pages,
                used_ocr: false,
            });
        }

        let Some(ocr) = &self.ocr else {
            debug!("Text layer too short and no OCR backend configured");
            return Ok(ExtractedText {
                text,
                source: SourceKind::TextLayer,
                pages,
                used_ocr: false,
            });
        };

        info!("Text layer too short ({} chars), running OCR", text_len);
        let ocr_text = self.ocr_pages(&pdf, ocr.as_ref())?;

        if ocr_text.trim().is_empty() {
            debug!("OCR found no text, keeping the text layer");
            return Ok(ExtractedText {
                text,
                source: SourceKind::TextLayer,
                pages,
                used_ocr: true,
            });
        }

        Ok(ExtractedText {
            text: ocr_text,
            source: SourceKind::Ocr,
            pages,
            used_ocr: true,
        })
    }

    /// OCR every image of the first `max_pages` pages, once each.
    fn ocr_pages(&self, pdf: &PdfDocument, ocr: &dyn OcrBackend) -> Result<String> {
        let last_page = match self.config.max_pages {
            0 => pdf.page_count(),
            max => pdf.page_count().min(u32::try_from(max).unwrap_or(u32::MAX)),
        };
        let mut page_texts = Vec::new();

        for page in 1..=last_page {
            let images = pdf.page_images(page)?;
            if images.is_empty() {
                debug!("Page {} has no decodable images", page);
                continue;
            }

            for image in &images {
                match ocr.recognize(image) {
                    Ok(result) if !result.text.trim().is_empty() => page_texts.push(result.text),
                    Ok(_) => debug!("OCR found no text on page {}", page),
                    Err(e) => warn!("OCR failed on page {}: {}", page, e),
                }
            }
        }

        Ok(page_texts.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_kind_from_path() {
        assert_eq!(DocumentKind::from_path(&PathBuf::from("a/b.PDF")), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_path(&PathBuf::from("inv.docx")), Some(DocumentKind::Docx));
        assert_eq!(DocumentKind::from_path(&PathBuf::from("inv.doc")), None);
        assert_eq!(DocumentKind::from_path(&PathBuf::from("noext")), None);
    }

    #[test]
    fn test_sniff() {
        assert_eq!(DocumentKind::sniff(b"%PDF-1.7\n"), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::sniff(b"PK\x03\x04rest"), Some(DocumentKind::Docx));
        assert_eq!(DocumentKind::sniff(b"hello"), None);
    }

    #[test]
    fn test_extract_never_fails() {
        let extractor = TextExtractor::new(PdfConfig::default());
        let text = extractor.extract(&PathBuf::from("/nonexistent/invoice.pdf"), DocumentKind::Pdf);
        assert_eq!(text, "");
    }

    #[test]
    fn test_lines_skip_blanks() {
        let extracted = ExtractedText {
            text: "  INVOICE \n\n Total: 1.00\n".to_string(),
            source: SourceKind::TextLayer,
            pages: 1,
            used_ocr: false,
        };
        assert_eq!(extracted.lines().collect::<Vec<_>>(), vec!["INVOICE", "Total: 1.00"]);
    }
}
