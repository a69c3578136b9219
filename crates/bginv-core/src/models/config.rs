//! Configuration structures for the invoice pipeline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::document::MAX_TEMPLATE_ROWS;

/// Main configuration for the bginv pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BginvConfig {
    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// OCR engine configuration.
    pub ocr: OcrConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Exchange rate configuration.
    pub currency: CurrencyConfig,

    /// Translation configuration.
    pub localization: LocalizationConfig,

    /// Output document configuration.
    pub documents: DocumentConfig,

    /// Supplier table configuration.
    pub suppliers: SupplierConfig,
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Minimum trimmed text length before falling back to OCR.
    pub min_text_length: usize,

    /// Maximum pages to OCR (0 = unlimited).
    pub max_pages: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            min_text_length: 50,
            max_pages: 10,
        }
    }
}

/// OCR model locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Use OCR for scanned PDFs.
    pub enabled: bool,

    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
        }
    }
}

impl OcrConfig {
    /// Full path to a model file.
    pub fn model_path(&self, file_name: &str) -> PathBuf {
        self.model_dir.join(file_name)
    }
}

/// What to do when a document has more service lines than supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineOverflow {
    /// Keep the first lines and warn.
    #[default]
    Truncate,
    /// Fail the request.
    Reject,
}

/// What to do when no recipient name is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingRecipient {
    /// Fail the request.
    #[default]
    Reject,
    /// Continue with a placeholder name and a warning.
    Placeholder,
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Service rows kept per invoice, capped at the largest template.
    pub max_service_lines: usize,

    /// Policy for documents with too many service lines.
    pub line_overflow: LineOverflow,

    /// Policy for documents without a recipient name.
    pub missing_recipient: MissingRecipient,

    /// Name used under the placeholder policy.
    pub recipient_placeholder: String,

    /// VAT percent used when the document states none.
    pub default_vat_percent: Decimal,

    /// Currency used when none is detected.
    pub default_currency: String,

    /// Description of the line synthesized from an invoice total.
    pub fallback_description: String,

    /// Non-empty lines scanned after a recipient keyword.
    pub scan_window: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_service_lines: 5,
            line_overflow: LineOverflow::Truncate,
            missing_recipient: MissingRecipient::Reject,
            recipient_placeholder: "N/A".to_string(),
            default_vat_percent: Decimal::from(20),
            default_currency: "EUR".to_string(),
            fallback_description: "Consulting services per invoice".to_string(),
            scan_window: 7,
        }
    }
}

impl ExtractionConfig {
    /// `max_service_lines` limited to the row counts templates exist for.
    pub fn service_line_limit(&self) -> usize {
        self.max_service_lines.clamp(1, MAX_TEMPLATE_ROWS)
    }
}

/// Exchange rate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyConfig {
    /// Base URL of the rate service.
    pub base_url: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Days searched on either side of the invoice date.
    pub nearby_days: u32,

    /// BGN per unit, used when the service fails.
    pub fallback_rates: BTreeMap<String, Decimal>,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        let fallback_rates = [
            ("USD", Decimal::new(180, 2)),
            ("GBP", Decimal::new(230, 2)),
            ("CHF", Decimal::new(200, 2)),
            ("RON", Decimal::new(39, 2)),
            ("PLN", Decimal::new(45, 2)),
            ("HUF", Decimal::new(5, 3)),
            ("TRY", Decimal::new(6, 2)),
            ("ILS", Decimal::new(49, 2)),
        ]
        .into_iter()
        .map(|(code, rate)| (code.to_string(), rate))
        .collect();

        Self {
            base_url: "https://api.exchangerate.host".to_string(),
            timeout_secs: 5,
            nearby_days: 3,
            fallback_rates,
        }
    }
}

/// Translation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalizationConfig {
    /// LibreTranslate-compatible endpoint. Transliteration only when unset.
    pub translator_url: Option<String>,

    /// API key sent with translation requests.
    pub translator_api_key: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Target language code.
    pub target_language: String,
}

impl Default for LocalizationConfig {
    fn default() -> Self {
        Self {
            translator_url: None,
            translator_api_key: None,
            timeout_secs: 10,
            target_language: "bg".to_string(),
        }
    }
}

/// Output document configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Directory holding `invoice_template_<n>_rows` templates.
    pub template_dir: PathBuf,

    /// Directory generated invoices are written to.
    pub output_dir: PathBuf,

    /// Zero-padded width of the invoice number.
    pub invoice_number_width: usize,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            template_dir: PathBuf::from("templates"),
            output_dir: PathBuf::from("output"),
            invoice_number_width: 10,
        }
    }
}

/// Supplier table location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupplierConfig {
    /// CSV file with supplier profiles and invoice counters.
    pub path: PathBuf,
}

impl Default for SupplierConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("suppliers.csv"),
        }
    }
}

impl BginvConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BginvConfig::default();
        assert_eq!(config.extraction.max_service_lines, 5);
        assert_eq!(config.extraction.line_overflow, LineOverflow::Truncate);
        assert_eq!(config.extraction.missing_recipient, MissingRecipient::Reject);
        assert_eq!(config.currency.timeout_secs, 5);
        assert_eq!(config.currency.nearby_days, 3);
        assert!(config.currency.fallback_rates.contains_key("USD"));
        assert!(!config.currency.fallback_rates.contains_key("EUR"));
    }

    #[test]
    fn test_service_line_limit_follows_templates() {
        let mut extraction = ExtractionConfig::default();
        assert_eq!(extraction.service_line_limit(), 5);

        extraction.max_service_lines = 9;
        assert_eq!(extraction.service_line_limit(), 5);

        extraction.max_service_lines = 0;
        assert_eq!(extraction.service_line_limit(), 1);

        extraction.max_service_lines = 3;
        assert_eq!(extraction.service_line_limit(), 3);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{"extraction": {"line_overflow": "reject"}}"#;
        let config: BginvConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.extraction.line_overflow, LineOverflow::Reject);
        assert_eq!(config.extraction.scan_window, 7);
        assert_eq!(config.pdf.min_text_length, 50);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = BginvConfig::default();
        config.localization.translator_url = Some("http://localhost:5000".to_string());
        config.save(&path).unwrap();

        let loaded = BginvConfig::from_file(&path).unwrap();
        assert_eq!(
            loaded.localization.translator_url.as_deref(),
            Some("http://localhost:5000")
        );
    }
}
