//! Document renderers.

use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

use super::{InvoiceDocument, Template};
use crate::error::RenderError;

/// A written output document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub path: PathBuf,
}

/// Turns an invoice context and template into an output file.
pub trait DocumentRenderer: Send + Sync {
    fn render(
        &self,
        document: &InvoiceDocument,
        template: &Template,
        output_dir: &Path,
    ) -> Result<RenderedDocument, RenderError>;
}

/// Writes the template name and flattened fields as JSON, for a template
/// engine to consume.
#[derive(Debug, Default, Clone)]
pub struct JsonRenderer;

#[derive(Serialize)]
struct JsonOutput<'a> {
    template: String,
    rows: usize,
    fields: &'a BTreeMap<String, String>,
}

impl JsonRenderer {
    /// Counters are per supplier, so the supplier ID is part of the name.
    pub fn output_path(output_dir: &Path, supplier_id: &str, invoice_number: &str) -> PathBuf {
        output_dir.join(format!(
            "bulgarian_invoice_{}_{}.json",
            file_name_part(supplier_id),
            invoice_number
        ))
    }
}

/// Keep ASCII letters, digits, `-` and `_`; anything else becomes `_`.
fn file_name_part(raw: &str) -> String {
    let part: String = raw
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    if part.is_empty() { "_".to_string() } else { part }
}

impl DocumentRenderer for JsonRenderer {
    fn render(
        &self,
        document: &InvoiceDocument,
        template: &Template,
        output_dir: &Path,
    ) -> Result<RenderedDocument, RenderError> {
        std::fs::create_dir_all(output_dir)?;

        let fields = document.to_template_fields();
        let output = JsonOutput {
            template: template.name(),
            rows: template.rows,
            fields: &fields,
        };

        let path = Self::output_path(output_dir, &document.supplier.id, &document.invoice_number);
        let mut temp = NamedTempFile::new_in(output_dir)?;
        serde_json::to_writer_pretty(&mut temp, &output)?;
        temp.write_all(b"\n")?;
        temp.persist(&path).map_err(|e| RenderError::Io(e.error))?;

        info!("Wrote invoice {} to {}", document.invoice_number, path.display());
        Ok(RenderedDocument { path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::tests::sample_document;
    use crate::document::TemplateSet;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_json_render() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().join("out");
        let document = sample_document(3);
        let template = TemplateSet::new("templates").select(3).unwrap();

        let rendered = JsonRenderer.render(&document, &template, &output_dir).unwrap();

        assert_eq!(rendered.path, output_dir.join("bulgarian_invoice_1001_0000000042.json"));
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&rendered.path).unwrap()).unwrap();
        assert_eq!(json["template"], "invoice_template_3_rows.docx");
        assert_eq!(json["rows"], 3);
        assert_eq!(json["fields"]["ServiceDescription3"], "Услуга 3");
        assert_eq!(json["fields"]["TransactionBasis"], "По сметка");
    }

    #[test]
    fn test_output_path_per_supplier() {
        let dir = Path::new("out");
        assert_ne!(
            JsonRenderer::output_path(dir, "1001", "0000000042"),
            JsonRenderer::output_path(dir, "2002", "0000000042")
        );
        assert_eq!(
            JsonRenderer::output_path(dir, "../a b", "0000000001"),
            dir.join("bulgarian_invoice____a_b_0000000001.json")
        );
    }
}
