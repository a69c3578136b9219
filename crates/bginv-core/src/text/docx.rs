//! DOCX text extraction using docx-rs.

use docx_rs::{DocumentChild, ParagraphChild, RunChild, TableCellContent, TableChild, TableRowChild};
use tracing::debug;

use crate::error::BginvError;

/// Paragraph texts in document order, one line per paragraph. Each table row
/// becomes one line with its cells joined by ` | `.
pub fn extract_docx_text(data: &[u8]) -> Result<String, BginvError> {
    let docx = docx_rs::read_docx(data).map_err(|e| BginvError::Docx(e.to_string()))?;

    let mut lines = Vec::new();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(paragraph) => {
                lines.push(paragraph_text(&paragraph.children));
            }
            DocumentChild::Table(table) => {
                for row in &table.rows {
                    let TableChild::TableRow(row) = row;
                    let cells: Vec<String> = row
                        .cells
                        .iter()
                        .map(|cell| {
                            let TableRowChild::TableCell(cell) = cell;
                            cell.children
                                .iter()
                                .filter_map(|content| match content {
                                    TableCellContent::Paragraph(p) => Some(paragraph_text(&p.children)),
                                    _ => None,
                                })
                                .collect::<Vec<_>>()
                                .join(" ")
                        })
                        .collect();
                    lines.push(cells.join(" | "));
                }
            }
            _ => {}
        }
    }

    debug!("Extracted {} lines from DOCX", lines.len());
    Ok(lines.join("\n"))
}

fn paragraph_text(children: &[ParagraphChild]) -> String {
    let mut text = String::new();
    for child in children {
        match child {
            ParagraphChild::Run(run) => push_run_text(&run.children, &mut text),
            ParagraphChild::Hyperlink(link) => {
                for inner in &link.children {
                    if let ParagraphChild::Run(run) = inner {
                        push_run_text(&run.children, &mut text);
                    }
                }
            }
            _ => {}
        }
    }
    text
}

fn push_run_text(children: &[RunChild], output: &mut String) {
    for child in children {
        match child {
            RunChild::Text(t) => output.push_str(&t.text),
            RunChild::Tab(_) => output.push(' '),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_rs::{Docx, Paragraph, Run, Table, TableCell, TableRow};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn cell(text: &str) -> TableCell {
        TableCell::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text(text)))
    }

    #[test]
    fn test_paragraphs_and_tables() {
        let mut buffer = Cursor::new(Vec::new());
        Docx::new()
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Invoice date: 18.08.2021")))
            .add_paragraph(
                Paragraph::new()
                    .add_run(Run::new().add_text("Customer: "))
                    .add_run(Run::new().add_text("QUESTE LTD")),
            )
            .add_table(Table::new(vec![
                TableRow::new(vec![cell("Description"), cell("Amount")]),
                TableRow::new(vec![cell("Consulting"), cell("700.00 EUR")]),
            ]))
            .build()
            .pack(&mut buffer)
            .unwrap();

        let text = extract_docx_text(buffer.get_ref()).unwrap();
        let lines: Vec<&str> = text.lines().filter(|l| !l.is_empty()).collect();

        assert_eq!(
            lines,
            vec![
                "Invoice date: 18.08.2021",
                "Customer: QUESTE LTD",
                "Description | Amount",
                "Consulting | 700.00 EUR",
            ]
        );
    }

    #[test]
    fn test_invalid_docx() {
        assert!(matches!(extract_docx_text(b"plain text"), Err(BginvError::Docx(_))));
    }
}
