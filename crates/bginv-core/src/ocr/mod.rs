//! OCR of scanned pages.

#[cfg(feature = "ocr")]
mod engine;

#[cfg(feature = "ocr")]
pub use engine::PureOcrEngine;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// Something that turns a page image into text.
pub trait OcrBackend: Send + Sync {
    fn recognize(&self, image: &DynamicImage) -> Result<OcrResult, OcrError>;
}

/// A recognized text region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBox {
    /// Axis-aligned bounds (min_x, min_y, max_x, max_y).
    pub rect: (f32, f32, f32, f32),
    pub text: String,
    pub confidence: f32,
}

impl TextBox {
    pub fn new(text: impl Into<String>, rect: (f32, f32, f32, f32), confidence: f32) -> Self {
        Self {
            rect,
            text: text.into(),
            confidence,
        }
    }
}

/// Result of OCR on one image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrResult {
    pub boxes: Vec<TextBox>,

    /// Box texts in reading order, one line per row.
    pub text: String,

    /// Image dimensions (width, height).
    pub image_size: (u32, u32),
}

impl OcrResult {
    /// Build a result from unordered boxes.
    pub fn from_boxes(boxes: Vec<TextBox>, image_size: (u32, u32)) -> Self {
        let mut result = Self {
            boxes,
            text: String::new(),
            image_size,
        };
        result.sort_by_reading_order();
        result
    }

    /// Sort boxes top-to-bottom, left-to-right, and rebuild the text so that
    /// boxes on the same row share a line.
    pub fn sort_by_reading_order(&mut self) {
        self.boxes.sort_by(|a, b| {
            let row_a = row_of(a);
            let row_b = row_of(b);

            if row_a != row_b {
                row_a.cmp(&row_b)
            } else {
                a.rect
                    .0
                    .partial_cmp(&b.rect.0)
                    .unwrap_or(std::cmp::Ordering::Equal)
            }
        });

        let mut lines: Vec<String> = Vec::new();
        let mut current_row = None;
        for text_box in &self.boxes {
            let row = row_of(text_box);
            match lines.last_mut() {
                Some(line) if current_row == Some(row) => {
                    line.push(' ');
                    line.push_str(&text_box.text);
                }
                _ => lines.push(text_box.text.clone()),
            }
            current_row = Some(row);
        }

        self.text = lines.join("\n");
    }

    /// Mean box confidence, 0 when nothing was recognized.
    pub fn mean_confidence(&self) -> f32 {
        if self.boxes.is_empty() {
            return 0.0;
        }
        self.boxes.iter().map(|b| b.confidence).sum::<f32>() / self.boxes.len() as f32
    }
}

// Boxes whose tops are within 20 pixels belong to the same row.
fn row_of(text_box: &TextBox) -> i32 {
    (text_box.rect.1 / 20.0) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reading_order() {
        let result = OcrResult::from_boxes(
            vec![
                TextBox::new("1,000.00", (400.0, 102.0, 480.0, 118.0), 0.9),
                TextBox::new("Total", (10.0, 100.0, 60.0, 118.0), 0.8),
                TextBox::new("INVOICE", (10.0, 5.0, 90.0, 18.0), 1.0),
            ],
            (500, 200),
        );

        assert_eq!(result.text, "INVOICE\nTotal 1,000.00");
        assert!((result.mean_confidence() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_empty_result() {
        let result = OcrResult::from_boxes(Vec::new(), (10, 10));
        assert_eq!(result.text, "");
        assert_eq!(result.mean_confidence(), 0.0);
    }
}
