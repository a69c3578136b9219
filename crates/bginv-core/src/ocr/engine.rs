//! OCR engine backed by `pure-onnx-ocr`.

use image::{DynamicImage, GenericImageView};
use std::time::Instant;
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

use super::{OcrBackend, OcrResult, TextBox};

/// Pure Rust detection + recognition pipeline (no external ONNX Runtime).
pub struct PureOcrEngine {
    engine: pure_onnx_ocr::engine::OcrEngine,
}

impl PureOcrEngine {
    /// Load the models named in `config`.
    pub fn from_config(config: &OcrConfig) -> Result<Self, OcrError> {
        let det_path = config.model_path(&config.detection_model);
        let rec_path = config.model_path(&config.recognition_model);
        let dict_path = config.model_path(&config.dictionary);

        for path in [&det_path, &rec_path, &dict_path] {
            if !path.exists() {
                return Err(OcrError::ModelLoad(format!(
                    "model file not found: {}",
                    path.display()
                )));
            }
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded OCR models from {}", config.model_dir.display());
        Ok(Self { engine })
    }
}

impl OcrBackend for PureOcrEngine {
    fn recognize(&self, image: &DynamicImage) -> Result<OcrResult, OcrError> {
        let start = Instant::now();
        let (width, height) = image.dimensions();

        let results = self
            .engine
            .run_from_image(image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        let boxes = results
            .iter()
            .map(|r| {
                TextBox::new(
                    r.text.replace("[UNK]", " "),
                    polygon_bounds(&r.bounding_box),
                    r.confidence,
                )
            })
            .collect();

        let result = OcrResult::from_boxes(boxes, (width, height));

        debug!(
            "OCR found {} text regions in {}x{} image in {}ms",
            result.boxes.len(),
            width,
            height,
            start.elapsed().as_millis()
        );

        Ok(result)
    }
}

fn polygon_bounds(polygon: &pure_onnx_ocr::Polygon<f64>) -> (f32, f32, f32, f32) {
    let mut bounds = (f32::INFINITY, f32::INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY);
    for coord in polygon.exterior().coords() {
        let (x, y) = (coord.x as f32, coord.y as f32);
        bounds.0 = bounds.0.min(x);
        bounds.1 = bounds.1.min(y);
        bounds.2 = bounds.2.max(x);
        bounds.3 = bounds.3.max(y);
    }
    if bounds.0.is_infinite() {
        return (0.0, 0.0, 0.0, 0.0);
    }
    bounds
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_missing_models() {
        let config = OcrConfig {
            model_dir: PathBuf::from("/nonexistent/bginv-models"),
            ..Default::default()
        };
        let err = PureOcrEngine::from_config(&config).err().unwrap();
        assert!(matches!(err, OcrError::ModelLoad(_)));
    }
}
