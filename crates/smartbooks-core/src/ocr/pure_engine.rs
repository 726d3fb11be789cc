//! Pure Rust OCR engine wrapper using `pure-onnx-ocr`.

use std::path::Path;
use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

use super::{OcrEngine, OcrResult};

/// Rows closer than this many pixels are read left to right.
const ROW_HEIGHT: f64 = 20.0;

/// OCR engine backed by `pure-onnx-ocr` (no external binaries).
pub struct PureOcrEngine {
    engine: pure_onnx_ocr::engine::OcrEngine,
    keep_unk: bool,
}

/// A recognized line with the top-left corner of its box.
struct Line {
    x: f64,
    y: f64,
    text: String,
}

impl PureOcrEngine {
    /// Create an engine from `det.onnx`, `latin_rec.onnx` and `latin_dict.txt` in a directory.
    pub fn from_dir(model_dir: &Path, config: OcrConfig) -> Result<Self, OcrError> {
        let det_path = model_dir.join("det.onnx");
        let rec_path = model_dir.join("latin_rec.onnx");
        let dict_path = model_dir.join("latin_dict.txt");

        for path in [&det_path, &rec_path, &dict_path] {
            if !path.exists() {
                return Err(OcrError::ModelLoad(format!("missing model file {}", path.display())));
            }
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded pure-onnx-ocr engine from {}", model_dir.display());

        Ok(Self {
            engine,
            keep_unk: config.keep_unk,
        })
    }
}

impl OcrEngine for PureOcrEngine {
    fn name(&self) -> &str {
        "onnx"
    }

    fn recognize(&self, image: &DynamicImage) -> Result<OcrResult, OcrError> {
        let start = Instant::now();
        let (width, height) = image.dimensions();

        let results = self
            .engine
            .run_from_image(image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        debug!("pure-onnx-ocr returned {} text regions", results.len());

        let mut lines: Vec<Line> = results
            .iter()
            .map(|r| {
                let (x, y) = top_left(&r.bounding_box);
                let text = if self.keep_unk {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                };
                Line { x, y, text }
            })
            .collect();

        sort_reading_order(&mut lines);

        let text = lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let processing_time_ms = start.elapsed().as_millis() as u64;
        info!("OCR complete: {} text boxes in {}ms", lines.len(), processing_time_ms);

        Ok(OcrResult {
            text,
            image_size: (width, height),
            processing_time_ms,
        })
    }
}

fn top_left(polygon: &pure_onnx_ocr::Polygon<f64>) -> (f64, f64) {
    polygon
        .exterior()
        .coords()
        .fold((f64::INFINITY, f64::INFINITY), |(x, y), c| (x.min(c.x), y.min(c.y)))
}

/// Top-to-bottom by row band, then left-to-right.
fn sort_reading_order(lines: &mut [Line]) {
    lines.sort_by(|a, b| {
        let row_a = (a.y / ROW_HEIGHT) as i64;
        let row_b = (b.y / ROW_HEIGHT) as i64;
        row_a
            .cmp(&row_b)
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });
}
