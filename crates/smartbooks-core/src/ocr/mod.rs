//! OCR backends.
//!
//! Tesseract is the default backend and is driven as an external process.
//! A pure-Rust ONNX backend is available with the `onnx` cargo feature.

mod tesseract;
pub(crate) mod tools;

#[cfg(feature = "onnx")]
mod pure_engine;

pub use tesseract::TesseractEngine;
pub use tools::{check_binary, check_tools};

#[cfg(feature = "onnx")]
pub use pure_engine::PureOcrEngine;

use std::sync::Arc;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::{OcrError, Result, SmartbooksError};
use crate::models::config::{OcrBackend, OcrConfig};

/// Result of OCR processing on an image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrResult {
    /// Recognized text in reading order.
    pub text: String,

    /// Image dimensions (width, height).
    pub image_size: (u32, u32),

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

impl OcrResult {
    /// Create an empty result.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            text: String::new(),
            image_size: (width, height),
            processing_time_ms: 0,
        }
    }
}

/// A text recognizer for a single page image.
pub trait OcrEngine: Send + Sync {
    /// Backend name used in logs and the `check` command.
    fn name(&self) -> &str;

    /// Recognize the text on one page.
    fn recognize(&self, image: &DynamicImage) -> std::result::Result<OcrResult, OcrError>;
}

/// Build the engine selected in the configuration.
pub fn create_engine(config: &OcrConfig) -> Result<Arc<dyn OcrEngine>> {
    match config.backend {
        OcrBackend::Tesseract => Ok(Arc::new(TesseractEngine::from_config(config))),
        #[cfg(feature = "onnx")]
        OcrBackend::Onnx => {
            let engine = PureOcrEngine::from_dir(&config.model_dir, config.clone())?;
            Ok(Arc::new(engine))
        }
        #[cfg(not(feature = "onnx"))]
        OcrBackend::Onnx => Err(SmartbooksError::Config(
            "the onnx OCR backend requires building with the `onnx` feature".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_backend_is_tesseract() {
        let engine = create_engine(&OcrConfig::default()).unwrap();
        assert_eq!(engine.name(), "tesseract");
    }

    #[cfg(not(feature = "onnx"))]
    #[test]
    fn test_onnx_requires_feature() {
        let config = OcrConfig {
            backend: OcrBackend::Onnx,
            ..OcrConfig::default()
        };
        assert!(matches!(create_engine(&config), Err(SmartbooksError::Config(_))));
    }

    #[test]
    fn test_empty_result() {
        let result = OcrResult::empty(640, 480);
        assert!(result.text.is_empty());
        assert_eq!(result.image_size, (640, 480));
    }
}
