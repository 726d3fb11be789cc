//! Configuration structures for the digitization service.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, SmartbooksError};

/// Main configuration for smartbooks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Web server configuration.
    pub server: ServerConfig,

    /// Database configuration.
    pub database: DatabaseConfig,

    /// OCR configuration.
    pub ocr: OcrConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Invoice extraction configuration.
    pub extraction: ExtractionConfig,
}

/// Web server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,

    /// Bind port.
    pub port: u16,

    /// Largest accepted request body.
    pub max_upload_bytes: usize,

    /// Rows shown on the dashboard.
    pub dashboard_limit: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            max_upload_bytes: 20 * 1024 * 1024,
            dashboard_limit: 20,
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite connection URL.
    pub url: String,

    /// Pool size.
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://smartbooks.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Which OCR implementation to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrBackend {
    /// The `tesseract` command-line tool.
    #[default]
    Tesseract,
    /// Pure Rust ONNX models (requires the `onnx` feature).
    Onnx,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Engine to use.
    pub backend: OcrBackend,

    /// Tesseract language pack (e.g. "eng", "eng+deu").
    pub tesseract_lang: String,

    /// Tesseract page segmentation mode, tesseract's default when unset.
    pub tesseract_psm: Option<u8>,

    /// Directory with det.onnx, latin_rec.onnx and latin_dict.txt for the onnx backend.
    pub model_dir: PathBuf,

    /// Keep `[UNK]` placeholders from the onnx recognizer.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            backend: OcrBackend::Tesseract,
            tesseract_lang: "eng".to_string(),
            tesseract_psm: None,
            model_dir: PathBuf::from("models"),
            keep_unk: false,
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// DPI for rendering PDF pages to images.
    pub render_dpi: u32,

    /// Maximum pages to accept (0 = unlimited).
    pub max_pages: u32,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            render_dpi: 300,
            max_pages: 20,
        }
    }
}

/// Invoice extraction configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Read numeric dates as day/month/year instead of month/day/year.
    pub day_first: bool,
}

impl AppConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| SmartbooksError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| SmartbooksError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load from `path` if given, otherwise from `fallback` if it exists,
    /// otherwise defaults. Environment overrides are applied last.
    pub fn load(path: Option<&Path>, fallback: Option<&Path>) -> Result<Self> {
        let mut config = match (path, fallback) {
            (Some(path), _) => Self::from_file(path)?,
            (None, Some(fallback)) if fallback.exists() => Self::from_file(fallback)?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from environment-style lookups.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(host) = lookup("SMARTBOOKS_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SMARTBOOKS_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| SmartbooksError::Config(format!("invalid SMARTBOOKS_PORT: {}", port)))?;
        }
        if let Some(lang) = lookup("SMARTBOOKS_TESSERACT_LANG") {
            self.ocr.tesseract_lang = lang;
        }
        Ok(())
    }
}
