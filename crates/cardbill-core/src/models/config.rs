//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::CardbillError;
use crate::export::ExportFormat;

/// Main configuration for the cardbill pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// OCR configuration.
    pub ocr: OcrConfig,

    /// Transaction extraction configuration.
    pub extraction: ExtractionConfig,

    /// Output configuration.
    pub export: ExportConfig,
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Use the embedded text layer when the PDF has one.
    pub prefer_embedded_text: bool,

    /// Minimum text-layer length to consider a PDF text-based.
    pub min_text_length: usize,

    /// Maximum pages to OCR (0 = unlimited).
    pub max_pages: usize,

    /// Size above which a warning is printed. Not enforced.
    pub max_file_size_mb: u64,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            prefer_embedded_text: true,
            min_text_length: 50,
            max_pages: 0,
            max_file_size_mb: 200,
        }
    }
}

/// OCR model locations and recognition options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,

    /// Keep `[UNK]` tokens in recognized text instead of blanking them.
    pub keep_unk: bool,

    /// Vertical distance (pixels) under which two text boxes share a line.
    pub line_tolerance: f32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
            keep_unk: false,
            line_tolerance: 15.0,
        }
    }
}

impl OcrConfig {
    /// Whether the detection and recognition models exist under `dir`.
    pub fn models_present(&self, dir: &Path) -> bool {
        dir.join(&self.detection_model).exists() && dir.join(&self.recognition_model).exists()
    }
}

/// Transaction extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Symbol prefixed to displayed totals.
    pub currency_symbol: String,

    /// Number of rows shown in previews.
    pub preview_rows: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            currency_symbol: "₹".to_string(),
            preview_rows: 5,
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Format used when none is given on the command line.
    pub default_format: ExportFormat,

    /// Worksheet name for XLSX output.
    pub sheet_name: String,

    /// Field delimiter for CSV output.
    pub csv_delimiter: char,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_format: ExportFormat::Csv,
            sheet_name: "Transactions".to_string(),
            csv_delimiter: ',',
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, CardbillError> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| CardbillError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), CardbillError> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| CardbillError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Full path to an OCR model file.
    pub fn model_path(&self, model_name: &str) -> PathBuf {
        self.ocr.model_dir.join(model_name)
    }
}
