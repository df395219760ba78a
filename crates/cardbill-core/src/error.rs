//! Error types for the cardbill-core library.

use thiserror::Error;

/// Main error type for the cardbill library.
#[derive(Error, Debug)]
pub enum CardbillError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Transaction extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Export (CSV/XLSX/JSON) error.
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl CardbillError {
    /// Whether this error only means "nothing usable was found".
    ///
    /// Callers surface this as an informational message rather than a failure.
    pub fn is_no_data(&self) -> bool {
        matches!(self, CardbillError::Extraction(ExtractionError::NoData))
    }
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to extract images from PDF.
    #[error("failed to extract images: {0}")]
    ImageExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// No OCR engine is configured for an image-only document.
    #[error("no OCR engine available")]
    Unavailable,
}

/// Errors related to transaction extraction.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// No transaction data could be extracted.
    #[error("no transaction data found")]
    NoData,

    /// The document produced no text at all.
    #[error("no text could be extracted from the document")]
    EmptyDocument,
}

/// Errors raised while serializing a transaction table.
#[derive(Error, Debug)]
pub enum ExportError {
    /// CSV writer failure.
    #[error("CSV: {0}")]
    Csv(#[from] csv::Error),

    /// XLSX workbook failure.
    #[error("XLSX: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// JSON serialization failure.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Writer flush or buffer failure.
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the cardbill library.
pub type Result<T> = std::result::Result<T, CardbillError>;
