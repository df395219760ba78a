//! Core library for credit-card bill transaction extraction.
//!
//! This crate provides:
//! - PDF processing (text layer and page image extraction)
//! - OCR for scanned bills using PaddleOCR models
//! - Transaction line parsing and table normalization
//! - CSV, XLSX and JSON export of the resulting table

pub mod error;
pub mod export;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod statement;

pub use error::{CardbillError, Result};
pub use export::{format_amount, ExportFormat, TableExporter};
pub use models::{AppConfig, RawTransaction, TableSummary, TransactionRecord, TransactionTable};
pub use ocr::{OcrResult, TextBox, TextRecognizer};
#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;
pub use pdf::{PdfDocument, PdfSource, PdfType};
pub use statement::{
    parse_transaction_line, parse_transaction_lines, process_credit_card_bill,
    StatementExtraction, StatementProcessor, TableNormalizer, TextSource,
};
