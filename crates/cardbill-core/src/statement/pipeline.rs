//! Document-level extraction: choose a text source, parse lines, normalize.

use std::time::Instant;

use image::DynamicImage;
use tracing::{debug, info, warn};

use super::line::parse_transaction_lines;
use super::normalize::TableNormalizer;
use crate::error::{ExtractionError, OcrError, PdfError, Result};
use crate::models::config::{AppConfig, PdfConfig};
use crate::models::transaction::TransactionTable;
use crate::ocr::TextRecognizer;
use crate::pdf::{PdfDocument, PdfSource, PdfType};

/// Where the bill text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSource {
    /// Embedded PDF text layer.
    TextLayer,
    /// OCR over page images.
    Ocr,
    /// Text supplied directly by the caller.
    PlainText,
}

/// Outcome of extracting one document.
#[derive(Debug, Clone)]
pub struct StatementExtraction {
    /// Validated transactions, never empty.
    pub table: TransactionTable,
    /// Text source the table was built from.
    pub source: TextSource,
    /// Lines of text examined.
    pub lines_scanned: usize,
    /// Lines that yielded a raw transaction.
    pub rows_matched: usize,
    /// Matched rows dropped during normalization.
    pub rows_dropped: usize,
    /// Non-fatal warnings for display.
    pub warnings: Vec<String>,
    /// Time spent parsing and normalizing.
    pub processing_time_ms: u64,
}

/// Turns bill documents into transaction tables.
pub struct StatementProcessor {
    pdf: PdfConfig,
    line_tolerance: f32,
    normalizer: TableNormalizer,
    recognizer: Option<Box<dyn TextRecognizer>>,
}

impl StatementProcessor {
    /// Create a processor with default settings and no OCR engine.
    pub fn new() -> Self {
        Self::from_config(&AppConfig::default())
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            pdf: config.pdf.clone(),
            line_tolerance: config.ocr.line_tolerance,
            normalizer: TableNormalizer::new(),
            recognizer: None,
        }
    }

    /// Attach an OCR engine for image-based documents.
    pub fn with_recognizer(mut self, recognizer: Box<dyn TextRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    /// Set PDF handling options.
    pub fn with_pdf_config(mut self, pdf: PdfConfig) -> Self {
        self.pdf = pdf;
        self
    }

    /// Whether an OCR engine is attached.
    pub fn has_ocr(&self) -> bool {
        self.recognizer.is_some()
    }

    /// Extract transactions from already-extracted text.
    pub fn process_text(&self, text: &str, source: TextSource) -> Result<StatementExtraction> {
        let start = Instant::now();

        let lines_scanned = text.lines().count();
        let rows = parse_transaction_lines(text);
        info!(
            "Matched {} transaction lines out of {} ({:?})",
            rows.len(),
            lines_scanned,
            source
        );

        let report = self
            .normalizer
            .normalize(Some(rows.as_slice()))
            .ok_or(ExtractionError::NoData)?;
        if report.table.is_empty() {
            return Err(ExtractionError::NoData.into());
        }

        Ok(StatementExtraction {
            rows_matched: rows.len(),
            rows_dropped: report.dropped_rows + report.blank_rows,
            warnings: report.warnings.iter().map(|w| w.to_string()).collect(),
            table: report.table,
            source,
            lines_scanned,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Extract transactions from PDF bytes.
    pub fn process_pdf(&self, data: &[u8]) -> Result<StatementExtraction> {
        let document = PdfDocument::load(data)?;
        self.process_document(&document)
    }

    /// Extract transactions from a loaded PDF.
    ///
    /// Text PDFs use their text layer. Scanned PDFs go through OCR; without an
    /// OCR engine the text layer is used if there is one.
    pub fn process_document<P: PdfSource>(&self, document: &P) -> Result<StatementExtraction> {
        let text_layer = document.extract_text().unwrap_or_else(|e| {
            warn!("Text layer extraction failed: {}", e);
            String::new()
        });
        let has_text = !text_layer.trim().is_empty();
        let pdf_type = PdfType::classify(
            text_layer.trim().len(),
            document.has_images(),
            self.pdf.min_text_length,
        );
        debug!("PDF type: {:?}", pdf_type);

        match pdf_type {
            PdfType::Text => self.process_text(&text_layer, TextSource::TextLayer),
            PdfType::Hybrid if self.pdf.prefer_embedded_text || !self.has_ocr() => {
                match self.process_text(&text_layer, TextSource::TextLayer) {
                    Err(e) if e.is_no_data() && self.has_ocr() => {
                        warn!("No transactions in text layer, falling back to OCR");
                        self.process_scanned(document)
                    }
                    other => other,
                }
            }
            PdfType::Hybrid | PdfType::Image if self.has_ocr() => self.process_scanned(document),
            PdfType::Image | PdfType::Empty if has_text => {
                warn!("No OCR engine available, using the sparse text layer");
                self.process_text(&text_layer, TextSource::TextLayer)
            }
            PdfType::Image => Err(OcrError::Unavailable.into()),
            _ => Err(ExtractionError::EmptyDocument.into()),
        }
    }

    /// Extract transactions from a single scanned image.
    pub fn process_image(&self, image: &DynamicImage) -> Result<StatementExtraction> {
        let text = self.recognize(image)?;
        self.process_text(&text, TextSource::Ocr)
    }

    fn process_scanned<P: PdfSource>(&self, document: &P) -> Result<StatementExtraction> {
        let text = self.ocr_document(document)?;
        if text.trim().is_empty() {
            return Err(ExtractionError::EmptyDocument.into());
        }
        self.process_text(&text, TextSource::Ocr)
    }

    /// Run OCR over the images of every page, in page order.
    fn ocr_document<P: PdfSource>(&self, document: &P) -> Result<String> {
        let mut pages = document.page_count();
        if self.pdf.max_pages > 0 {
            pages = pages.min(self.pdf.max_pages as u32);
        }

        let mut texts = Vec::new();
        let mut images_seen = 0usize;
        let mut first_error = None;

        for page in 1..=pages {
            let images = match document.extract_images(page) {
                Ok(images) => images,
                Err(e) => {
                    warn!("Failed to extract images from page {}: {}", page, e);
                    continue;
                }
            };
            images_seen += images.len();

            for (i, image) in images.iter().enumerate() {
                match self.recognize(image) {
                    Ok(text) if !text.trim().is_empty() => texts.push(text),
                    Ok(_) => debug!("No text on page {} image {}", page, i + 1),
                    Err(e) => {
                        warn!("OCR failed on page {} image {}: {}", page, i + 1, e);
                        first_error.get_or_insert(e);
                    }
                }
            }
        }

        if images_seen == 0 {
            return Err(PdfError::ImageExtraction("no page images found".to_string()).into());
        }
        if texts.is_empty() {
            if let Some(e) = first_error {
                return Err(e);
            }
        }

        debug!("OCR produced text for {} of {} images", texts.len(), images_seen);
        Ok(texts.join("\n"))
    }

    fn recognize(&self, image: &DynamicImage) -> Result<String> {
        let recognizer = self.recognizer.as_ref().ok_or(OcrError::Unavailable)?;
        let result = recognizer.recognize(image)?;
        Ok(result.text(self.line_tolerance))
    }
}

impl Default for StatementProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CardbillError;
    use crate::ocr::{OcrResult, TextBox};
    use image::RgbImage;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    const BILL_TEXT: &str = "\
CREDIT CARD STATEMENT
Statement period: March 2023
Date      Description            Amount
15/03/23 Grocery Store Rs. 1,250.50
17/03/23 Fuel Station Rs. 2,000.00
45/13/23 Broken Row Rs. 10.00
Total Amount Due Rs. 3,250.50
";

    struct FakePdf {
        text: String,
        images_per_page: Vec<usize>,
    }

    impl PdfSource for FakePdf {
        fn page_count(&self) -> u32 {
            self.images_per_page.len() as u32
        }

        fn extract_text(&self) -> crate::pdf::Result<String> {
            Ok(self.text.clone())
        }

        fn extract_images(&self, page: u32) -> crate::pdf::Result<Vec<DynamicImage>> {
            let count = self
                .images_per_page
                .get(page as usize - 1)
                .copied()
                .ok_or(PdfError::InvalidPage(page))?;
            Ok((0..count)
                .map(|_| DynamicImage::ImageRgb8(RgbImage::new(4, 4)))
                .collect())
        }
    }

    /// Returns the same two rows for every image.
    struct FakeOcr;

    impl TextRecognizer for FakeOcr {
        fn recognize(&self, _image: &DynamicImage) -> std::result::Result<OcrResult, OcrError> {
            Ok(OcrResult::new(
                vec![
                    TextBox::from_rect(300.0, 10.0, 80.0, 20.0, "Rs. 499.00"),
                    TextBox::from_rect(0.0, 10.0, 70.0, 20.0, "02/01/2024"),
                    TextBox::from_rect(90.0, 11.0, 150.0, 20.0, "AMAZON PAY"),
                ],
                (400, 40),
            ))
        }
    }

    struct BrokenOcr;

    impl TextRecognizer for BrokenOcr {
        fn recognize(&self, _image: &DynamicImage) -> std::result::Result<OcrResult, OcrError> {
            Err(OcrError::Recognition("model crashed".to_string()))
        }
    }

    #[test]
    fn test_process_text() {
        let extraction = StatementProcessor::new()
            .process_text(BILL_TEXT, TextSource::PlainText)
            .unwrap();

        assert_eq!(extraction.table.len(), 2);
        assert_eq!(extraction.rows_matched, 3);
        assert_eq!(extraction.rows_dropped, 1);
        assert_eq!(
            extraction.table.total_amount(),
            Some(Decimal::from_str("3250.50").unwrap())
        );
    }

    #[test]
    fn test_huge_amounts_do_not_break_summary() {
        let text = "01/01/23 A 50000000000000000000000000000
                    02/01/23 B 50000000000000000000000000000";
        let extraction = StatementProcessor::new()
            .process_text(text, TextSource::PlainText)
            .unwrap();

        assert_eq!(extraction.table.len(), 2);
        assert_eq!(extraction.table.summary().total_amount, None);
    }

    #[test]
    fn test_process_text_without_transactions() {
        let err = StatementProcessor::new()
            .process_text("Nothing to see here\nPage 1", TextSource::PlainText)
            .unwrap_err();
        assert!(err.is_no_data());
    }

    #[test]
    fn test_process_text_all_rows_invalid() {
        let err = StatementProcessor::new()
            .process_text("45/13/23 Ghost 10.00", TextSource::PlainText)
            .unwrap_err();
        assert!(err.is_no_data());
    }

    #[test]
    fn test_text_pdf_uses_text_layer() {
        let pdf = FakePdf {
            text: BILL_TEXT.to_string(),
            images_per_page: vec![0],
        };

        let extraction = StatementProcessor::new()
            .with_recognizer(Box::new(FakeOcr))
            .process_document(&pdf)
            .unwrap();
        assert_eq!(extraction.source, TextSource::TextLayer);
        assert_eq!(extraction.table.len(), 2);
    }

    #[test]
    fn test_scanned_pdf_uses_ocr() {
        let pdf = FakePdf {
            text: String::new(),
            images_per_page: vec![1, 1],
        };

        let extraction = StatementProcessor::new()
            .with_recognizer(Box::new(FakeOcr))
            .process_document(&pdf)
            .unwrap();
        assert_eq!(extraction.source, TextSource::Ocr);
        assert_eq!(extraction.table.len(), 2);

        let first = &extraction.table.records()[0];
        assert_eq!(first.description, "AMAZON PAY");
        assert_eq!(first.date_string(), "2024-01-02");
    }

    #[test]
    fn test_max_pages_limits_ocr() {
        let pdf = FakePdf {
            text: String::new(),
            images_per_page: vec![1, 1, 1],
        };
        let pdf_config = PdfConfig {
            max_pages: 1,
            ..PdfConfig::default()
        };

        let extraction = StatementProcessor::new()
            .with_pdf_config(pdf_config)
            .with_recognizer(Box::new(FakeOcr))
            .process_document(&pdf)
            .unwrap();
        assert_eq!(extraction.table.len(), 1);
    }

    #[test]
    fn test_scanned_pdf_without_ocr() {
        let pdf = FakePdf {
            text: String::new(),
            images_per_page: vec![1],
        };

        let err = StatementProcessor::new().process_document(&pdf).unwrap_err();
        assert!(matches!(err, CardbillError::Ocr(OcrError::Unavailable)));
    }

    #[test]
    fn test_hybrid_falls_back_to_ocr() {
        let pdf = FakePdf {
            text: "Thank you for banking with us. ".repeat(5),
            images_per_page: vec![1],
        };

        let extraction = StatementProcessor::new()
            .with_recognizer(Box::new(FakeOcr))
            .process_document(&pdf)
            .unwrap();
        assert_eq!(extraction.source, TextSource::Ocr);
    }

    #[test]
    fn test_ocr_failure_is_reported() {
        let pdf = FakePdf {
            text: String::new(),
            images_per_page: vec![1],
        };

        let err = StatementProcessor::new()
            .with_recognizer(Box::new(BrokenOcr))
            .process_document(&pdf)
            .unwrap_err();
        assert!(matches!(err, CardbillError::Ocr(OcrError::Recognition(_))));
    }

    #[test]
    fn test_empty_pdf() {
        let pdf = FakePdf {
            text: "  ".to_string(),
            images_per_page: vec![0],
        };

        let err = StatementProcessor::new().process_document(&pdf).unwrap_err();
        assert!(matches!(
            err,
            CardbillError::Extraction(ExtractionError::EmptyDocument)
        ));
    }

    #[test]
    fn test_process_image() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        let extraction = StatementProcessor::new()
            .with_recognizer(Box::new(FakeOcr))
            .process_image(&image)
            .unwrap();
        assert_eq!(extraction.table.len(), 1);
        assert_eq!(extraction.source, TextSource::Ocr);
    }
}
