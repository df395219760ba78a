//! PDF loading, text-layer extraction and page image extraction.

mod extractor;

pub use extractor::PdfDocument;

use crate::error::PdfError;
use image::DynamicImage;

/// Kind of content found in a PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfType {
    /// Contains an extractable text layer.
    Text,
    /// Contains only images (scanned bill).
    Image,
    /// Contains both text and images.
    Hybrid,
    /// Empty or unreadable.
    Empty,
}

impl PdfType {
    /// Classify from text-layer length and image presence.
    pub fn classify(text_len: usize, has_images: bool, min_text_length: usize) -> Self {
        match (text_len > min_text_length, has_images) {
            (true, false) => PdfType::Text,
            (false, true) => PdfType::Image,
            (true, true) => PdfType::Hybrid,
            (false, false) => PdfType::Empty,
        }
    }
}

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Source of bill text and page images.
pub trait PdfSource {
    /// Number of pages.
    fn page_count(&self) -> u32;

    /// Text layer of the whole document.
    fn extract_text(&self) -> Result<String>;

    /// Images placed on `page` (1-indexed).
    fn extract_images(&self, page: u32) -> Result<Vec<DynamicImage>>;

    /// Whether the document carries any image at all.
    fn has_images(&self) -> bool {
        (1..=self.page_count()).any(|p| self.extract_images(p).is_ok_and(|i| !i.is_empty()))
    }
}
