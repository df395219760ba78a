//! OCR boundary: recognized text boxes and their grouping into bill lines.

#[cfg(feature = "native")]
mod pure_engine;

#[cfg(feature = "native")]
pub use pure_engine::PureOcrEngine;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// A recognized text box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBox {
    /// Quadrilateral corners (x1, y1, x2, y2, x3, y3, x4, y4).
    pub bbox: [f32; 8],

    /// Recognized text content.
    pub text: String,

    /// Recognition confidence (0.0 - 1.0).
    pub confidence: f32,
}

impl TextBox {
    pub fn new(bbox: [f32; 8], text: impl Into<String>, confidence: f32) -> Self {
        Self {
            bbox,
            text: text.into(),
            confidence,
        }
    }

    /// Axis-aligned rectangle covering an `x, y, width, height` box.
    pub fn from_rect(x: f32, y: f32, width: f32, height: f32, text: impl Into<String>) -> Self {
        Self::new(
            [x, y, x + width, y, x + width, y + height, x, y + height],
            text,
            1.0,
        )
    }

    /// Axis-aligned bounding rectangle `(min_x, min_y, max_x, max_y)`.
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.bbox[0], self.bbox[2], self.bbox[4], self.bbox[6]];
        let ys = [self.bbox[1], self.bbox[3], self.bbox[5], self.bbox[7]];

        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }

    fn center_y(&self) -> f32 {
        let (_, min_y, _, max_y) = self.rect();
        (min_y + max_y) / 2.0
    }
}

/// Result of OCR on one image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrResult {
    /// Recognized text boxes, in engine order.
    pub boxes: Vec<TextBox>,

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,

    /// Image dimensions (width, height).
    pub image_size: (u32, u32),
}

impl OcrResult {
    pub fn new(boxes: Vec<TextBox>, image_size: (u32, u32)) -> Self {
        Self {
            boxes,
            processing_time_ms: 0,
            image_size,
        }
    }

    /// Group boxes into printed lines.
    ///
    /// Boxes whose vertical centers are within `tolerance` pixels of a row's first
    /// box share that row; each row is read left to right and joined with spaces.
    pub fn lines(&self, tolerance: f32) -> Vec<String> {
        let mut boxes: Vec<&TextBox> = self
            .boxes
            .iter()
            .filter(|b| !b.text.trim().is_empty())
            .collect();
        boxes.sort_by(|a, b| a.center_y().total_cmp(&b.center_y()));

        let mut rows: Vec<Vec<&TextBox>> = Vec::new();
        let mut row_y = f32::NEG_INFINITY;

        for text_box in boxes {
            let y = text_box.center_y();
            match rows.last_mut() {
                Some(row) if (y - row_y).abs() < tolerance => row.push(text_box),
                _ => {
                    rows.push(vec![text_box]);
                    row_y = y;
                }
            }
        }

        rows.into_iter()
            .map(|mut row| {
                row.sort_by(|a, b| a.rect().0.total_cmp(&b.rect().0));
                row.iter()
                    .map(|b| b.text.trim())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }

    /// Recognized text, one printed line per text line.
    pub fn text(&self, tolerance: f32) -> String {
        self.lines(tolerance).join("\n")
    }
}

/// A text recognizer for page images.
///
/// The pipeline treats recognition as a black box: image in, text boxes out.
pub trait TextRecognizer {
    /// Recognize text in `image`.
    fn recognize(&self, image: &DynamicImage) -> Result<OcrResult, OcrError>;
}
