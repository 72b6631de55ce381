//! Text extraction from uploaded files.
//!
//! Images route to an OCR engine (Tesseract by default); everything else
//! is read directly as UTF-8 text.

mod extractor;
mod tesseract;

pub use extractor::{ExtractionError, FileKind, TextExtractor};
pub use tesseract::{check_binary, TesseractOcr};

use std::path::Path;

/// Converts image pixels to text.
///
/// Implementations own image decoding and character recognition; the
/// extractor only routes to them.
pub trait OcrEngine: Send + Sync {
    fn extract_text(&self, image_path: &Path) -> Result<String, ExtractionError>;
}
