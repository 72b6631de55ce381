//! Routing between OCR and direct text reading.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use super::tesseract::{check_binary, TesseractOcr};
use super::OcrEngine;

/// Errors that can occur during text extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Declared content category of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Raster image, goes through OCR.
    Image,
    /// Anything else, read as UTF-8 text.
    Text,
}

impl FileKind {
    /// Classify by file extension.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("png" | "jpg" | "jpeg" | "tif" | "tiff" | "bmp" | "gif") => Self::Image,
            _ => Self::Text,
        }
    }
}

/// Extracts a single text string from a file.
pub struct TextExtractor {
    ocr: Arc<dyn OcrEngine>,
}

impl TextExtractor {
    /// Extractor with the default Tesseract engine.
    pub fn new(ocr_language: &str) -> Self {
        Self {
            ocr: Arc::new(TesseractOcr::with_language(ocr_language)),
        }
    }

    /// Extractor with a custom OCR engine.
    pub fn with_engine(ocr: Arc<dyn OcrEngine>) -> Self {
        Self { ocr }
    }

    /// Extract text from `path`.
    ///
    /// Images are handed to the OCR engine and never opened as text; other
    /// files are read verbatim as UTF-8. Collaborator and IO errors
    /// propagate untouched.
    pub fn extract(&self, path: &Path, kind: FileKind) -> Result<String, ExtractionError> {
        match kind {
            FileKind::Image => {
                tracing::debug!("Routing {} to OCR", path.display());
                self.ocr.extract_text(path)
            }
            FileKind::Text => Ok(std::fs::read_to_string(path)?),
        }
    }

    /// Check if required external tools are available.
    pub fn check_tools() -> Vec<(String, bool)> {
        ["tesseract"]
            .iter()
            .map(|tool| (tool.to_string(), check_binary(tool)))
            .collect()
    }
}
