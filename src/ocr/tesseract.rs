//! Tesseract OCR engine.
//!
//! Shells out to the tesseract binary. This is the traditional,
//! widely-available OCR option.

use std::path::Path;
use std::process::Command;

use super::{ExtractionError, OcrEngine};

/// Check if a binary is available in PATH.
pub fn check_binary(name: &str) -> bool {
    Command::new("which")
        .arg(name)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Tesseract OCR engine.
pub struct TesseractOcr {
    language: String,
}

impl TesseractOcr {
    /// Create an engine with the default language (eng).
    pub fn new() -> Self {
        Self {
            language: "eng".to_string(),
        }
    }

    /// Create an engine with a specific Tesseract language.
    pub fn with_language(language: &str) -> Self {
        Self {
            language: language.to_string(),
        }
    }

    /// Check if the tesseract binary is installed.
    pub fn is_available(&self) -> bool {
        check_binary("tesseract")
    }

    pub fn availability_hint(&self) -> String {
        if !check_binary("tesseract") {
            "Tesseract not installed. Install with: apt install tesseract-ocr".to_string()
        } else {
            "Tesseract is available".to_string()
        }
    }
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrEngine for TesseractOcr {
    fn extract_text(&self, image_path: &Path) -> Result<String, ExtractionError> {
        let output = Command::new("tesseract")
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.language])
            .output();

        match output {
            Ok(output) => {
                if output.status.success() {
                    Ok(String::from_utf8_lossy(&output.stdout).to_string())
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    Err(ExtractionError::OcrFailed(format!(
                        "tesseract failed: {}",
                        stderr
                    )))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
                ExtractionError::ToolNotFound("tesseract (install tesseract-ocr)".to_string()),
            ),
            Err(e) => Err(ExtractionError::Io(e)),
        }
    }
}
