//! PII detection and redaction service.
//!
//! Accepts uploaded documents, extracts their text (OCR for images, direct
//! read for text files), detects PII spans via a pluggable analyzer engine,
//! and either returns the spans as JSON or a redacted copy of the text.
//! Detection and masking policy live behind the `engine` traits; this crate
//! owns the pipeline, the HTTP surface, and the CLI.

pub mod cli;
pub mod config;
pub mod engine;
pub mod ocr;
pub mod pii;
pub mod server;
