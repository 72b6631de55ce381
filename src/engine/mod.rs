//! Collaborator engines for PII analysis and anonymization.
//!
//! The pipeline treats detection and masking as external collaborators
//! behind the `Analyzer` and `Anonymizer` traits. Two implementations of
//! each ship with the crate:
//!
//! - **Pattern**: in-process regex detection and placeholder replacement
//!   (default, no external services required)
//! - **Presidio**: HTTP clients for presidio-compatible analyzer and
//!   anonymizer services

mod analyzer;
mod anonymizer;

pub use analyzer::{Analyzer, PatternAnalyzer, RemoteAnalyzer};
pub use anonymizer::{Anonymizer, RemoteAnonymizer, ReplaceAnonymizer};

use std::sync::Arc;

use thiserror::Error;

use crate::config::{EngineBackend, Settings};

/// Errors raised by analyzer/anonymizer engines.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid span {start}..{end} for text of {len} characters")]
    InvalidSpan {
        start: usize,
        end: usize,
        len: usize,
    },
}

/// Analyzer and anonymizer handles selected from settings.
///
/// Engines are constructed once at startup and injected into each
/// operation; there is no module-level singleton.
pub struct Engines {
    pub analyzer: Arc<dyn Analyzer>,
    pub anonymizer: Arc<dyn Anonymizer>,
}

impl Engines {
    /// Construct engine handles for the configured backend.
    pub fn from_settings(settings: &Settings) -> Self {
        match settings.backend {
            EngineBackend::Pattern => Self {
                analyzer: Arc::new(PatternAnalyzer::new()),
                anonymizer: Arc::new(ReplaceAnonymizer::new()),
            },
            EngineBackend::Presidio => Self {
                analyzer: Arc::new(RemoteAnalyzer::new(&settings.analyzer_url)),
                anonymizer: Arc::new(RemoteAnonymizer::new(&settings.anonymizer_url)),
            },
        }
    }
}
