//! PII analyzer engines.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use super::EngineError;
use crate::pii::PiiSpan;

/// Detects PII spans in text.
///
/// `analyze` returns every match with character offsets into `text`;
/// callers pass the results through without filtering or reordering.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, text: &str, language: &str) -> Result<Vec<PiiSpan>, EngineError>;
}

/// (entity type, pattern, score) for the built-in analyzer.
static PATTERNS: Lazy<Vec<(&'static str, Regex, f32)>> = Lazy::new(|| {
    vec![
        (
            "US_SSN",
            Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").expect("valid SSN regex"),
            0.85,
        ),
        (
            "EMAIL_ADDRESS",
            Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
                .expect("valid email regex"),
            1.0,
        ),
        (
            // NANP formats: (555) 123-4567, 555-123-4567, +1 555 123 4567
            "PHONE_NUMBER",
            Regex::new(r"(?:\+?1[-.\s])?\(?[2-9]\d{2}\)?[-.\s]\d{3}[-.\s]?\d{4}\b")
                .expect("valid phone regex"),
            0.6,
        ),
        (
            "CREDIT_CARD",
            Regex::new(r"\b\d{4}[ -]?\d{4}[ -]?\d{4}[ -]?\d{4}\b").expect("valid card regex"),
            0.7,
        ),
        (
            "IP_ADDRESS",
            Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").expect("valid IP regex"),
            0.6,
        ),
    ]
});

/// Convert a byte index into a character offset.
fn char_offset(text: &str, byte_idx: usize) -> usize {
    text[..byte_idx].chars().count()
}

/// Built-in regex analyzer covering common structured PII.
///
/// Offsets are converted from regex byte positions to character positions
/// so results match what a presidio-style analyzer would return. The
/// language tag is accepted for interface parity; the patterns themselves
/// are English/NANP-centric.
pub struct PatternAnalyzer;

impl PatternAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PatternAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Analyzer for PatternAnalyzer {
    async fn analyze(&self, text: &str, _language: &str) -> Result<Vec<PiiSpan>, EngineError> {
        let mut spans = Vec::new();
        for (entity_type, regex, score) in PATTERNS.iter() {
            for m in regex.find_iter(text) {
                spans.push(PiiSpan::new(
                    *entity_type,
                    char_offset(text, m.start()),
                    char_offset(text, m.end()),
                    *score,
                ));
            }
        }
        spans.sort_by(|a, b| (a.start, a.end).cmp(&(b.start, b.end)));
        Ok(spans)
    }
}

/// HTTP client for a presidio-compatible analyzer service.
pub struct RemoteAnalyzer {
    endpoint: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    text: &'a str,
    language: &'a str,
}

impl RemoteAnalyzer {
    /// Create a client for the analyzer service at `endpoint`.
    pub fn new(endpoint: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Check if the analyzer service is reachable.
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/health", self.endpoint);
        match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl Analyzer for RemoteAnalyzer {
    async fn analyze(&self, text: &str, language: &str) -> Result<Vec<PiiSpan>, EngineError> {
        let url = format!("{}/analyze", self.endpoint);
        debug!("Analyzing {} characters via {}", text.chars().count(), url);

        let resp = self
            .client
            .post(&url)
            .json(&AnalyzeRequest { text, language })
            .send()
            .await
            .map_err(|e| EngineError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(EngineError::Api(format!("HTTP {}", resp.status())));
        }

        // The analyzer returns a flat list of matches; extra fields in its
        // response are ignored.
        let spans: Vec<PiiSpan> = resp
            .json()
            .await
            .map_err(|e| EngineError::Parse(e.to_string()))?;

        Ok(spans)
    }
}
