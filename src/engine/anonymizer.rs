//! PII anonymizer engines.

use std::cmp::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::EngineError;
use crate::pii::PiiSpan;

/// Masks PII spans in text.
///
/// The anonymizer owns all masking policy; the pipeline hands it the
/// original text and the spans exactly as the analyzer produced them.
#[async_trait]
pub trait Anonymizer: Send + Sync {
    async fn anonymize(&self, text: &str, spans: &[PiiSpan]) -> Result<String, EngineError>;
}

/// Built-in anonymizer that replaces each span with a `<ENTITY_TYPE>`
/// placeholder, the default operator of presidio-style anonymizers.
///
/// Overlapping spans collapse to a single replacement: spans are applied
/// in start order, same-start overlaps prefer the higher score and then
/// the longer span, and spans starting inside an already replaced region
/// are dropped.
pub struct ReplaceAnonymizer;

impl ReplaceAnonymizer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ReplaceAnonymizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Anonymizer for ReplaceAnonymizer {
    async fn anonymize(&self, text: &str, spans: &[PiiSpan]) -> Result<String, EngineError> {
        if spans.is_empty() {
            return Ok(text.to_string());
        }

        // Offsets are character offsets; work over chars so multibyte text
        // is sliced correctly.
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();

        let mut ordered: Vec<&PiiSpan> = spans.iter().collect();
        ordered.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then(b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal))
                .then(
                    b.end
                        .saturating_sub(b.start)
                        .cmp(&a.end.saturating_sub(a.start)),
                )
        });

        let mut out = String::with_capacity(text.len());
        let mut cursor = 0usize;
        for span in ordered {
            if !span.fits(len) {
                return Err(EngineError::InvalidSpan {
                    start: span.start,
                    end: span.end,
                    len,
                });
            }
            if span.start < cursor {
                continue;
            }
            out.extend(&chars[cursor..span.start]);
            out.push('<');
            out.push_str(&span.entity_type);
            out.push('>');
            cursor = span.end;
        }
        out.extend(&chars[cursor..]);

        Ok(out)
    }
}

/// HTTP client for a presidio-compatible anonymizer service.
pub struct RemoteAnonymizer {
    endpoint: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct AnonymizeRequest<'a> {
    text: &'a str,
    analyzer_results: &'a [PiiSpan],
}

#[derive(Debug, Deserialize)]
struct AnonymizeResponse {
    text: String,
}

impl RemoteAnonymizer {
    /// Create a client for the anonymizer service at `endpoint`.
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

    /// Check if the anonymizer service is reachable.
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/health", self.endpoint);
        match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl Anonymizer for RemoteAnonymizer {
    async fn anonymize(&self, text: &str, spans: &[PiiSpan]) -> Result<String, EngineError> {
        let url = format!("{}/anonymize", self.endpoint);
        debug!("Anonymizing {} spans via {}", spans.len(), url);

        let resp = self
            .client
            .post(&url)
            .json(&AnonymizeRequest {
                text,
                analyzer_results: spans,
            })
            .send()
            .await
            .map_err(|e| EngineError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(EngineError::Api(format!("HTTP {}", resp.status())));
        }

        let body: AnonymizeResponse = resp
            .json()
            .await
            .map_err(|e| EngineError::Parse(e.to_string()))?;

        Ok(body.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn replace(text: &str, spans: &[PiiSpan]) -> Result<String, EngineError> {
        ReplaceAnonymizer::new().anonymize(text, spans).await
    }

    #[tokio::test]
    async fn test_no_spans_returns_text_unchanged() {
        let text = "nothing to hide";
        assert_eq!(replace(text, &[]).await.unwrap(), text);
    }

    #[tokio::test]
    async fn test_single_replacement() {
        let text = "John Smith's SSN is 123-45-6789.";
        let spans = vec![PiiSpan::new("US_SSN", 20, 31, 0.85)];
        assert_eq!(
            replace(text, &spans).await.unwrap(),
            "John Smith's SSN is <US_SSN>."
        );
    }

    #[tokio::test]
    async fn test_multibyte_offsets() {
        let text = "café: 123-45-6789";
        let spans = vec![PiiSpan::new("US_SSN", 6, 17, 0.85)];
        assert_eq!(replace(text, &spans).await.unwrap(), "café: <US_SSN>");
    }

    #[tokio::test]
    async fn test_multiple_spans() {
        let text = "a@b.co and 123-45-6789";
        let spans = vec![
            PiiSpan::new("EMAIL_ADDRESS", 0, 6, 1.0),
            PiiSpan::new("US_SSN", 11, 22, 0.85),
        ];
        assert_eq!(
            replace(text, &spans).await.unwrap(),
            "<EMAIL_ADDRESS> and <US_SSN>"
        );
    }

    #[tokio::test]
    async fn test_overlap_later_span_dropped() {
        let text = "abcdefghij";
        let spans = vec![
            PiiSpan::new("A", 0, 5, 0.5),
            PiiSpan::new("B", 3, 8, 0.9),
        ];
        assert_eq!(replace(text, &spans).await.unwrap(), "<A>fghij");
    }

    #[tokio::test]
    async fn test_same_start_overlap_prefers_higher_score() {
        let text = "abcdefghij";
        let spans = vec![
            PiiSpan::new("A", 0, 3, 0.5),
            PiiSpan::new("B", 0, 5, 0.9),
        ];
        assert_eq!(replace(text, &spans).await.unwrap(), "<B>fghij");
    }

    #[tokio::test]
    async fn test_out_of_bounds_span_rejected() {
        let text = "short";
        let spans = vec![PiiSpan::new("A", 0, 10, 0.5)];
        let err = replace(text, &spans).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidSpan { len: 5, .. }));
    }
}
