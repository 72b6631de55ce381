//! Annotation and redaction over the engine seams.

use std::sync::Arc;

use tracing::debug;

use crate::engine::{Analyzer, Anonymizer, EngineError};

use super::PiiSpan;

/// Stateless PII pipeline.
///
/// Holds the collaborator handles and the analysis language; each call is
/// an independent delegation chain with no shared mutable state.
#[derive(Clone)]
pub struct PiiPipeline {
    analyzer: Arc<dyn Analyzer>,
    anonymizer: Arc<dyn Anonymizer>,
    language: String,
}

impl PiiPipeline {
    pub fn new(
        analyzer: Arc<dyn Analyzer>,
        anonymizer: Arc<dyn Anonymizer>,
        language: &str,
    ) -> Self {
        Self {
            analyzer,
            anonymizer,
            language: language.to_string(),
        }
    }

    /// Detect PII spans in `text`.
    ///
    /// Every match the analyzer returns is passed through unchanged: no
    /// thresholding, filtering, deduplication, or reordering.
    pub async fn annotate(&self, text: &str) -> Result<Vec<PiiSpan>, EngineError> {
        let spans = self.analyzer.analyze(text, &self.language).await?;
        debug!("Analyzer returned {} spans", spans.len());
        Ok(spans)
    }

    /// Redact PII in `text`.
    ///
    /// Two-step delegation: the analyzer produces spans, then the
    /// anonymizer receives the original text and exactly those spans.
    /// Masking policy is owned entirely by the anonymizer; collaborator
    /// failures propagate with no retry or partial result.
    pub async fn redact(&self, text: &str) -> Result<String, EngineError> {
        let spans = self.analyzer.analyze(text, &self.language).await?;
        self.anonymizer.anonymize(text, &spans).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ReplaceAnonymizer;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StubAnalyzer {
        spans: Vec<PiiSpan>,
        languages_seen: Mutex<Vec<String>>,
    }

    impl StubAnalyzer {
        fn returning(spans: Vec<PiiSpan>) -> Self {
            Self {
                spans,
                languages_seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Analyzer for StubAnalyzer {
        async fn analyze(
            &self,
            _text: &str,
            language: &str,
        ) -> Result<Vec<PiiSpan>, EngineError> {
            self.languages_seen
                .lock()
                .unwrap()
                .push(language.to_string());
            Ok(self.spans.clone())
        }
    }

    struct CapturingAnonymizer {
        calls: Mutex<Vec<(String, Vec<PiiSpan>)>>,
    }

    impl CapturingAnonymizer {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Anonymizer for CapturingAnonymizer {
        async fn anonymize(
            &self,
            text: &str,
            spans: &[PiiSpan],
        ) -> Result<String, EngineError> {
            self.calls
                .lock()
                .unwrap()
                .push((text.to_string(), spans.to_vec()));
            Ok("REDACTED".to_string())
        }
    }

    struct FailingAnalyzer;

    #[async_trait]
    impl Analyzer for FailingAnalyzer {
        async fn analyze(&self, _: &str, _: &str) -> Result<Vec<PiiSpan>, EngineError> {
            Err(EngineError::Connection("analyzer down".to_string()))
        }
    }

    fn pipeline(analyzer: Arc<dyn Analyzer>, anonymizer: Arc<dyn Anonymizer>) -> PiiPipeline {
        PiiPipeline::new(analyzer, anonymizer, "en")
    }

    #[tokio::test]
    async fn test_annotate_empty_when_analyzer_finds_nothing() {
        let p = pipeline(
            Arc::new(StubAnalyzer::returning(vec![])),
            Arc::new(ReplaceAnonymizer::new()),
        );
        assert!(p.annotate("plain text").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_redact_unchanged_when_analyzer_finds_nothing() {
        let p = pipeline(
            Arc::new(StubAnalyzer::returning(vec![])),
            Arc::new(ReplaceAnonymizer::new()),
        );
        let text = "plain text with no PII";
        assert_eq!(p.redact(text).await.unwrap(), text);
    }

    #[tokio::test]
    async fn test_annotate_is_a_pass_through() {
        let spans = vec![
            PiiSpan::new("EMAIL_ADDRESS", 5, 11, 1.0),
            PiiSpan::new("US_SSN", 20, 31, 0.85),
        ];
        let analyzer = Arc::new(StubAnalyzer::returning(spans.clone()));
        let p = pipeline(analyzer.clone(), Arc::new(ReplaceAnonymizer::new()));

        // Nothing added, dropped, or reordered
        assert_eq!(p.annotate("whatever the text is, really").await.unwrap(), spans);
        // The configured language tag is forwarded
        assert_eq!(*analyzer.languages_seen.lock().unwrap(), vec!["en"]);
    }

    #[tokio::test]
    async fn test_redact_hands_anonymizer_exact_arguments() {
        let spans = vec![PiiSpan::new("US_SSN", 20, 31, 0.85)];
        let anonymizer = Arc::new(CapturingAnonymizer::new());
        let p = pipeline(
            Arc::new(StubAnalyzer::returning(spans.clone())),
            anonymizer.clone(),
        );

        let text = "John Smith's SSN is 123-45-6789.";
        assert_eq!(p.redact(text).await.unwrap(), "REDACTED");

        let calls = anonymizer.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, text);
        assert_eq!(calls[0].1, spans);
    }

    #[tokio::test]
    async fn test_end_to_end_ssn_redaction() {
        let text = "John Smith's SSN is 123-45-6789.";
        let spans = vec![PiiSpan::new("US_SSN", 20, 31, 0.85)];
        let p = pipeline(
            Arc::new(StubAnalyzer::returning(spans.clone())),
            Arc::new(ReplaceAnonymizer::new()),
        );

        assert_eq!(p.annotate(text).await.unwrap(), spans);
        assert_eq!(p.redact(text).await.unwrap(), "John Smith's SSN is <US_SSN>.");
    }

    #[tokio::test]
    async fn test_analyzer_failure_propagates() {
        let p = pipeline(Arc::new(FailingAnalyzer), Arc::new(ReplaceAnonymizer::new()));
        assert!(matches!(
            p.redact("text").await.unwrap_err(),
            EngineError::Connection(_)
        ));
    }
}
