//! PII span data model.

use serde::{Deserialize, Serialize};

/// A detected PII instance: a labeled character-offset range with a
/// confidence score.
///
/// Offsets count characters, not bytes, matching the wire format of
/// presidio-style analyzers. Invariant: `0 <= start <= end <= character
/// length of the analyzed text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiiSpan {
    /// Entity label, e.g. `US_SSN` or `EMAIL_ADDRESS`.
    pub entity_type: String,
    /// Start offset in characters, inclusive.
    pub start: usize,
    /// End offset in characters, exclusive.
    pub end: usize,
    /// Detector confidence in `[0, 1]`.
    pub score: f32,
}

impl PiiSpan {
    pub fn new(entity_type: impl Into<String>, start: usize, end: usize, score: f32) -> Self {
        Self {
            entity_type: entity_type.into(),
            start,
            end,
            score,
        }
    }

    /// Check the offset invariant against a text of `char_len` characters.
    pub fn fits(&self, char_len: usize) -> bool {
        self.start <= self.end && self.end <= char_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fits() {
        let span = PiiSpan::new("US_SSN", 20, 31, 0.85);
        assert!(span.fits(32));
        assert!(span.fits(31));
        assert!(!span.fits(30));

        let backwards = PiiSpan::new("US_SSN", 10, 5, 0.85);
        assert!(!backwards.fits(32));
    }

    #[test]
    fn test_serialization_shape() {
        let span = PiiSpan::new("EMAIL_ADDRESS", 0, 6, 1.0);
        let json = serde_json::to_value(&span).unwrap();
        assert_eq!(json["entity_type"], "EMAIL_ADDRESS");
        assert_eq!(json["start"], 0);
        assert_eq!(json["end"], 6);
    }
}
