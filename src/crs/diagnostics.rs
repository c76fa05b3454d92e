//! Scoring diagnostics returned alongside ranked candidates.
//!
//! A write-only trail: extraction and scoring append to it, nothing
//! reads it back. Serializes as-is for the calling layer.

use serde::{Deserialize, Serialize};

use super::features::MatchedToken;

/// Matched-token record in API shape (span dropped, 0-based line kept).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackedToken {
    pub token: String,
    pub weight: f64,
    pub source_line: usize,
}

/// Flatten the matched-token trail for display.
pub fn pack_matched(tokens: &[MatchedToken]) -> Vec<PackedToken> {
    tokens
        .iter()
        .map(|t| PackedToken {
            token: t.token.clone(),
            weight: t.weight,
            source_line: t.line_idx,
        })
        .collect()
}

/// A penalty applied to candidate scores, with its rationale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Penalty {
    pub reason: String,
    pub delta: f64,
}

/// Everything the scorer wants a human to see.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub matched_keywords: Vec<PackedToken>,
    pub conflicts: Vec<String>,
    pub penalties: Vec<Penalty>,
    pub notes: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packing_drops_span_keeps_line_index() {
        let tokens = vec![MatchedToken {
            token: "ZONE 32N".into(),
            weight: 3.0,
            line_idx: 4,
            span: Some((4, 7)),
        }];
        let packed = pack_matched(&tokens);
        assert_eq!(packed.len(), 1);
        assert_eq!(packed[0].source_line, 4);
        let json = serde_json::to_value(&packed[0]).unwrap();
        assert!(json.get("span").is_none());
    }
}
