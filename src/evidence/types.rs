//! Evidence and provenance data types.
//!
//! An [`Evidence`] is a value plus the confidence and source lines that
//! justify it; a [`ProvenanceEntry`] records why a value won
//! arbitration. Both serialize verbatim for the calling layer.

use serde::{Deserialize, Serialize};

use super::HeaderField;

/// A scalar field value as extracted from header text.
///
/// Untagged so `2000`, `2.0` and `"ACME GEO"` all serialize as the
/// plain JSON primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// Numeric view of the value, parsing text if needed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }

    /// A whitespace-only string is "absent", not a zero-confidence fact.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

/// A value with provenance: confidence plus the 1-based header lines
/// (and optionally character spans) that justify it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub value: FieldValue,

    /// Confidence in [0,1]; clamped on construction.
    pub confidence: f64,

    /// 1-based line numbers, deduplicated and ascending.
    pub line_refs: Vec<u32>,

    /// Byte-offset [start,end) spans within the source line(s).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_spans: Option<Vec<(usize, usize)>>,
}

impl Evidence {
    /// Evidence from a single line, confidence clamped to [0,1].
    pub fn new(value: impl Into<FieldValue>, confidence: f64, lineno: u32) -> Self {
        Self {
            value: value.into(),
            confidence: clamp01(confidence),
            line_refs: vec![lineno],
            raw_spans: None,
        }
    }

    /// Evidence carrying the matched character span for highlighting.
    pub fn with_span(
        value: impl Into<FieldValue>,
        confidence: f64,
        lineno: u32,
        span: (usize, usize),
    ) -> Self {
        Self {
            value: value.into(),
            confidence: clamp01(confidence),
            line_refs: vec![lineno],
            raw_spans: Some(vec![span]),
        }
    }

    /// Evidence spanning several lines (e.g. derived values).
    pub fn from_lines(value: impl Into<FieldValue>, confidence: f64, lines: Vec<u32>) -> Self {
        let mut ev = Self {
            value: value.into(),
            confidence: clamp01(confidence),
            line_refs: lines,
            raw_spans: None,
        };
        ev.normalize();
        ev
    }

    /// Re-establish the line_refs/raw_spans invariants after a merge.
    pub fn normalize(&mut self) {
        self.line_refs.sort_unstable();
        self.line_refs.dedup();
        if let Some(spans) = &mut self.raw_spans {
            spans.sort_unstable();
            spans.dedup();
            if spans.is_empty() {
                self.raw_spans = None;
            }
        }
        self.confidence = clamp01(self.confidence);
    }
}

/// Clamp a confidence into [0,1].
pub fn clamp01(x: f64) -> f64 {
    if x.is_nan() {
        return 0.0;
    }
    x.clamp(0.0, 1.0)
}

/// Which source a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceOrigin {
    /// Deterministic pattern extraction
    Pattern,
    /// Probabilistic inference provider
    Inference,
    /// Both sources agreed; confidence boosted
    Agreed,
}

/// Audit record for one arbitrated field.
///
/// Carries the per-origin confidences actually observed so a caller can
/// reconstruct why the value won.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceEntry {
    pub field: HeaderField,
    pub source: SourceOrigin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_conf: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inference_conf: Option<f64>,
    pub chosen_conf: f64,
    pub line_refs: Vec<u32>,
}
