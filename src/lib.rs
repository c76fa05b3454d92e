//! segiq - Evidence resolution and CRS ranking for survey headers
//!
//! A library for extracting structured metadata from free-text
//! geophysical survey headers and resolving it into one
//! confidence-ranked answer per field, plus ranking coordinate
//! reference system (CRS) hypotheses from the same text.
//!
//! # Architecture
//!
//! Two independent engines share one design pattern (weighted,
//! explainable evidence combination):
//! - Field resolution: deterministic pattern extraction and a
//!   probabilistic inference provider each produce per-field
//!   [`Evidence`]; the arbiter adjudicates one winner per field with
//!   a provenance trail explaining the decision.
//! - CRS ranking: per-line heuristics build a feature set, candidates
//!   are enumerated per datum family, scored against the features and
//!   vintage/region priors, and normalized to probabilities by
//!   softmax.
//!
//! Both engines are pure functions of their inputs and an explicit
//! [`EngineConfig`]; neither ever fails on malformed upstream text,
//! degrading to "no evidence" or "fewer candidates" instead.
//!
//! # Modules
//!
//! - `evidence`: Evidence model, field vocabulary, arbitration
//! - `extract`: Deterministic pattern extraction and span highlighting
//! - `infer`: Prompting and parsing for the inference provider
//! - `adapters`: External inference providers (Azure OpenAI)
//! - `crs`: CRS feature extraction, candidates, scoring
//! - `config`: Tunable weights, tolerances and their validation
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Resolve header fields (baseline + inference when configured)
//! segiq parse header.txt
//!
//! # Rank CRS candidates for the same text
//! segiq crs header.txt
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod crs;
pub mod evidence;
pub mod extract;
pub mod infer;

// Re-export main types at crate root for convenience
pub use config::{ArbiterConfig, ConfigError, CrsConfig, CrsWeights, EngineConfig};
pub use crs::{
    extract_features, solve, CrsResolution, Diagnostics, ExtractedFeatures, Hemisphere,
    RankedCandidate, Units,
};
pub use evidence::{
    arbitrate, Evidence, FieldMap, FieldValue, HeaderField, ProvenanceEntry, SourceOrigin,
};
pub use extract::parse_baseline;

// Inference provider boundary
pub use adapters::{AzureOpenAiProvider, InferenceProvider};
pub use infer::infer_header;
