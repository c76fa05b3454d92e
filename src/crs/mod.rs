//! CRS inference: features, candidates, scoring.
//!
//! Raw text lines go through heuristic feature extraction, candidate
//! enumeration over a small datum-family catalog, and weighted scoring
//! normalized by softmax into a ranked, explainable probability
//! distribution.

pub mod catalog;
pub mod diagnostics;
pub mod features;
pub mod solver;

pub use catalog::{utm_label, utm_registry_code, DatumFamily};
pub use diagnostics::{pack_matched, Diagnostics, PackedToken, Penalty};
pub use features::{extract_features, ExtractedFeatures, Hemisphere, MatchedToken, Region, Units};
pub use solver::{generate_candidates, softmax, solve, solve_features, Candidate, CrsResolution, RankedCandidate};
