//! Evidence model and arbitration.
//!
//! The evidence side of the engine: a closed field vocabulary, values
//! with confidence and line-level provenance, and the arbiter that
//! merges the deterministic and probabilistic sources into one
//! adjudicated field map.

pub mod arbiter;
pub mod fields;
pub mod types;

pub use arbiter::{arbitrate, merge_evidence, values_agree};
pub use fields::{FieldMap, HeaderField};
pub use types::{clamp01, Evidence, FieldValue, ProvenanceEntry, SourceOrigin};
