//! Deterministic pattern extraction.
//!
//! The low-risk half of the evidence pipeline: regex conventions over
//! header text, span-reporting value matchers, and display-side span
//! highlighting.

pub mod baseline;
pub mod highlight;
pub mod values;

pub use baseline::parse_baseline;
pub use highlight::{gather_line_highlights, highlight_value};
