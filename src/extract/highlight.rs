//! Span highlighting helpers for display layers.
//!
//! Display-only: wraps matched spans in ⟦ ⟧ markers and aggregates
//! spans per source line. Never feeds back into extraction or scoring.

use std::collections::BTreeMap;

use crate::evidence::FieldMap;

/// Wrap the [start,end) byte span with ⟦ ⟧ markers.
///
/// Returns the line unchanged if the span is out of bounds or does not
/// fall on character boundaries.
pub fn highlight_value(raw_line: &str, span: (usize, usize)) -> String {
    let (start, end) = span;
    if start > end
        || end > raw_line.len()
        || !raw_line.is_char_boundary(start)
        || !raw_line.is_char_boundary(end)
    {
        return raw_line.to_string();
    }
    format!(
        "{}⟦{}⟧{}",
        &raw_line[..start],
        &raw_line[start..end],
        &raw_line[end..]
    )
}

/// Collect highlight spans per 1-based line number from a field map.
///
/// Every evidence's spans are associated with all of its line refs,
/// clipped to the line length and deduplicated.
pub fn gather_line_highlights(
    evidences: &FieldMap,
    lines: &[String],
) -> BTreeMap<u32, Vec<(usize, usize)>> {
    let mut result: BTreeMap<u32, Vec<(usize, usize)>> = BTreeMap::new();

    for ev in evidences.values() {
        let Some(spans) = &ev.raw_spans else { continue };
        for &lineno in &ev.line_refs {
            if lineno == 0 || lineno as usize > lines.len() {
                continue;
            }
            let len = lines[lineno as usize - 1].len();
            for &(s, e) in spans {
                let s2 = s.min(len);
                let e2 = e.min(len).max(s2);
                if s2 >= e2 {
                    continue;
                }
                let entry = result.entry(lineno).or_default();
                if !entry.contains(&(s2, e2)) {
                    entry.push((s2, e2));
                }
            }
        }
    }

    for spans in result.values_mut() {
        spans.sort_unstable();
    }
    result
}
