//! Two-source evidence arbitration.
//!
//! Given one field map from the deterministic pattern extractor and one
//! from the probabilistic inference provider, pick a single winning
//! value per field and record why it won. Pure function of its inputs
//! and the static tolerances in [`ArbiterConfig`]; an empty map from
//! either source is a normal input, never an error.

use tracing::{debug, instrument};

use crate::config::ArbiterConfig;

use super::{clamp01, Evidence, FieldMap, FieldValue, ProvenanceEntry, SourceOrigin};

/// Loose equality between two field values.
///
/// Tiers, in order: exact equality; numeric coercion within
/// `max(abs_tol, rel_tol * max(|a|,|b|))`; trimmed case-folded string
/// equality. A pair that fails all three counts as disagreement.
pub fn values_agree(a: &FieldValue, b: &FieldValue, cfg: &ArbiterConfig) -> bool {
    if a == b {
        return true;
    }
    if let (Some(fa), Some(fb)) = (a.as_f64(), b.as_f64()) {
        let tol = cfg.abs_tol.max(cfg.rel_tol * fa.abs().max(fb.abs()));
        return (fa - fb).abs() <= tol;
    }
    let sa = value_to_string(a);
    let sb = value_to_string(b);
    sa.trim().to_uppercase() == sb.trim().to_uppercase()
}

fn value_to_string(v: &FieldValue) -> String {
    match v {
        FieldValue::Text(s) => s.clone(),
        FieldValue::Int(i) => i.to_string(),
        FieldValue::Float(f) => f.to_string(),
    }
}

/// Merge two evidences for the same field.
///
/// Higher confidence wins value and confidence; on a tie the preferred
/// side wins (whether or not the values agree numerically). Line refs
/// and spans are always unioned.
pub fn merge_evidence(pref: &Evidence, alt: &Evidence) -> Evidence {
    let winner = if alt.confidence > pref.confidence {
        alt
    } else {
        pref
    };

    let mut merged = Evidence {
        value: winner.value.clone(),
        confidence: winner.confidence,
        line_refs: pref
            .line_refs
            .iter()
            .chain(alt.line_refs.iter())
            .copied()
            .collect(),
        raw_spans: match (&pref.raw_spans, &alt.raw_spans) {
            (None, None) => None,
            (a, b) => Some(
                a.iter()
                    .chain(b.iter())
                    .flatten()
                    .copied()
                    .collect::<Vec<_>>(),
            ),
        },
    };
    merged.normalize();
    merged
}

/// Strip entries whose value is "absent" (whitespace-only text).
fn present_only(map: &FieldMap) -> FieldMap {
    map.iter()
        .filter(|(_, ev)| !ev.value.is_empty())
        .map(|(k, v)| (*k, v.clone()))
        .collect()
}

/// Adjudicate two field maps into one, with a provenance trail.
///
/// Per field: a value present in only one source is taken verbatim;
/// agreement takes the higher-confidence value, unions line refs and
/// boosts the averaged confidence; disagreement takes the
/// higher-confidence value with a penalty and only that source's refs.
/// Confidence ties favor the deterministic (pattern) source.
#[instrument(skip_all, fields(pattern_fields = pattern.len(), inference_fields = inference.len()))]
pub fn arbitrate(
    pattern: &FieldMap,
    inference: &FieldMap,
    cfg: &ArbiterConfig,
) -> (FieldMap, Vec<ProvenanceEntry>) {
    let pattern = present_only(pattern);
    let inference = present_only(inference);

    let mut resolved = FieldMap::new();
    let mut provenance = Vec::new();

    let mut keys: Vec<_> = pattern.keys().chain(inference.keys()).copied().collect();
    keys.sort_unstable();
    keys.dedup();

    for field in keys {
        match (pattern.get(&field), inference.get(&field)) {
            (Some(p), None) => {
                provenance.push(ProvenanceEntry {
                    field,
                    source: SourceOrigin::Pattern,
                    pattern_conf: Some(p.confidence),
                    inference_conf: None,
                    chosen_conf: p.confidence,
                    line_refs: p.line_refs.clone(),
                });
                resolved.insert(field, p.clone());
            }
            (None, Some(i)) => {
                provenance.push(ProvenanceEntry {
                    field,
                    source: SourceOrigin::Inference,
                    pattern_conf: None,
                    inference_conf: Some(i.confidence),
                    chosen_conf: i.confidence,
                    line_refs: i.line_refs.clone(),
                });
                resolved.insert(field, i.clone());
            }
            (Some(p), Some(i)) => {
                if values_agree(&p.value, &i.value, cfg) {
                    // Agree: higher confidence picks the value, refs
                    // union, averaged confidence gets a boost.
                    let winner = if p.confidence >= i.confidence { p } else { i };
                    let boosted =
                        clamp01((p.confidence + i.confidence) / 2.0 + cfg.agree_boost);
                    let mut line_refs: Vec<u32> = p
                        .line_refs
                        .iter()
                        .chain(i.line_refs.iter())
                        .copied()
                        .collect();
                    line_refs.sort_unstable();
                    line_refs.dedup();

                    resolved.insert(
                        field,
                        Evidence {
                            value: winner.value.clone(),
                            confidence: boosted,
                            line_refs: line_refs.clone(),
                            raw_spans: winner.raw_spans.clone(),
                        },
                    );
                    provenance.push(ProvenanceEntry {
                        field,
                        source: SourceOrigin::Agreed,
                        pattern_conf: Some(p.confidence),
                        inference_conf: Some(i.confidence),
                        chosen_conf: boosted,
                        line_refs,
                    });
                } else {
                    // Disagree: higher confidence wins, penalized; refs
                    // stay with the winning source only.
                    debug!(field = %field, "sources disagree");
                    let (winner, source) = if p.confidence >= i.confidence {
                        (p, SourceOrigin::Pattern)
                    } else {
                        (i, SourceOrigin::Inference)
                    };
                    let penalized = clamp01(winner.confidence - cfg.disagree_penalty);

                    resolved.insert(
                        field,
                        Evidence {
                            value: winner.value.clone(),
                            confidence: penalized,
                            line_refs: winner.line_refs.clone(),
                            raw_spans: winner.raw_spans.clone(),
                        },
                    );
                    provenance.push(ProvenanceEntry {
                        field,
                        source,
                        pattern_conf: Some(p.confidence),
                        inference_conf: Some(i.confidence),
                        chosen_conf: penalized,
                        line_refs: winner.line_refs.clone(),
                    });
                }
            }
            (None, None) => {}
        }
    }

    (resolved, provenance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::HeaderField;

    fn cfg() -> ArbiterConfig {
        ArbiterConfig::default()
    }

    #[test]
    fn numeric_agreement_within_tolerance() {
        let c = cfg();
        assert!(values_agree(
            &FieldValue::Float(2000.0),
            &FieldValue::Float(2000.5),
            &c
        ));
        assert!(values_agree(
            &FieldValue::Int(2000),
            &FieldValue::Text("2000".into()),
            &c
        ));
        assert!(!values_agree(
            &FieldValue::Float(2000.0),
            &FieldValue::Float(2100.0),
            &c
        ));
    }

    #[test]
    fn string_agreement_is_case_and_space_insensitive() {
        let c = cfg();
        assert!(values_agree(
            &FieldValue::Text(" Acme Geo ".into()),
            &FieldValue::Text("ACME GEO".into()),
            &c
        ));
        assert!(!values_agree(
            &FieldValue::Text("ACME".into()),
            &FieldValue::Text("ZENITH".into()),
            &c
        ));
    }

    #[test]
    fn merge_prefers_higher_confidence_and_unions_refs() {
        let pref = Evidence::new(FieldValue::Int(2000), 0.6, 3);
        let alt = Evidence::new(FieldValue::Int(2001), 0.9, 5);
        let merged = merge_evidence(&pref, &alt);
        assert_eq!(merged.value, FieldValue::Int(2001));
        assert_eq!(merged.confidence, 0.9);
        assert_eq!(merged.line_refs, vec![3, 5]);
    }

    #[test]
    fn merge_tie_keeps_preferred_even_across_value_types() {
        let pref = Evidence::new(FieldValue::Int(2000), 0.8, 3);
        let alt = Evidence::new(FieldValue::Float(2000.0), 0.8, 4);
        let merged = merge_evidence(&pref, &alt);
        assert_eq!(merged.value, FieldValue::Int(2000));
        assert_eq!(merged.line_refs, vec![3, 4]);
    }

    #[test]
    fn single_source_fields_pass_through_verbatim() {
        let mut pattern = FieldMap::new();
        pattern.insert(HeaderField::Company, Evidence::new("ACME", 0.8, 1));
        let inference = FieldMap::new();

        let (resolved, prov) = arbitrate(&pattern, &inference, &cfg());
        assert_eq!(resolved[&HeaderField::Company].confidence, 0.8);
        assert_eq!(prov.len(), 1);
        assert_eq!(prov[0].source, SourceOrigin::Pattern);
        assert_eq!(prov[0].inference_conf, None);
    }

    #[test]
    fn empty_values_are_skipped_not_zero_confidence() {
        let mut inference = FieldMap::new();
        inference.insert(HeaderField::Vessel, Evidence::new("  ", 0.9, 2));
        let (resolved, prov) = arbitrate(&FieldMap::new(), &inference, &cfg());
        assert!(resolved.is_empty());
        assert!(prov.is_empty());
    }
}
