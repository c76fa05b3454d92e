//! Prompting and parsing for the probabilistic inference source.
//!
//! Strategy mirrors the intelligent-parse flow:
//! 1. One-shot multi-field extraction over the closed vocabulary.
//! 2. Targeted follow-up prompts for missing important or
//!    low-confidence fields, issued concurrently.
//! 3. Strict-JSON reply parsing with lightweight validation/coercion.
//! 4. Silent empty result when the provider is absent or fails.

use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::adapters::InferenceProvider;
use crate::evidence::{clamp01, Evidence, FieldMap, FieldValue, HeaderField};

/// Headers are conventionally 40 lines of 80 chars; refs outside this
/// window are dropped as hallucinated.
const MAX_PROMPT_LINES: usize = 40;
const MAX_LINE_CHARS: usize = 80;

/// Fields worth a follow-up prompt when the one-shot pass missed them.
const IMPORTANT_FIELDS: [HeaderField; 3] = [
    HeaderField::SurveyName,
    HeaderField::Contractor,
    HeaderField::AcquisitionYear,
];

/// Confidence below which a field earns a follow-up prompt.
const LOW_CONFIDENCE: f64 = 0.5;

/// Prompt description for one field, plus its acceptance check.
pub struct FieldSpec {
    pub field: HeaderField,
    pub description: &'static str,
    pub validator: Option<fn(&FieldValue) -> bool>,
}

fn validate_year(v: &FieldValue) -> bool {
    match v.as_f64() {
        Some(y) => (1900.0..=2099.0).contains(&y) && y.fract() == 0.0,
        None => false,
    }
}

fn validate_geometry(v: &FieldValue) -> bool {
    let FieldValue::Text(s) = v else { return false };
    let up = s.to_uppercase();
    let has_dim = up.split_whitespace().any(|w| w == "2D" || w == "3D");
    let has_env = ["TOWED STREAMER", "OBN", "OBC", "LAND"]
        .iter()
        .any(|a| up.contains(a));
    has_dim && has_env
}

fn validate_source(v: &FieldValue) -> bool {
    let FieldValue::Text(s) = v else { return false };
    let up = s.to_uppercase().replace("  ", " ");
    ["AIR GUN", "AIRGUN", "VIBROSEIS", "DYNAMITE"]
        .iter()
        .any(|a| up.contains(a))
}

fn validate_receiver(v: &FieldValue) -> bool {
    let FieldValue::Text(s) = v else { return false };
    let up = s.to_uppercase();
    ["STREAMER", "GEOPHONE", "HYDROPHONE", "NODE"]
        .iter()
        .any(|a| up.trim() == *a || up.contains(a))
}

/// Fields the provider is asked for, with prompt descriptions.
pub const FIELD_SPECS: &[FieldSpec] = &[
    FieldSpec {
        field: HeaderField::SurveyName,
        description: "Survey / project name (as stated).",
        validator: None,
    },
    FieldSpec {
        field: HeaderField::Area,
        description: "Geographic area / basin / line descriptor.",
        validator: None,
    },
    FieldSpec {
        field: HeaderField::Contractor,
        description: "Acquisition contractor company.",
        validator: None,
    },
    FieldSpec {
        field: HeaderField::Company,
        description: "Data owner / client company.",
        validator: None,
    },
    FieldSpec {
        field: HeaderField::AcquisitionYear,
        description: "Acquisition/recorded year YYYY.",
        validator: Some(validate_year),
    },
    FieldSpec {
        field: HeaderField::SampleIntervalMs,
        description: "Sample interval (ms).",
        validator: None,
    },
    FieldSpec {
        field: HeaderField::RecordLengthMs,
        description: "Record length (ms).",
        validator: None,
    },
    FieldSpec {
        field: HeaderField::InlineSpacingM,
        description: "Inline spacing (m).",
        validator: None,
    },
    FieldSpec {
        field: HeaderField::CrosslineSpacingM,
        description: "Crossline spacing (m).",
        validator: None,
    },
    FieldSpec {
        field: HeaderField::BinSizeM,
        description: "Nominal bin size (m).",
        validator: None,
    },
    FieldSpec {
        field: HeaderField::Geometry,
        description: "2D/3D + environment (TOWED STREAMER | OBN | OBC | LAND).",
        validator: Some(validate_geometry),
    },
    FieldSpec {
        field: HeaderField::SourceType,
        description: "Source type (AIR GUN/AIRGUN, VIBROSEIS, DYNAMITE).",
        validator: Some(validate_source),
    },
    FieldSpec {
        field: HeaderField::ReceiverType,
        description: "Receiver type (STREAMER, GEOPHONE, HYDROPHONE, NODE).",
        validator: Some(validate_receiver),
    },
    FieldSpec {
        field: HeaderField::Datum,
        description: "Coordinate / vertical datum.",
        validator: None,
    },
    FieldSpec {
        field: HeaderField::SrdM,
        description: "Seismic reference datum elevation (m).",
        validator: None,
    },
    FieldSpec {
        field: HeaderField::CrsHint,
        description: "CRS hint (e.g., EPSG:XXXX, UTM zone).",
        validator: None,
    },
    FieldSpec {
        field: HeaderField::Vessel,
        description: "Survey vessel name (MV / R/V ...).",
        validator: None,
    },
];

fn spec_for(field: HeaderField) -> Option<&'static FieldSpec> {
    FIELD_SPECS.iter().find(|s| s.field == field)
}

/// Number header lines `C01..C40`, truncated to 80 chars each.
fn format_lines(lines: &[String]) -> String {
    lines
        .iter()
        .take(MAX_PROMPT_LINES)
        .enumerate()
        .map(|(i, line)| {
            let clipped: String = line.chars().take(MAX_LINE_CHARS).collect();
            format!("C{:02} {}", i + 1, clipped.trim_end())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One-shot prompt asking for every field at once.
pub fn build_multi_field_prompt(lines: &[String]) -> String {
    let spec_block = FIELD_SPECS
        .iter()
        .map(|s| format!("- {}: {}", s.field, s.description))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "You are an expert geophysical metadata parser. Extract as many fields as confidently present from a survey textual header.\n\
         Return STRICT JSON ONLY: top-level object where each key is a field name and value is {{ 'value': <primitive>, 'confidence': <0..1>, 'line_refs': [<1-based ints>] }}.\n\
         Omit unknown fields (do NOT include them with empty values). Never invent.\n\
         Field descriptions:\n{spec_block}\n\
         Rules: Provide at least one line_ref per field (1..40). Year must be 1900-2099. Units: ms or m where applicable. No markdown fences.\n\
         Header lines (C01..C40):\n{}\n",
        format_lines(lines)
    )
}

/// Single-field follow-up prompt.
pub fn build_followup_prompt(field: HeaderField, lines: &[String]) -> Option<String> {
    let spec = spec_for(field)?;
    Some(format!(
        "Extract ONLY field '{}'. Description: {}.\n\
         Return STRICT JSON {{\"value\": <primitive or empty>, \"confidence\": <0..1>, \"line_refs\": [<ints>] }}.\n\
         If unknown return {{\"value\": \"\", \"confidence\": 0, \"line_refs\": []}}.\n\
         Header lines:\n{}",
        field,
        spec.description,
        format_lines(lines)
    ))
}

/// Parse JSON out of possibly-messy model text: direct parse, then
/// first-brace..last-brace recovery.
fn best_effort_json(text: &str) -> Option<Value> {
    if let Ok(v) = serde_json::from_str(text) {
        return Some(v);
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

fn json_to_value(raw: &Value) -> Option<FieldValue> {
    match raw {
        Value::String(s) => Some(FieldValue::Text(s.clone())),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(FieldValue::Int(i))
            } else {
                n.as_f64().map(FieldValue::Float)
            }
        }
        Value::Bool(b) => Some(FieldValue::Text(b.to_string())),
        _ => None,
    }
}

/// Coerce one raw reply entry into evidence, or reject it.
///
/// Rejections: non-object entries, no in-range line refs, failed
/// validators, and numeric fields whose values don't coerce.
pub fn coerce_field(field: HeaderField, raw: &Value) -> Option<Evidence> {
    let obj = raw.as_object()?;

    let value = json_to_value(obj.get("value")?)?;
    let confidence = obj
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(0.0);

    let mut line_refs: Vec<u32> = obj
        .get("line_refs")
        .and_then(Value::as_array)
        .map(|refs| {
            refs.iter()
                .filter_map(Value::as_i64)
                .filter(|r| (1..=MAX_PROMPT_LINES as i64).contains(r))
                .map(|r| r as u32)
                .collect()
        })
        .unwrap_or_default();
    line_refs.sort_unstable();
    line_refs.dedup();
    if line_refs.is_empty() {
        return None;
    }

    if let Some(spec) = spec_for(field) {
        if let Some(validator) = spec.validator {
            if !validator(&value) {
                return None;
            }
        }
    }

    let value = if field.is_numeric() {
        FieldValue::Float(value.as_f64()?)
    } else if field == HeaderField::AcquisitionYear {
        FieldValue::Int(value.as_f64()? as i64)
    } else {
        value
    };

    Some(Evidence {
        value,
        confidence: clamp01(confidence),
        line_refs,
        raw_spans: None,
    })
}

/// Parse a multi-field reply into a field map.
///
/// Tolerates surrounding prose (brace recovery), the legacy
/// `{"header": {...}}` nesting, and unknown keys (dropped).
pub fn parse_inference_reply(text: &str) -> FieldMap {
    let Some(raw) = best_effort_json(text) else {
        return FieldMap::new();
    };
    let Some(mut obj) = raw.as_object().cloned() else {
        return FieldMap::new();
    };
    // unwrap legacy nested object
    if let Some(header) = obj.get("header").and_then(Value::as_object) {
        obj = header.clone();
    }

    let mut out = FieldMap::new();
    for (key, entry) in &obj {
        let Some(field) = HeaderField::parse(key) else {
            continue;
        };
        if let Some(ev) = coerce_field(field, entry) {
            out.insert(field, ev);
        }
    }
    out
}

/// Fields that deserve a follow-up query after the one-shot pass.
fn followup_targets(fields: &FieldMap) -> Vec<HeaderField> {
    let mut targets: Vec<HeaderField> = fields
        .iter()
        .filter(|(_, ev)| ev.confidence < LOW_CONFIDENCE)
        .map(|(f, _)| *f)
        .collect();
    for field in IMPORTANT_FIELDS {
        if !fields.contains_key(&field) {
            targets.push(field);
        }
    }
    targets.sort_unstable();
    targets.dedup();
    targets
}

/// Run the full inference flow against a provider.
///
/// One-shot extraction, then concurrent follow-ups for missing
/// important or low-confidence fields. A follow-up result only
/// replaces an existing field when its confidence is strictly higher.
/// Provider failure at any point yields what was gathered so far (or
/// an empty map), never an error.
#[instrument(skip_all, fields(provider = provider.name(), lines = lines.len()))]
pub async fn infer_header(provider: &dyn InferenceProvider, lines: &[String]) -> FieldMap {
    let prompt = build_multi_field_prompt(lines);
    let reply = match provider.infer(&prompt).await {
        Ok(text) => text,
        Err(err) => {
            warn!(error = %err, "inference provider failed; treating as no evidence");
            return FieldMap::new();
        }
    };

    let mut fields = parse_inference_reply(&reply);
    let targets = followup_targets(&fields);
    if targets.is_empty() {
        return fields;
    }
    debug!(?targets, "issuing follow-up queries");

    let tasks = targets.iter().map(|&field| async move {
        let prompt = build_followup_prompt(field, lines)?;
        let reply = provider.infer(&prompt).await.ok()?;
        let parsed = parse_inference_reply(&format!(
            "{{\"{}\": {}}}",
            field,
            best_effort_json(&reply).unwrap_or(Value::Null)
        ));
        parsed.get(&field).cloned().map(|ev| (field, ev))
    });

    for result in join_all(tasks).await.into_iter().flatten() {
        let (field, ev) = result;
        let better = fields
            .get(&field)
            .map_or(true, |existing| ev.confidence > existing.confidence);
        if better {
            fields.insert(field, ev);
        }
    }

    fields
}
