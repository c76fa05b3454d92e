//! Inference flow tests with a mock provider
//!
//! One-shot extraction, follow-up targeting, and the
//! strictly-higher-confidence merge rule.

use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;

use segiq::adapters::InferenceProvider;
use segiq::evidence::{FieldValue, HeaderField};
use segiq::infer::infer_header;

/// Replays canned replies and records every prompt it sees.
struct MockProvider {
    oneshot_reply: String,
    followup_reply: String,
    prompts: Mutex<Vec<String>>,
}

impl MockProvider {
    fn new(oneshot: &str, followup: &str) -> Self {
        Self {
            oneshot_reply: oneshot.to_string(),
            followup_reply: followup.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn followup_count(&self) -> usize {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.starts_with("Extract ONLY field"))
            .count()
    }
}

#[async_trait]
impl InferenceProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn infer(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if prompt.starts_with("Extract ONLY field") {
            Ok(self.followup_reply.clone())
        } else {
            Ok(self.oneshot_reply.clone())
        }
    }
}

/// Always fails, like a provider with bad credentials.
struct BrokenProvider;

#[async_trait]
impl InferenceProvider for BrokenProvider {
    fn name(&self) -> &str {
        "broken"
    }

    async fn infer(&self, _prompt: &str) -> Result<String> {
        bail!("connection refused")
    }
}

fn header_lines() -> Vec<String> {
    vec![
        "C01 SURVEY: VG-3D-EXT".to_string(),
        "C02 AREA: VIKING GRABEN".to_string(),
    ]
}

#[tokio::test]
async fn one_shot_fields_are_parsed() {
    let provider = MockProvider::new(
        r#"{
            "survey_name": {"value": "VG-3D-EXT", "confidence": 0.9, "line_refs": [1]},
            "contractor": {"value": "SEISMIC PARTNERS", "confidence": 0.8, "line_refs": [2]},
            "acquisition_year": {"value": 1998, "confidence": 0.7, "line_refs": [1]}
        }"#,
        r#"{"value": "", "confidence": 0, "line_refs": []}"#,
    );

    let fields = infer_header(&provider, &header_lines()).await;

    assert_eq!(
        fields[&HeaderField::SurveyName].value,
        FieldValue::Text("VG-3D-EXT".into())
    );
    assert_eq!(
        fields[&HeaderField::AcquisitionYear].value,
        FieldValue::Int(1998)
    );
    // all important fields confident and present: no follow-ups
    assert_eq!(provider.followup_count(), 0);
}

#[tokio::test]
async fn followups_fill_missing_important_fields() {
    // one-shot misses contractor and acquisition_year entirely
    let provider = MockProvider::new(
        r#"{"survey_name": {"value": "VG-3D-EXT", "confidence": 0.9, "line_refs": [1]}}"#,
        r#"{"value": "SEISMIC PARTNERS", "confidence": 0.8, "line_refs": [2]}"#,
    );

    let fields = infer_header(&provider, &header_lines()).await;

    // two missing important fields queried concurrently
    assert_eq!(provider.followup_count(), 2);
    assert_eq!(
        fields[&HeaderField::Contractor].value,
        FieldValue::Text("SEISMIC PARTNERS".into())
    );
    // acquisition_year follow-up failed its validator (text, not a year)
    assert!(!fields.contains_key(&HeaderField::AcquisitionYear));
}

#[tokio::test]
async fn followup_only_overwrites_on_strictly_higher_confidence() {
    // survey_name is low-confidence, follow-up answers with the SAME
    // confidence, so the original value must survive
    let provider = MockProvider::new(
        r#"{
            "survey_name": {"value": "ORIGINAL", "confidence": 0.4, "line_refs": [1]},
            "contractor": {"value": "ACME", "confidence": 0.8, "line_refs": [2]},
            "acquisition_year": {"value": 1998, "confidence": 0.9, "line_refs": [1]}
        }"#,
        r#"{"value": "REPLACEMENT", "confidence": 0.4, "line_refs": [1]}"#,
    );

    let fields = infer_header(&provider, &header_lines()).await;

    assert_eq!(provider.followup_count(), 1);
    assert_eq!(
        fields[&HeaderField::SurveyName].value,
        FieldValue::Text("ORIGINAL".into())
    );
}

#[tokio::test]
async fn followup_with_higher_confidence_replaces() {
    let provider = MockProvider::new(
        r#"{
            "survey_name": {"value": "ORIGINAL", "confidence": 0.4, "line_refs": [1]},
            "contractor": {"value": "ACME", "confidence": 0.8, "line_refs": [2]},
            "acquisition_year": {"value": 1998, "confidence": 0.9, "line_refs": [1]}
        }"#,
        r#"{"value": "REPLACEMENT", "confidence": 0.85, "line_refs": [1]}"#,
    );

    let fields = infer_header(&provider, &header_lines()).await;

    assert_eq!(
        fields[&HeaderField::SurveyName].value,
        FieldValue::Text("REPLACEMENT".into())
    );
    assert_eq!(fields[&HeaderField::SurveyName].confidence, 0.85);
}

#[tokio::test]
async fn provider_failure_yields_empty_map() {
    let fields = infer_header(&BrokenProvider, &header_lines()).await;
    assert!(fields.is_empty());
}

#[tokio::test]
async fn prose_wrapped_reply_still_parses() {
    let provider = MockProvider::new(
        "Here you go:\n{\"area\": {\"value\": \"VIKING GRABEN\", \"confidence\": 0.8, \"line_refs\": [2]}}\nHope that helps!",
        r#"{"value": "", "confidence": 0, "line_refs": []}"#,
    );

    let fields = infer_header(&provider, &header_lines()).await;
    assert_eq!(
        fields[&HeaderField::Area].value,
        FieldValue::Text("VIKING GRABEN".into())
    );
}
