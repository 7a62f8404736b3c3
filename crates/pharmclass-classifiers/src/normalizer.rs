//! Response normalization
//!
//! Turns the loosely-typed mapping returned by the model into a well-formed
//! [`ClassificationResult`]. Every field has an explicit coercion rule and no
//! input is rejected: missing or malformed values fall back to defaults and
//! the review flags downstream carry the uncertainty.

use pharmclass_core::{ClassificationResult, ProductRecord, RawResponse};
use serde_json::Value;

/// Boundary keys of the model's JSON answer
pub mod keys {
    pub const CONFIDENCE: &str = "confidence";
    pub const NEEDS_REVIEW_HINT: &str = "needs_review_hint";
    pub const REASON: &str = "reason";
    pub const CATEGORY_CODE: &str = "category_code";
    pub const CATEGORY_PATH: &str = "category_path";
    pub const INN: &str = "inn";
    pub const DOSAGE_FORM: &str = "dosage_form";
    pub const AGE_RESTRICTION: &str = "age_restriction";
    pub const OTC: &str = "otc";
}

/// Build a classification result from a raw model response.
///
/// - `confidence`: numbers or numeric strings, clamped to [0, 1]; anything else is 0
/// - `needs_review_hint`: only a JSON `true` counts
/// - `reason`: strings only, otherwise empty
/// - descriptive fields: strings (numbers are rendered), blank means absent
/// - `otc`: booleans only
pub fn normalize_response(raw: &RawResponse, record: &ProductRecord) -> ClassificationResult {
    ClassificationResult {
        sku_name: record.name.clone(),
        category_code: text_field(raw, keys::CATEGORY_CODE),
        category_path: text_field(raw, keys::CATEGORY_PATH),
        active_ingredient: text_field(raw, keys::INN),
        dosage_form: text_field(raw, keys::DOSAGE_FORM),
        age_restriction: text_field(raw, keys::AGE_RESTRICTION),
        is_over_the_counter: raw.get(keys::OTC).and_then(Value::as_bool),
        confidence: normalize_confidence(raw.get(keys::CONFIDENCE)),
        needs_review: matches!(raw.get(keys::NEEDS_REVIEW_HINT), Some(Value::Bool(true))),
        reason: raw
            .get(keys::REASON)
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
        raw_response: raw.clone(),
    }
}

/// Coerce a confidence value into [0.0, 1.0]
pub fn normalize_confidence(value: Option<&Value>) -> f32 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(c) if c.is_finite() => c.clamp(0.0, 1.0) as f32,
        _ => 0.0,
    }
}

fn text_field(raw: &RawResponse, key: &str) -> Option<String> {
    let text = match raw.get(key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
