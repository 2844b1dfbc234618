//! Reads the prediction payload returned by the remote classifier.
//!
//! The classifier's response shape is not fixed: predictions, labels and
//! confidences have all been observed under several key names, as scalars or
//! lists, and occasionally as a JSON document wrapped in a string. Every input
//! yields an [`InterpretedResult`]; malformed payloads collapse into the
//! fallback result instead of an error.

mod coerce;

use serde_json::{Map, Value};
use shared::{Finding, InterpretedResult};

use coerce::{as_mapping, as_sequence, first_present, is_truthy, to_confidence, to_label};

/// Keys that may hold the prediction list, in lookup order.
pub const PREDICTION_KEYS: &[&str] = &["predictions", "preds"];

/// Keys that may hold the class label(s) of a prediction entry, in lookup order.
pub const LABEL_KEYS: &[&str] = &[
    "displayNames",
    "displaynames",
    "display_names",
    "classes",
    "labels",
];

/// Keys that may hold the confidence score(s) of a prediction entry, in lookup order.
pub const CONFIDENCE_KEYS: &[&str] = &[
    "confidences",
    "confidence",
    "scores",
    "score",
    "probabilities",
    "probability",
];

pub const UNKNOWN_LABEL: &str = "Unknown";
pub const DISCLAIMER: &str = "This result does not constitute a medical diagnosis.";

const NEGATIVE_LABEL: &str = "nondemented";

const NEGATIVE_MESSAGE: &str = "🟢 Classification: Non-demented (nonDemented).\n\n\
    The image does not show patterns typical of Alzheimer's disease.";
const POSITIVE_MESSAGE: &str = "🔴 Classification: Demented (Demented).\n\n\
    The image shows patterns compatible with Alzheimer's disease.";

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum InterpretError {
    #[error("predictions field missing or empty")]
    MissingPredictions,
    #[error("label/confidence fields not found or equivalent")]
    MissingFields,
}

/// Interprets a classifier response, never failing.
pub fn interpret(raw: &Value) -> InterpretedResult {
    match try_interpret(raw) {
        Ok(result) => {
            log::debug!(
                "Interpreted classifier response: label={}, confidence={}",
                result.label,
                result.confidence
            );
            result
        }
        Err(e) => {
            log::warn!("Could not interpret classifier response: {}", e);
            fallback(&e)
        }
    }
}

pub fn try_interpret(raw: &Value) -> Result<InterpretedResult, InterpretError> {
    let data = as_mapping(raw);

    let predictions = PREDICTION_KEYS
        .iter()
        .filter_map(|key| data.get(*key))
        .find(|value| is_truthy(value));
    let entries = match predictions {
        Some(Value::Array(entries)) if !entries.is_empty() => entries,
        _ => return Err(InterpretError::MissingPredictions),
    };

    let empty = Map::new();
    let entry = entries[0].as_object().unwrap_or(&empty);

    let labels = as_sequence(first_present(entry, LABEL_KEYS));
    let confidences = as_sequence(first_present(entry, CONFIDENCE_KEYS));

    let (Some(label), Some(confidence)) = (labels.first(), confidences.first()) else {
        return Err(InterpretError::MissingFields);
    };

    Ok(classify(to_label(label), to_confidence(confidence)))
}

/// Builds the result for a resolved label; the negative branch is taken only
/// for a case-insensitive `nondemented`.
pub fn classify(label: String, confidence: f64) -> InterpretedResult {
    let (finding, message) = if label.to_lowercase() == NEGATIVE_LABEL {
        (Finding::Negative, NEGATIVE_MESSAGE)
    } else {
        (Finding::Positive, POSITIVE_MESSAGE)
    };

    InterpretedResult {
        label,
        confidence,
        message: message.to_string(),
        warning: None,
        finding,
    }
}

pub fn fallback(error: &InterpretError) -> InterpretedResult {
    InterpretedResult {
        label: UNKNOWN_LABEL.to_string(),
        confidence: 0.0,
        message: format!(
            "Could not interpret the model response. Detail: {}",
            error
        ),
        warning: Some(DISCLAIMER.to_string()),
        finding: Finding::Undetermined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assert_fallback(result: &InterpretedResult) {
        assert_eq!(result.label, UNKNOWN_LABEL);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.finding, Finding::Undetermined);
        assert_eq!(result.warning.as_deref(), Some(DISCLAIMER));
    }

    #[test]
    fn test_negative_finding() {
        let raw = json!({"predictions": [{"displayNames": ["nonDemented"], "confidences": [0.92]}]});
        let result = interpret(&raw);

        assert_eq!(result.label, "nonDemented");
        assert_eq!(result.confidence, 0.92);
        assert_eq!(result.message, NEGATIVE_MESSAGE);
        assert_eq!(result.finding, Finding::Negative);
        assert!(result.warning.is_none());
    }

    #[test]
    fn test_scalar_string_fields() {
        let raw = json!({"predictions": [{"classes": "Demented", "score": "0.77"}]});
        let result = interpret(&raw);

        assert_eq!(result.label, "Demented");
        assert_eq!(result.confidence, 0.77);
        assert_eq!(result.message, POSITIVE_MESSAGE);
        assert_eq!(result.finding, Finding::Positive);
    }

    #[test]
    fn test_empty_object_falls_back() {
        let result = interpret(&json!({}));
        assert_fallback(&result);
        assert!(result.message.contains("predictions field missing or empty"));
    }

    #[test]
    fn test_nested_confidence_value() {
        let raw = json!({"predictions": [{"displayNames": ["X"], "confidences": [{"value": 0.5}]}]});
        let result = interpret(&raw);
        assert_eq!(result.label, "X");
        assert_eq!(result.confidence, 0.5);
    }

    #[test]
    fn test_every_alias_pair_is_accepted() {
        for label_key in LABEL_KEYS {
            for confidence_key in CONFIDENCE_KEYS {
                let raw = json!({"predictions": [{(*label_key): ["MildDemented"], (*confidence_key): [0.61, 0.2]}]});
                let result = try_interpret(&raw).unwrap();
                assert_eq!(result.label, "MildDemented", "{label_key}/{confidence_key}");
                assert_eq!(result.confidence, 0.61, "{label_key}/{confidence_key}");
            }
        }
    }

    #[test]
    fn test_preds_alias() {
        let raw = json!({"preds": [{"labels": ["NonDemented"], "probabilities": [0.8]}]});
        assert_eq!(interpret(&raw).finding, Finding::Negative);
    }

    #[test]
    fn test_empty_predictions_defer_to_preds() {
        let raw = json!({"predictions": [], "preds": [{"labels": "A", "score": 0.3}]});
        let result = try_interpret(&raw).unwrap();
        assert_eq!(result.label, "A");
        assert_eq!(result.confidence, 0.3);
    }

    #[test]
    fn test_missing_or_malformed_predictions() {
        for raw in [
            json!({"predictions": []}),
            json!({"predictions": null}),
            json!({"predictions": "nope"}),
            json!({"predictions": {"displayNames": ["X"]}}),
            json!({"preds": 0}),
            json!({"other": [1]}),
        ] {
            assert_eq!(try_interpret(&raw), Err(InterpretError::MissingPredictions), "{raw}");
            assert_fallback(&interpret(&raw));
        }
    }

    #[test]
    fn test_missing_label_or_confidence() {
        for raw in [
            json!({"predictions": [{"displayNames": ["X"]}]}),
            json!({"predictions": [{"confidences": [0.4]}]}),
            json!({"predictions": [{"displayNames": [], "confidences": [0.4]}]}),
            json!({"predictions": [{"displayNames": null, "confidences": [0.4]}]}),
            json!({"predictions": [{"Labels": ["X"], "Scores": [0.4]}]}),
            json!({"predictions": ["not an entry"]}),
        ] {
            assert_eq!(try_interpret(&raw), Err(InterpretError::MissingFields), "{raw}");
            let result = interpret(&raw);
            assert_fallback(&result);
            assert!(result.message.contains("label/confidence fields not found"));
        }
    }

    #[test]
    fn test_first_present_alias_wins_even_if_empty() {
        // `displayNames` is present but empty, so `classes` is never consulted.
        let raw = json!({"predictions": [{"displayNames": [], "classes": ["X"], "confidences": [0.1]}]});
        assert_eq!(try_interpret(&raw), Err(InterpretError::MissingFields));
    }

    #[test]
    fn test_never_panics_on_odd_input() {
        for raw in [
            Value::Null,
            json!(12),
            json!(true),
            json!("{broken"),
            json!([{"predictions": []}]),
            json!({"predictions": [[1, 2]]}),
            json!({"predictions": [{"displayNames": [{"a": 1}], "confidences": [[0.1]]}]}),
        ] {
            let result = interpret(&raw);
            assert!(!result.label.is_empty());
            assert!(!result.message.is_empty());
        }
    }

    #[test]
    fn test_json_string_payload() {
        let raw = json!(r#"{"predictions": [{"displayNames": ["Demented"], "confidences": [0.66]}]}"#);
        let result = interpret(&raw);
        assert_eq!(result.label, "Demented");
        assert_eq!(result.confidence, 0.66);
    }

    #[test]
    fn test_case_insensitive_negative_match() {
        for label in ["NonDemented", "nondemented", "NONDEMENTED"] {
            assert_eq!(classify(label.to_string(), 0.5).finding, Finding::Negative);
        }
        for label in ["Demented", "non demented", "VeryMildDemented", ""] {
            assert_eq!(classify(label.to_string(), 0.5).finding, Finding::Positive);
        }
    }

    #[test]
    fn test_scalar_confidence_matches_list() {
        let scalar = interpret(&json!({"predictions": [{"displayNames": "A", "confidences": 0.87}]}));
        let list = interpret(&json!({"predictions": [{"displayNames": ["A"], "confidences": [0.87]}]}));
        assert_eq!(scalar, list);
    }

    #[test]
    fn test_unresolvable_confidence_defaults_to_zero() {
        let raw = json!({"predictions": [{"displayNames": ["A"], "confidences": ["high"]}]});
        let result = interpret(&raw);
        assert_eq!(result.label, "A");
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.finding, Finding::Positive);
    }

    #[test]
    fn test_only_first_entry_is_used() {
        let raw = json!({"predictions": [
            {"displayNames": ["nonDemented", "Demented"], "confidences": [0.7, 0.3]},
            {"displayNames": ["Demented"], "confidences": [0.99]}
        ]});
        let result = interpret(&raw);
        assert_eq!(result.label, "nonDemented");
        assert_eq!(result.confidence, 0.7);
    }

    #[test]
    fn test_null_and_bool_labels_render_as_text() {
        let raw = json!({"predictions": [{"labels": [null], "scores": [0.3]}]});
        let result = interpret(&raw);
        assert_eq!(result.label, "None");
        assert_eq!(result.finding, Finding::Positive);

        let raw = json!({"predictions": [{"classes": true, "score": 0.6}]});
        assert_eq!(interpret(&raw).label, "True");
    }
}
