//! Schema validation of language model responses

use poclass_core::{Taxonomy, Triple};
use serde_json::{Map, Value};

/// Keys a response must contain, and the only keys it may contain
pub const REQUIRED_KEYS: [&str; 6] = ["po_description", "L1", "L2", "L3", "confidence", "reason"];

/// Why a response was rejected
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("response is not valid JSON: {0}")]
    NotJson(String),

    #[error("response is not a JSON object")]
    NotObject,

    #[error("missing required key '{0}'")]
    MissingKey(&'static str),

    #[error("unexpected key '{0}'")]
    UnexpectedKey(String),

    #[error("key '{key}' must be a {expected}")]
    WrongType {
        key: &'static str,
        expected: &'static str,
    },

    #[error("confidence {0} is outside [0, 1]")]
    ConfidenceOutOfRange(f64),

    #[error("category {0} is not in the taxonomy")]
    UnknownCategory(Triple),
}

/// A response that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedResponse {
    pub po_description: String,
    pub triple: Triple,
    pub confidence: f64,
    pub reason: String,
}

/// Validate a raw model response against the output schema and the taxonomy
///
/// A triple is accepted when it contains "Not sure" at any level or is a
/// member of the taxonomy.
pub fn validate_response(raw: &str, taxonomy: &Taxonomy) -> Result<ValidatedResponse, ValidationError> {
    let value: Value =
        serde_json::from_str(raw.trim()).map_err(|e| ValidationError::NotJson(e.to_string()))?;
    let object = value.as_object().ok_or(ValidationError::NotObject)?;

    for key in REQUIRED_KEYS {
        if !object.contains_key(key) {
            return Err(ValidationError::MissingKey(key));
        }
    }
    if let Some(extra) = object.keys().find(|k| !REQUIRED_KEYS.contains(&k.as_str())) {
        return Err(ValidationError::UnexpectedKey(extra.clone()));
    }

    let confidence = object["confidence"]
        .as_f64()
        .ok_or(ValidationError::WrongType {
            key: "confidence",
            expected: "number",
        })?;
    if !(0.0..=1.0).contains(&confidence) {
        return Err(ValidationError::ConfidenceOutOfRange(confidence));
    }

    let triple = Triple::new(
        string_field(object, "L1")?,
        string_field(object, "L2")?,
        string_field(object, "L3")?,
    );
    if !triple.contains_not_sure() && !taxonomy.contains(&triple) {
        return Err(ValidationError::UnknownCategory(triple));
    }

    Ok(ValidatedResponse {
        po_description: string_field(object, "po_description")?,
        triple,
        confidence,
        reason: string_field(object, "reason")?,
    })
}

fn string_field(object: &Map<String, Value>, key: &'static str) -> Result<String, ValidationError> {
    object[key]
        .as_str()
        .map(str::to_string)
        .ok_or(ValidationError::WrongType {
            key,
            expected: "string",
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn taxonomy() -> Taxonomy {
        Taxonomy::new(
            "test",
            vec![
                Triple::new("IT", "Software", "Subscription"),
                Triple::new("IT", "Hardware", "Laptop"),
            ],
        )
        .unwrap()
    }

    fn response() -> Value {
        json!({
            "po_description": "DocuSign eSignature subscription",
            "L1": "IT",
            "L2": "Software",
            "L3": "Subscription",
            "confidence": 0.95,
            "reason": "Enterprise software subscription"
        })
    }

    #[test]
    fn test_valid_response() {
        let validated = validate_response(&response().to_string(), &taxonomy()).unwrap();
        assert_eq!(validated.triple, Triple::new("IT", "Software", "Subscription"));
        assert_eq!(validated.confidence, 0.95);
        assert_eq!(validated.reason, "Enterprise software subscription");
    }

    #[test]
    fn test_surrounding_whitespace_is_tolerated() {
        let raw = format!("\n  {}  \n", response());
        assert!(validate_response(&raw, &taxonomy()).is_ok());
    }

    #[test]
    fn test_rejects_non_json() {
        let err = validate_response("IT > Software > Subscription", &taxonomy()).unwrap_err();
        assert!(matches!(err, ValidationError::NotJson(_)));

        let fenced = format!("```json\n{}\n```", response());
        assert!(matches!(
            validate_response(&fenced, &taxonomy()),
            Err(ValidationError::NotJson(_))
        ));
    }

    #[test]
    fn test_rejects_non_object() {
        let err = validate_response("[1, 2]", &taxonomy()).unwrap_err();
        assert_eq!(err, ValidationError::NotObject);
    }

    #[test]
    fn test_rejects_each_missing_key() {
        for key in REQUIRED_KEYS {
            let mut value = response();
            value.as_object_mut().unwrap().remove(key);
            let err = validate_response(&value.to_string(), &taxonomy()).unwrap_err();
            assert_eq!(err, ValidationError::MissingKey(key));
        }
    }

    #[test]
    fn test_rejects_extra_key() {
        let mut value = response();
        value["notes"] = json!("extra");
        let err = validate_response(&value.to_string(), &taxonomy()).unwrap_err();
        assert_eq!(err, ValidationError::UnexpectedKey("notes".to_string()));
    }

    #[test]
    fn test_rejects_confidence_out_of_range() {
        for bad in [1.5, -0.1] {
            let mut value = response();
            value["confidence"] = json!(bad);
            let err = validate_response(&value.to_string(), &taxonomy()).unwrap_err();
            assert_eq!(err, ValidationError::ConfidenceOutOfRange(bad));
        }

        let mut value = response();
        value["confidence"] = json!("high");
        let err = validate_response(&value.to_string(), &taxonomy()).unwrap_err();
        assert!(matches!(err, ValidationError::WrongType { key: "confidence", .. }));
    }

    #[test]
    fn test_confidence_bounds_are_inclusive() {
        for ok in [0, 1] {
            let mut value = response();
            value["confidence"] = json!(ok);
            assert!(validate_response(&value.to_string(), &taxonomy()).is_ok());
        }
    }

    #[test]
    fn test_rejects_unknown_triple() {
        let mut value = response();
        value["L3"] = json!("Printer");
        let err = validate_response(&value.to_string(), &taxonomy()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownCategory(Triple::new("IT", "Software", "Printer"))
        );
    }

    #[test]
    fn test_not_sure_anywhere_is_accepted() {
        for key in ["L1", "L2", "L3"] {
            let mut value = response();
            value["L1"] = json!("Made Up");
            value[key] = json!("Not sure");
            assert!(validate_response(&value.to_string(), &taxonomy()).is_ok());
        }
    }

    #[test]
    fn test_rejects_non_string_level() {
        let mut value = response();
        value["L2"] = json!(7);
        let err = validate_response(&value.to_string(), &taxonomy()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::WrongType {
                key: "L2",
                expected: "string"
            }
        );
    }
}
