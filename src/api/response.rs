//! Decoding of text.ru JSON response bodies.
//!
//! The service is loose about types: numbers sometimes arrive as strings,
//! identifiers as numbers, and `seo_check` is a JSON document encoded inside
//! a JSON string. Everything here works on `serde_json::Value` so those
//! shapes can be coerced explicitly.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::error::{ApiError, TransportError, UNKNOWN_ERROR_DESCRIPTION};
use super::result::CheckResult;

type JsonObject = Map<String, Value>;

/// Parses a raw check-result body into a [`CheckResult`].
///
/// This performs no network access, so it can be used on bodies delivered to
/// a result callback URL. When `text_id` is `None` the response's own `uid`
/// is used.
///
/// # Errors
///
/// Returns [`ApiError::Remote`] when the body is an error envelope and
/// [`ApiError::Transport`] when the body is not a well-formed result.
pub fn parse_check_result(body: &str, text_id: Option<&str>) -> Result<CheckResult, ApiError> {
    let object = parse_object(body)?;
    ensure_no_remote_error(&object)?;

    let water_percent = water_percent(&object)?;
    let unique_percent = required_f64(&object, "text_unique")?;
    let text_id = match text_id {
        Some(id) => id.to_string(),
        None => required_string(&object, "uid")?,
    };

    debug!(text_id = %text_id, unique_percent, water_percent, "Parsed check result");
    Ok(CheckResult::new(text_id, unique_percent, water_percent))
}

/// Decodes a body that must be a JSON object.
pub(crate) fn parse_object(body: &str) -> Result<JsonObject, ApiError> {
    match serde_json::from_str::<Value>(body).map_err(TransportError::from)? {
        Value::Object(object) => Ok(object),
        other => Err(TransportError::malformed(
            "body",
            format!("expected a JSON object, got {}", json_kind(&other)),
        )
        .into()),
    }
}

/// Fails with [`ApiError::Remote`] when the object carries a non-null
/// `error_code`.
pub(crate) fn ensure_no_remote_error(object: &JsonObject) -> Result<(), ApiError> {
    let Some(raw_code) = present(object, "error_code") else {
        return Ok(());
    };
    let code = coerce_i64("error_code", raw_code)?;
    let description = match object.get("error_desc") {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        _ => UNKNOWN_ERROR_DESCRIPTION.to_string(),
    };
    warn!(code, description = %description, "text.ru returned an error envelope");
    Err(ApiError::remote(code, description))
}

/// Reads a required field that may be a string or a number as a string.
pub(crate) fn required_string(
    object: &JsonObject,
    field: &'static str,
) -> Result<String, ApiError> {
    match present(object, field) {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(Value::Number(number)) => Ok(number.to_string()),
        Some(other) => Err(TransportError::malformed(
            field,
            format!("expected a string, got {}", json_kind(other)),
        )
        .into()),
        None => Err(missing(field)),
    }
}

pub(crate) fn required_f64(object: &JsonObject, field: &'static str) -> Result<f64, ApiError> {
    present(object, field).map_or_else(|| Err(missing(field)), |value| coerce_f64(field, value))
}

pub(crate) fn required_i64(object: &JsonObject, field: &'static str) -> Result<i64, ApiError> {
    present(object, field).map_or_else(|| Err(missing(field)), |value| coerce_i64(field, value))
}

/// Extracts `water_percent` from the double-encoded `seo_check` field.
///
/// A missing, blank or empty `seo_check`, one that decodes to anything other
/// than an object, or one without `water_percent`, yields `0`. Only text that
/// is not JSON at all is rejected.
fn water_percent(object: &JsonObject) -> Result<f64, ApiError> {
    let seo_check = match present(object, "seo_check") {
        None | Some(Value::Array(_)) => return Ok(0.0),
        Some(Value::String(encoded)) if encoded.trim().is_empty() => return Ok(0.0),
        Some(Value::String(encoded)) => match serde_json::from_str::<Value>(encoded) {
            Ok(Value::Object(inner)) => inner,
            // An empty report is encoded as `[]`.
            Ok(_) => return Ok(0.0),
            Err(error) => {
                return Err(TransportError::malformed(
                    "seo_check",
                    format!("embedded JSON does not decode: {error}"),
                )
                .into());
            }
        },
        Some(Value::Object(inner)) => inner.clone(),
        Some(other) => {
            return Err(TransportError::malformed(
                "seo_check",
                format!("expected a JSON string, got {}", json_kind(other)),
            )
            .into());
        }
    };

    present(&seo_check, "water_percent")
        .map_or(Ok(0.0), |value| coerce_f64("water_percent", value))
}

fn present<'a>(object: &'a JsonObject, field: &str) -> Option<&'a Value> {
    object.get(field).filter(|value| !value.is_null())
}

fn missing(field: &'static str) -> ApiError {
    TransportError::malformed(field, "field is missing").into()
}

fn coerce_f64(field: &'static str, value: &Value) -> Result<f64, ApiError> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|number| number.is_finite()).ok_or_else(|| {
        TransportError::malformed(field, format!("expected a number, got {value}")).into()
    })
}

#[allow(clippy::cast_possible_truncation)]
fn coerce_i64(field: &'static str, value: &Value) -> Result<i64, ApiError> {
    let parsed = match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>().ok().or_else(|| {
                text.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })
        }
        _ => None,
    };
    parsed.ok_or_else(|| {
        TransportError::malformed(field, format!("expected an integer, got {value}")).into()
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const FULL_RESULT: &str =
        r#"{"uid":"12345","text_unique":12.5,"seo_check":"{\"water_percent\":7}"}"#;

    #[test]
    fn test_parse_uses_response_uid() {
        let result = parse_check_result(FULL_RESULT, None).unwrap();
        assert_eq!(result, CheckResult::new("12345", 12.5, 7.0));
    }

    #[test]
    fn test_parse_explicit_id_when_uid_absent() {
        let body = r#"{"text_unique":12.5,"seo_check":"{\"water_percent\":7}"}"#;
        let result = parse_check_result(body, Some("12345")).unwrap();
        assert_eq!(result, CheckResult::new("12345", 12.5, 7.0));
    }

    #[test]
    fn test_parse_explicit_id_overrides_response_uid() {
        let result = parse_check_result(FULL_RESULT, Some("999")).unwrap();
        assert_eq!(result.text_id(), "999");
    }

    #[test]
    fn test_parse_is_repeatable() {
        let first = parse_check_result(FULL_RESULT, None).unwrap();
        let second = parse_check_result(FULL_RESULT, None).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_numeric_uid() {
        let body = r#"{"uid": 12345,"text_unique":12.5, "seo_check": "{\"water_percent\": 7}"}"#;
        let result = parse_check_result(body, None).unwrap();
        assert_eq!(result.text_id(), "12345");
    }

    #[test]
    fn test_parse_string_percentages_are_coerced() {
        let body = r#"{"uid":"a1","text_unique":"96.55","seo_check":"{\"water_percent\":\"14\"}"}"#;
        let result = parse_check_result(body, None).unwrap();
        assert!((result.unique_percent() - 96.55).abs() < 1e-9);
        assert!((result.water_percent() - 14.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_missing_seo_check_defaults_water_to_zero() {
        let result = parse_check_result(r#"{"uid":"1","text_unique":100}"#, None).unwrap();
        assert!(result.water_percent().abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_seo_check_without_water_defaults_to_zero() {
        let body = r#"{"uid":"1","text_unique":100,"seo_check":"{\"count_words\":42}"}"#;
        let result = parse_check_result(body, None).unwrap();
        assert!(result.water_percent().abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_null_seo_check_defaults_water_to_zero() {
        let body = r#"{"uid":"1","text_unique":100,"seo_check":null}"#;
        let result = parse_check_result(body, None).unwrap();
        assert!(result.water_percent().abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_empty_seo_check_string_defaults_water_to_zero() {
        for encoded in ["", "   "] {
            let body = format!(r#"{{"uid":"1","text_unique":50,"seo_check":"{encoded}"}}"#);
            let result = parse_check_result(&body, None).unwrap();
            assert!((result.unique_percent() - 50.0).abs() < f64::EPSILON);
            assert!(result.water_percent().abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_parse_empty_array_seo_check_defaults_water_to_zero() {
        let body = r#"{"uid":"1","text_unique":50,"seo_check":"[]"}"#;
        let result = parse_check_result(body, None).unwrap();
        assert_eq!(result, CheckResult::new("1", 50.0, 0.0));

        let body = r#"{"uid":"1","text_unique":50,"seo_check":[]}"#;
        let result = parse_check_result(body, None).unwrap();
        assert!(result.water_percent().abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_non_object_seo_check_defaults_water_to_zero() {
        for encoded in ["[1,2]", "42", "true", r#"\"text\""#] {
            let body = format!(r#"{{"uid":"1","text_unique":50,"seo_check":"{encoded}"}}"#);
            let result = parse_check_result(&body, None).unwrap();
            assert!(
                result.water_percent().abs() < f64::EPSILON,
                "seo_check = {encoded}"
            );
        }
    }

    #[test]
    fn test_parse_non_string_scalar_seo_check_is_malformed() {
        let body = r#"{"uid":"1","text_unique":50,"seo_check":7}"#;
        let err = parse_check_result(body, None).unwrap_err();
        assert!(matches!(
            err,
            ApiError::Transport(TransportError::MalformedResponse { field: "seo_check", .. })
        ));
    }

    #[test]
    fn test_parse_already_decoded_seo_check_object() {
        let body = r#"{"uid":"1","text_unique":50,"seo_check":{"water_percent":3.5}}"#;
        let result = parse_check_result(body, None).unwrap();
        assert!((result.water_percent() - 3.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_undecodable_seo_check_is_malformed() {
        let body = r#"{"uid":"1","text_unique":50,"seo_check":"{not json"}"#;
        let err = parse_check_result(body, None).unwrap_err();
        assert!(matches!(
            err,
            ApiError::Transport(TransportError::MalformedResponse { field: "seo_check", .. })
        ));
    }

    #[test]
    fn test_parse_remote_error_envelope() {
        let err = parse_check_result(r#"{"error_code":101,"error_desc":"Bad key"}"#, None)
            .unwrap_err();
        assert!(err.is_remote());
        assert_eq!(err.code(), 101);
        assert_eq!(err.description(), "Bad key");
    }

    #[test]
    fn test_parse_remote_error_without_description() {
        let err = parse_check_result(r#"{"error_code":181}"#, Some("1")).unwrap_err();
        assert_eq!(err.code(), 181);
        assert_eq!(err.description(), "_unknown_");
    }

    #[test]
    fn test_null_error_code_is_not_an_error() {
        let body = r#"{"error_code":null,"uid":"1","text_unique":10}"#;
        assert!(parse_check_result(body, None).is_ok());
    }

    #[test]
    fn test_string_error_code_is_coerced() {
        let err = parse_check_result(r#"{"error_code":"142","error_desc":"x"}"#, None).unwrap_err();
        assert_eq!(err.code(), 142);
    }

    #[test]
    fn test_parse_missing_uid_without_explicit_id() {
        let err = parse_check_result(r#"{"text_unique":10}"#, None).unwrap_err();
        assert!(matches!(
            err,
            ApiError::Transport(TransportError::MalformedResponse { field: "uid", .. })
        ));
    }

    #[test]
    fn test_parse_missing_text_unique() {
        let err = parse_check_result(r#"{"uid":"1"}"#, None).unwrap_err();
        assert!(err.to_string().contains("text_unique"));
    }

    #[test]
    fn test_parse_non_json_body() {
        let err = parse_check_result("<html>502 Bad Gateway</html>", None).unwrap_err();
        assert!(matches!(err, ApiError::Transport(TransportError::Json { .. })));
    }

    #[test]
    fn test_parse_non_object_body() {
        let err = parse_check_result("[1,2,3]", None).unwrap_err();
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn test_required_i64_truncates_floats_and_parses_strings() {
        let object = parse_object(r#"{"a":115.9,"b":"42","c":true}"#).unwrap();
        assert_eq!(required_i64(&object, "a").unwrap(), 115);
        assert_eq!(required_i64(&object, "b").unwrap(), 42);
        assert!(required_i64(&object, "c").is_err());
        assert!(required_i64(&object, "d").is_err());
    }
}
