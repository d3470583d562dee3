use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BodyError {
    #[error("request body is not JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("request body must be a JSON object")]
    NotAnObject,
}

/// Descriptive fields a caller may attach to `POST /sfx`. They are logged
/// and never change what plays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayMetadata {
    pub name: String,
    pub id: i64,
    pub message: String,
    pub timestamp: String,
}

impl PlayMetadata {
    /// An empty body is fine; anything else must be a JSON object (or `null`).
    pub fn from_body(body: &[u8]) -> Result<Self, BodyError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        match serde_json::from_slice::<Value>(body)? {
            Value::Object(fields) => Ok(Self::from_fields(&fields)),
            Value::Null => Ok(Self::default()),
            _ => Err(BodyError::NotAnObject),
        }
    }

    fn from_fields(fields: &Map<String, Value>) -> Self {
        Self {
            name: string_field(fields, "name"),
            id: fields.get("id").map(parse_id).unwrap_or(0),
            message: string_field(fields, "message"),
            timestamp: string_field(fields, "timestamp"),
        }
    }
}

fn string_field(fields: &Map<String, Value>, key: &str) -> String {
    fields
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Integers as-is, floats truncated, numeric strings parsed. Anything else is 0.
fn parse_id(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => match s.trim().parse::<i64>() {
            Ok(id) => id,
            Err(err) => {
                tracing::warn!(
                    id = %s,
                    event_type = "play_sound",
                    error = %err,
                    "Invalid ID format"
                );
                0
            }
        },
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_body() {
        assert_eq!(PlayMetadata::from_body(b"").unwrap(), PlayMetadata::default());
        assert_eq!(PlayMetadata::from_body(b" \n").unwrap(), PlayMetadata::default());
        assert_eq!(PlayMetadata::from_body(b"null").unwrap(), PlayMetadata::default());
    }

    #[test]
    fn test_full_body() {
        let body = br#"{"name":"ci","id":42,"message":"deploy done","timestamp":"2026-10-18T10:00:00Z"}"#;
        let meta = PlayMetadata::from_body(body).unwrap();
        assert_eq!(meta.name, "ci");
        assert_eq!(meta.id, 42);
        assert_eq!(meta.message, "deploy done");
        assert_eq!(meta.timestamp, "2026-10-18T10:00:00Z");
    }

    #[test]
    fn test_id_variants() {
        let id = |body: &str| PlayMetadata::from_body(body.as_bytes()).unwrap().id;
        assert_eq!(id(r#"{"id": 7}"#), 7);
        assert_eq!(id(r#"{"id": 7.9}"#), 7);
        assert_eq!(id(r#"{"id": -2.5}"#), -2);
        assert_eq!(id(r#"{"id": "12"}"#), 12);
        assert_eq!(id(r#"{"id": "twelve"}"#), 0);
        assert_eq!(id(r#"{"id": true}"#), 0);
        assert_eq!(id(r#"{}"#), 0);
    }

    #[test]
    fn test_wrong_typed_fields_are_ignored() {
        let meta =
            PlayMetadata::from_body(br#"{"name": 5, "message": ["a"], "extra": 1}"#).unwrap();
        assert_eq!(meta.name, "");
        assert_eq!(meta.message, "");
    }

    #[test]
    fn test_malformed_body() {
        assert!(matches!(PlayMetadata::from_body(b"not-json"), Err(BodyError::Json(_))));
        assert!(matches!(PlayMetadata::from_body(b"{\"name\":"), Err(BodyError::Json(_))));
        assert!(matches!(PlayMetadata::from_body(b"[1, 2]"), Err(BodyError::NotAnObject)));
        assert!(matches!(PlayMetadata::from_body(b"\"boop\""), Err(BodyError::NotAnObject)));
    }
}
