//! Free-text JSON buffer for a single resource.
//!
//! The text is the source of truth while editing; the parsed value is the last
//! text that decoded cleanly. Every change is decoded from scratch.

use resreg_core::Resource;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid JSON: {message}")]
    Syntax { line: usize, column: usize, message: String },
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Decode editor text into a resource. Any JSON object is accepted; identity is
/// checked where it is used (opening a row, the gateway's create and update paths).
pub fn decode_resource(text: &str) -> Result<Resource, DecodeError> {
    let v: Value = serde_json::from_str(text).map_err(|e| DecodeError::Syntax {
        line: e.line(),
        column: e.column(),
        message: e.to_string(),
    })?;
    Resource::try_from(v).map_err(|v| DecodeError::NotAnObject(value_kind(&v)))
}

/// Pretty-printed form shown in the editor (2-space indent, field order kept).
pub fn encode_resource(r: &Resource) -> String {
    serde_json::to_string_pretty(r).unwrap_or_default()
}

fn value_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResourceEditorBuffer {
    raw_text: String,
    seeded_text: String,
    parsed: Option<Resource>,
    valid: bool,
    message: Option<String>,
}

impl ResourceEditorBuffer {
    pub fn new() -> Self { Self::default() }

    /// Buffer holding `resource`, or an empty create buffer.
    pub fn seeded(resource: Option<&Resource>) -> Self {
        let mut b = Self::new();
        b.seed(resource);
        b
    }

    /// Replace everything with the serialized resource (or empty text) and re-validate.
    pub fn seed(&mut self, resource: Option<&Resource>) {
        self.raw_text = resource.map(encode_resource).unwrap_or_default();
        self.seeded_text = self.raw_text.clone();
        self.parsed = None;
        self.revalidate();
    }

    /// Take new text; returns whether it decodes.
    pub fn on_text_change(&mut self, new_text: impl Into<String>) -> bool {
        self.raw_text = new_text.into();
        self.revalidate();
        self.valid
    }

    fn revalidate(&mut self) {
        match decode_resource(&self.raw_text) {
            Ok(r) => {
                self.parsed = Some(r);
                self.valid = true;
                self.message = None;
            }
            Err(e) => {
                self.valid = false;
                self.message = Some(e.to_string());
            }
        }
    }

    pub fn raw_text(&self) -> &str { &self.raw_text }

    /// Last successfully decoded value; may lag behind the text while it is invalid.
    pub fn parsed_value(&self) -> Option<&Resource> { self.parsed.as_ref() }

    pub fn is_valid(&self) -> bool { self.valid }

    pub fn validity_message(&self) -> Option<&str> { self.message.as_deref() }

    /// Text differs from what was seeded.
    pub fn is_dirty(&self) -> bool { self.raw_text != self.seeded_text }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn res(v: Value) -> Resource { Resource::try_from(v).unwrap() }

    const VALID: &str = r#"{"resource_group":"g","namespace":"n","kind":"k","name":"x","v":2}"#;

    const VALID_CASES: &[&str] = &[
        VALID,
        "{}",
        r#"{"resource_group":"g","namespace":"n","kind":"k","spec":{}}"#,
        r#"{"name":"x","spec":{"nested":{"deep":[1,2,{"z":null}]},"f":1.5e3,"ok":true}}"#,
        r#"{"name":"ünïcödé","label":"日本語","emoji":"🚀","esc":"é\n"}"#,
        "  \n\t{ \"name\" : \"spaced\" }\n  ",
    ];

    const INVALID_CASES: &[&str] = &[
        "",
        "   \n\t ",
        "{",
        r#"{"name":"x"} trailing"#,
        r#"{"name":"x"}}"#,
        r#"{"name":"x",}"#,
        r#"{name:"x"}"#,
        "[1, 2]",
        "\"just a string\"",
        "42",
        "null",
        "true",
    ];

    #[test]
    fn valid_text_sets_parsed_to_its_decode() {
        for text in VALID_CASES {
            let mut b = ResourceEditorBuffer::new();
            assert!(b.on_text_change(*text), "should be valid: {:?}", text);
            assert!(b.is_valid());
            assert_eq!(b.parsed_value(), Some(&decode_resource(text).unwrap()), "text: {:?}", text);
            assert_eq!(b.validity_message(), None);
            assert_eq!(b.raw_text(), *text);
        }
    }

    #[test]
    fn invalid_text_keeps_previous_parsed_value() {
        for text in INVALID_CASES {
            let mut b = ResourceEditorBuffer::new();
            b.on_text_change(VALID);
            let before = b.parsed_value().cloned();

            assert!(!b.on_text_change(*text), "should be invalid: {:?}", text);
            assert!(!b.is_valid());
            assert_eq!(b.parsed_value().cloned(), before, "text: {:?}", text);
            assert_eq!(b.raw_text(), *text);
            assert!(b.validity_message().is_some());
        }
    }

    #[test]
    fn invalid_then_valid_recovers() {
        let mut b = ResourceEditorBuffer::new();
        assert!(!b.on_text_change("nope"));
        assert_eq!(b.parsed_value(), None);
        assert!(b.validity_message().unwrap().starts_with("invalid JSON"));
        assert!(b.on_text_change(VALID));
        assert_eq!(b.parsed_value(), Some(&decode_resource(VALID).unwrap()));
    }

    #[test]
    fn object_without_identity_is_valid() {
        let r = decode_resource(r#"{"resource_group":"g","namespace":"n","kind":"k","spec":{}}"#).unwrap();
        assert_eq!(r.name(), None);
        assert_eq!(r.kind(), Some("k"));
    }

    #[test]
    fn shape_errors_are_reported() {
        assert_eq!(decode_resource("[1]").unwrap_err(), DecodeError::NotAnObject("an array"));
        assert_eq!(decode_resource("null").unwrap_err(), DecodeError::NotAnObject("null"));
        match decode_resource("{\n  \"a\": }").unwrap_err() {
            DecodeError::Syntax { line, .. } => assert_eq!(line, 2),
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn seed_round_trips_and_resets_dirty() {
        let r = res(json!({
            "resource_group": "g", "namespace": "n", "kind": "k", "name": "x",
            "created_at": "2024-01-01T00:00:00Z",
            "spec": {"replicas": 3, "tags": ["a", "b"], "nested": {"z": null, "a": 1.5}}
        }));
        let mut b = ResourceEditorBuffer::seeded(Some(&r));
        assert!(b.is_valid());
        assert!(!b.is_dirty());
        assert_eq!(b.parsed_value(), Some(&r));
        assert_eq!(decode_resource(&encode_resource(&r)).unwrap(), r);
        assert!(b.raw_text().starts_with("{\n  \"resource_group\": \"g\""));

        b.on_text_change(VALID);
        assert!(b.is_dirty());
        b.seed(Some(&r));
        assert!(!b.is_dirty());
    }

    #[test]
    fn create_seed_is_empty_and_invalid() {
        let mut b = ResourceEditorBuffer::new();
        b.on_text_change(VALID);
        b.seed(None);
        assert_eq!(b.raw_text(), "");
        assert!(!b.is_valid());
        assert_eq!(b.parsed_value(), None);
    }
}
