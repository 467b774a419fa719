//! Resolution of stored raw values into response values

use serde_json::Value;

/// Decode a stored raw value
///
/// A value that parses as JSON is returned as the decoded structure
/// (`"10"` becomes the number 10, `"[1,2]"` an array). Anything else is
/// returned as a plain string, unchanged.
pub fn decode_value(raw: &str) -> Value {
    serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Encode an admin-supplied JSON value into its raw stored form
///
/// JSON strings are stored verbatim so `"hello"` is kept as `hello`; every
/// other JSON value is stored as its compact JSON text.
pub fn encode_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Size a value counts against `max_value_bytes`: its raw stored form
pub fn value_size(value: &Value) -> usize {
    match value {
        Value::String(s) => s.len(),
        other => other.to_string().len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_numbers_and_booleans() {
        assert_eq!(decode_value("10"), json!(10));
        assert_eq!(decode_value("2.5"), json!(2.5));
        assert_eq!(decode_value("true"), json!(true));
        assert_eq!(decode_value("null"), Value::Null);
    }

    #[test]
    fn test_decode_structures() {
        assert_eq!(decode_value("[1,2,3]"), json!([1, 2, 3]));
        assert_eq!(
            decode_value(r#"{"easy":1,"hard":3}"#),
            json!({"easy": 1, "hard": 3})
        );
    }

    #[test]
    fn test_decode_plain_strings() {
        assert_eq!(decode_value("hello"), json!("hello"));
        assert_eq!(decode_value("{not json"), json!("{not json"));
        assert_eq!(decode_value(""), json!(""));
    }

    #[test]
    fn test_encode_value() {
        assert_eq!(encode_value(&json!("hello")), "hello");
        assert_eq!(encode_value(&json!(10)), "10");
        assert_eq!(encode_value(&json!({"a": [1, 2]})), r#"{"a":[1,2]}"#);
    }

    #[test]
    fn test_encode_then_decode_keeps_meaning() {
        let original = json!({"spawn": {"x": 1, "y": 2}, "enabled": true});
        assert_eq!(decode_value(&encode_value(&original)), original);
    }

    #[test]
    fn test_value_size_ignores_json_escaping() {
        assert_eq!(value_size(&json!("\n".repeat(10))), 10);
        assert_eq!(value_size(&json!("say \"hi\"")), 8);
        assert_eq!(value_size(&json!({"a": 1})), 7);
        assert_eq!(value_size(&json!(10)), 2);
    }
}
