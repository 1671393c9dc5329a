use serde_json::{Map, Value as JsonValue};

/// One record returned by the remote API. The shape is whatever the API
/// sends; field order is preserved as received.
pub type Row = Map<String, JsonValue>;

/// Returns the string value of `field`, if the row has one.
pub fn string_field<'a>(row: &'a Row, field: &str) -> Option<&'a str> {
    row.get(field).and_then(JsonValue::as_str)
}
