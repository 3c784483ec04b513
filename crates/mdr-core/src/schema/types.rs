//! Attribute data types and their JSON-Schema form

use serde_json::{json, Map, Number, Value};
use std::fmt;

/// JSON type an attribute data type maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonType {
    String,
    Integer,
    Number,
    Boolean,
}

impl JsonType {
    /// Typed JSON value of a stored value-set entry, `None` when it does not fit the type
    pub fn coerce(&self, raw: &str) -> Option<Value> {
        let raw_trimmed = raw.trim();
        match self {
            JsonType::String => Some(Value::String(raw.to_string())),
            JsonType::Integer => {
                if let Ok(int) = raw_trimmed.parse::<i64>() {
                    Some(json!(int))
                } else {
                    raw_trimmed.parse::<u64>().ok().map(|int| json!(int))
                }
            }
            JsonType::Number => {
                if let Some(int) = JsonType::Integer.coerce(raw_trimmed) {
                    return Some(int);
                }
                raw_trimmed
                    .parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
            }
            JsonType::Boolean => match raw_trimmed.to_ascii_lowercase().as_str() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
        }
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonType::String => write!(f, "string"),
            JsonType::Integer => write!(f, "integer"),
            JsonType::Number => write!(f, "number"),
            JsonType::Boolean => write!(f, "boolean"),
        }
    }
}

/// Mapped form of a registry data type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataType {
    pub json_type: JsonType,
    pub format: Option<&'static str>,
    /// Whether the name was recognised; unknown names fall back to string
    pub known: bool,
}

impl DataType {
    /// Classify a data type name, ignoring case and an `xsd:` prefix
    pub fn parse(name: &str) -> Self {
        let lowered = name.trim().to_ascii_lowercase();
        let bare = lowered.strip_prefix("xsd:").unwrap_or(&lowered);

        let (json_type, format) = match bare {
            "string" | "text" | "str" | "token" | "enum" | "id" | "identifier" => {
                (JsonType::String, None)
            }
            "uri" | "anyuri" | "url" => (JsonType::String, Some("uri")),
            "email" => (JsonType::String, Some("email")),
            "date" => (JsonType::String, Some("date")),
            "datetime" | "date-time" | "timestamp" => (JsonType::String, Some("date-time")),
            "time" => (JsonType::String, Some("time")),
            "integer" | "int" | "long" | "short" | "nonnegativeinteger" | "positiveinteger" => {
                (JsonType::Integer, None)
            }
            "number" | "decimal" | "float" | "double" | "numeric" => (JsonType::Number, None),
            "boolean" | "bool" => (JsonType::Boolean, None),
            _ => {
                return Self {
                    json_type: JsonType::String,
                    format: None,
                    known: false,
                }
            }
        };

        Self {
            json_type,
            format,
            known: true,
        }
    }

    /// Item schema for one value of this type
    pub fn item_schema(&self, enum_values: Option<&[Value]>) -> Value {
        let mut schema = Map::new();
        schema.insert("type".into(), json!(self.json_type.to_string()));
        if let Some(format) = self.format {
            schema.insert("format".into(), json!(format));
        }
        if let Some(values) = enum_values {
            schema.insert("enum".into(), json!(values));
        }
        Value::Object(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_data_types() {
        assert_eq!(DataType::parse("xsd:integer").json_type, JsonType::Integer);
        assert_eq!(DataType::parse("Decimal").json_type, JsonType::Number);
        assert_eq!(DataType::parse("dateTime").format, Some("date-time"));
        assert_eq!(DataType::parse("Boolean").json_type, JsonType::Boolean);

        let unknown = DataType::parse("Blob");
        assert_eq!(unknown.json_type, JsonType::String);
        assert!(!unknown.known);
    }

    #[test]
    fn test_item_schema() {
        let values = vec![json!("A"), json!("B")];
        assert_eq!(
            DataType::parse("date").item_schema(None),
            json!({"type": "string", "format": "date"})
        );
        assert_eq!(
            DataType::parse("string").item_schema(Some(&values)),
            json!({"type": "string", "enum": ["A", "B"]})
        );
    }

    #[test]
    fn test_coerce_value_set_entries() {
        assert_eq!(JsonType::Integer.coerce(" 2 "), Some(json!(2)));
        assert_eq!(JsonType::Integer.coerce("2.5"), None);
        assert_eq!(JsonType::Number.coerce("3"), Some(json!(3)));
        assert_eq!(JsonType::Number.coerce("2.5"), Some(json!(2.5)));
        assert_eq!(JsonType::Number.coerce("NaN"), None);
        assert_eq!(JsonType::Boolean.coerce("TRUE"), Some(json!(true)));
        assert_eq!(JsonType::Boolean.coerce("yes"), None);
        assert_eq!(JsonType::String.coerce(" A "), Some(json!(" A ")));
    }
}
