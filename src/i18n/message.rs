//! Message definitions and message file parsing.
//!
//! A message file maps message ids to either a plain string or a table with
//! reserved keys:
//!
//! ```toml
//! greeting = "Hello"
//!
//! [farewell]
//! description = "Shown when the user logs out"
//! other = "Goodbye"
//!
//! [nav]
//! home = "Home"      # id: nav.home
//! ```
//!
//! JSON files use the same shape. A top-level array of tables carrying an
//! `id` key is also accepted.

use serde_json::{Map, Value};
use std::path::Path;

/// Keys that mark a table as a message rather than a namespace.
const RESERVED_KEYS: &[&str] = &[
    "id",
    "description",
    "hash",
    "leftdelim",
    "rightdelim",
    "zero",
    "one",
    "two",
    "few",
    "many",
    "other",
];

/// A single translatable message for one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Dot-separated message id (e.g. "nav.home")
    pub id: String,

    /// Optional note for translators
    pub description: Option<String>,

    /// The text returned for this message
    pub other: Option<String>,
}

impl Message {
    /// Create a message with plain text.
    pub fn new(id: impl Into<String>, other: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: None,
            other: Some(other.into()),
        }
    }

    fn from_fields(id: String, fields: &Map<String, Value>) -> Self {
        let field = |name: &str| {
            fields
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .and_then(|(_, value)| value.as_str())
                .map(str::to_string)
        };

        Self {
            id: field("id").unwrap_or(id),
            description: field("description"),
            other: field("other"),
        }
    }
}

/// Supported message file encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageFormat {
    Json,
    Toml,
}

impl MessageFormat {
    /// Detect the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("json") {
            Some(Self::Json)
        } else if ext.eq_ignore_ascii_case("toml") {
            Some(Self::Toml)
        } else {
            None
        }
    }

    /// Decode raw file bytes into a generic document tree.
    pub fn decode(self, bytes: &[u8]) -> Result<Value, String> {
        match self {
            Self::Json => serde_json::from_slice(bytes).map_err(|e| e.to_string()),
            Self::Toml => {
                let text = std::str::from_utf8(bytes).map_err(|e| e.to_string())?;
                toml::from_str(text).map_err(|e| e.to_string())
            }
        }
    }
}

/// Flatten a decoded message document into messages.
pub fn parse_messages(document: &Value) -> Result<Vec<Message>, String> {
    let mut messages = Vec::new();

    match document {
        Value::Object(map) => collect(None, map, &mut messages)?,
        Value::Array(items) => {
            for item in items {
                let fields = item
                    .as_object()
                    .ok_or_else(|| "message list entries must be tables".to_string())?;
                let id = fields
                    .get("id")
                    .and_then(Value::as_str)
                    .ok_or_else(|| "message list entry is missing an \"id\"".to_string())?;
                messages.push(Message::from_fields(id.to_string(), fields));
            }
        }
        _ => return Err("message file must contain a table or a list of messages".to_string()),
    }

    Ok(messages)
}

fn collect(prefix: Option<&str>, map: &Map<String, Value>, out: &mut Vec<Message>) -> Result<(), String> {
    for (key, value) in map {
        let id = match prefix {
            Some(prefix) => format!("{}.{}", prefix, key),
            None => key.clone(),
        };

        match value {
            Value::String(text) => out.push(Message::new(id, text.as_str())),
            Value::Object(fields) if is_message(fields) => out.push(Message::from_fields(id, fields)),
            Value::Object(nested) => collect(Some(&id), nested, out)?,
            _ => return Err(format!("message \"{}\" must be a string or a table", id)),
        }
    }

    Ok(())
}

fn is_message(fields: &Map<String, Value>) -> bool {
    fields.iter().any(|(key, value)| {
        value.is_string() && RESERVED_KEYS.iter().any(|reserved| key.eq_ignore_ascii_case(reserved))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_toml(text: &str) -> Vec<Message> {
        let document = MessageFormat::Toml.decode(text.as_bytes()).expect("Should decode");
        parse_messages(&document).expect("Should parse")
    }

    fn find<'a>(messages: &'a [Message], id: &str) -> &'a Message {
        messages
            .iter()
            .find(|m| m.id == id)
            .unwrap_or_else(|| panic!("missing message {}", id))
    }

    // ==================== Format Detection Tests ====================

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            MessageFormat::from_path(Path::new("active.en.json")),
            Some(MessageFormat::Json)
        );
        assert_eq!(
            MessageFormat::from_path(Path::new("locales/fr-FR.TOML")),
            Some(MessageFormat::Toml)
        );
        assert_eq!(MessageFormat::from_path(Path::new("en.yaml")), None);
        assert_eq!(MessageFormat::from_path(Path::new("en")), None);
    }

    // ==================== Parsing Tests ====================

    #[test]
    fn test_plain_string_messages() {
        let messages = parse_toml("greeting = \"Hello\"\nfarewell = \"Bye\"\n");
        assert_eq!(messages.len(), 2);
        assert_eq!(find(&messages, "greeting").other.as_deref(), Some("Hello"));
    }

    #[test]
    fn test_table_message_with_description() {
        let messages = parse_toml(
            "[farewell]\ndescription = \"Shown on logout\"\nother = \"Goodbye\"\n",
        );
        let message = find(&messages, "farewell");
        assert_eq!(message.description.as_deref(), Some("Shown on logout"));
        assert_eq!(message.other.as_deref(), Some("Goodbye"));
    }

    #[test]
    fn test_nested_tables_join_ids_with_dots() {
        let messages = parse_toml("[nav]\nhome = \"Home\"\n\n[nav.menu]\nopen = \"Open\"\n");
        assert_eq!(find(&messages, "nav.home").other.as_deref(), Some("Home"));
        assert_eq!(find(&messages, "nav.menu.open").other.as_deref(), Some("Open"));
    }

    #[test]
    fn test_json_messages() {
        let document = MessageFormat::Json
            .decode(br#"{"greeting": "Bonjour", "cart": {"one": "article", "other": "articles"}}"#)
            .expect("Should decode");
        let messages = parse_messages(&document).expect("Should parse");
        assert_eq!(find(&messages, "greeting").other.as_deref(), Some("Bonjour"));
        assert_eq!(find(&messages, "cart").other.as_deref(), Some("articles"));
    }

    #[test]
    fn test_message_list_format() {
        let document = MessageFormat::Json
            .decode(br#"[{"id": "greeting", "other": "Hola"}]"#)
            .expect("Should decode");
        let messages = parse_messages(&document).expect("Should parse");
        assert_eq!(messages, vec![Message::new("greeting", "Hola")]);
    }

    #[test]
    fn test_message_list_requires_id() {
        let document = MessageFormat::Json
            .decode(br#"[{"other": "Hola"}]"#)
            .expect("Should decode");
        assert!(parse_messages(&document).is_err());
    }

    #[test]
    fn test_non_string_value_is_rejected() {
        let document = MessageFormat::Json.decode(br#"{"count": 3}"#).expect("Should decode");
        let err = parse_messages(&document).unwrap_err();
        assert!(err.contains("count"));
    }

    #[test]
    fn test_invalid_toml_reports_error() {
        assert!(MessageFormat::Toml.decode(b"greeting = ").is_err());
    }
}
