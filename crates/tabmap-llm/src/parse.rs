//! Recovering structured data from free-form service text.
//!
//! The service is asked for a single JSON value but often wraps it in prose
//! or code fences, or answers with Python-flavoured near-JSON. Recovery is:
//!
//! 1. Cut the text from the first opening brace (or bracket) to the last
//!    matching closing one.
//! 2. Parse strictly with `serde_json`.
//! 3. Otherwise rewrite the bare identifiers `None`, `True`, `False`,
//!    `nan` and `NaN` outside string literals to `null`/`true`/`false`/`null`
//!    and parse as JSON5, which also admits single-quoted strings, unquoted
//!    keys and trailing commas.
//!
//! If both parses fail the caller gets a [`ParseError`]; no value is guessed.

use serde_json::{Map, Value};

use crate::error::ParseError;

/// Which top-level JSON value the caller expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    Object,
    Array,
    Any,
}

impl JsonShape {
    fn label(self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Array => "array",
            Self::Any => "value",
        }
    }
}

pub fn extract_json(text: &str, shape: JsonShape) -> Result<Value, ParseError> {
    let candidate = locate(text, shape).ok_or(ParseError::NotFound {
        expected: shape.label(),
    })?;
    let value = parse_candidate(candidate)?;
    match (shape, &value) {
        (JsonShape::Object, Value::Object(_))
        | (JsonShape::Array, Value::Array(_))
        | (JsonShape::Any, _) => Ok(value),
        (_, other) => Err(ParseError::WrongShape {
            expected: shape.label(),
            found: kind_of(other),
        }),
    }
}

/// Extracts a JSON object from `text`.
pub fn extract_object(text: &str) -> Result<Map<String, Value>, ParseError> {
    match extract_json(text, JsonShape::Object)? {
        Value::Object(map) => Ok(map),
        other => Err(ParseError::WrongShape {
            expected: "object",
            found: kind_of(&other),
        }),
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn locate(text: &str, shape: JsonShape) -> Option<&str> {
    let span = |open: char, close: char| -> Option<(usize, &str)> {
        let start = text.find(open)?;
        let end = text.rfind(close)?;
        (end > start).then(|| (start, &text[start..=end]))
    };
    match shape {
        JsonShape::Object => span('{', '}').map(|(_, s)| s),
        JsonShape::Array => span('[', ']').map(|(_, s)| s),
        JsonShape::Any => match (span('{', '}'), span('[', ']')) {
            (Some(object), Some(array)) => {
                Some(if array.0 < object.0 { array.1 } else { object.1 })
            }
            (object, array) => object.or(array).map(|(_, s)| s),
        },
    }
}

fn parse_candidate(candidate: &str) -> Result<Value, ParseError> {
    let strict = match serde_json::from_str::<Value>(candidate) {
        Ok(value) => return Ok(value),
        Err(err) => err.to_string(),
    };
    let normalized = normalize_python_literals(candidate);
    json5::from_str::<Value>(&normalized).map_err(|err| {
        tracing::debug!(%strict, lenient = %err, "response could not be parsed as JSON");
        ParseError::Invalid {
            strict,
            lenient: err.to_string(),
        }
    })
}

/// Rewrites Python literal identifiers outside of string literals.
pub fn normalize_python_literals(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    while let Some((start, ch)) = chars.next() {
        if let Some(q) = quote {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        if ch == '"' || ch == '\'' {
            quote = Some(ch);
            out.push(ch);
            continue;
        }
        if ch.is_ascii_alphabetic() || ch == '_' {
            let mut end = start + ch.len_utf8();
            while let Some(&(idx, next)) = chars.peek() {
                if next.is_ascii_alphanumeric() || next == '_' {
                    end = idx + next.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            let word = &text[start..end];
            out.push_str(match word {
                "None" | "nan" | "NaN" => "null",
                "True" => "true",
                "False" => "false",
                other => other,
            });
            continue;
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn extracts_object_from_prose() {
        let text = "Sure! Here is the row:\n```json\n{\"id\": 1, \"name\": \"Carol\"}\n```";
        let map = extract_object(text).unwrap();
        assert_eq!(map.get("name"), Some(&json!("Carol")));
    }

    #[test]
    fn falls_back_to_python_literals() {
        let text = "{'id': 1, 'active': True, 'note': None, 'score': nan,}";
        let value = extract_json(text, JsonShape::Object).unwrap();
        assert_eq!(value["id"].as_f64(), Some(1.0));
        assert_eq!(value["active"], json!(true));
        assert_eq!(value["note"], Value::Null);
        assert_eq!(value["score"], Value::Null);
    }

    #[test]
    fn leaves_literals_inside_strings_alone() {
        assert_eq!(
            normalize_python_literals("{'a': 'None of True'}"),
            "{'a': 'None of True'}"
        );
        assert_eq!(
            normalize_python_literals(r#"{"a": "it\"s None", "b": None}"#),
            r#"{"a": "it\"s None", "b": null}"#
        );
    }

    #[test]
    fn missing_json_is_not_found() {
        assert_eq!(
            extract_object("I cannot help with that."),
            Err(ParseError::NotFound { expected: "object" })
        );
    }

    #[test]
    fn garbage_between_braces_is_invalid() {
        assert!(matches!(
            extract_object("{this is : not json at all ::}"),
            Err(ParseError::Invalid { .. })
        ));
    }

    #[test]
    fn any_prefers_the_earliest_opener() {
        let value = extract_json("result: [{\"a\": 1}]", JsonShape::Any).unwrap();
        assert_eq!(value, json!([{"a": 1}]));
    }
}
