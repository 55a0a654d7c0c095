use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::xml::XmlElement;

/// Deepest array/object nesting the decode step accepts.
pub const MAX_JSON_DEPTH: usize = 512;

/// Decoded response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Body {
    /// A JSON object or array.
    Json(Value),
    /// A document parsed from a body starting with `<`.
    Xml(XmlElement),
    /// The body exactly as received.
    Text(String),
    /// A body that is not valid UTF-8, byte for byte (attachment downloads).
    Binary(Vec<u8>),
    /// A JSON-shaped body that failed to parse. Decode failures are data,
    /// callers inspect the variant instead of handling an error.
    Malformed(JsonDecodeError),
    /// The request succeeded and the server sent no body.
    Empty,
}

impl Body {
    /// Transport-level interpretation shared by every verb.
    pub fn from_transport(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Ok(Body::Empty);
        }
        match std::str::from_utf8(bytes) {
            Ok(text) if text.starts_with('<') => XmlElement::parse(text).map(Body::Xml),
            Ok(text) => Ok(Body::Text(text.to_owned())),
            Err(err) => {
                debug!(
                    len = bytes.len(),
                    valid_up_to = err.valid_up_to(),
                    "Response body is not UTF-8, keeping raw bytes"
                );
                Ok(Body::Binary(bytes.to_vec()))
            }
        }
    }

    /// JSON decode step applied to `get` results. Only raw payloads are
    /// touched.
    pub fn decode_json(self) -> Self {
        match self {
            Body::Text(raw) => decode_text(raw),
            Body::Binary(bytes) => decode_binary(bytes),
            other => other,
        }
    }

    pub fn is_success_without_data(&self) -> bool {
        matches!(self, Body::Empty)
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Body::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_xml(&self) -> Option<&XmlElement> {
        match self {
            Body::Xml(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Raw payload bytes for `Text` and `Binary` bodies.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Body::Text(text) => Some(text.as_bytes()),
            Body::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }
}

fn is_json_shaped(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .find(|byte| !byte.is_ascii_whitespace())
        .is_some_and(|byte| matches!(byte, b'{' | b'['))
}

fn decode_text(raw: String) -> Body {
    if !is_json_shaped(raw.as_bytes()) {
        return Body::Text(raw);
    }

    if let Some(index) = depth_overflow(raw.as_bytes(), MAX_JSON_DEPTH) {
        let error = JsonDecodeError::at(JsonErrorKind::Depth, &raw.as_bytes()[..index]);
        debug!(line = error.line, column = error.column, "JSON nesting too deep");
        return Body::Malformed(error);
    }

    match parse_value(&raw) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => Body::Json(value),
        Ok(_) => Body::Text(raw),
        Err(err) => {
            let error = JsonDecodeError::from_serde(&err);
            debug!(error = %err, kind = ?error.kind, "Response body is not valid JSON");
            Body::Malformed(error)
        }
    }
}

/// A JSON-shaped body with invalid UTF-8 cannot be decoded; anything else
/// stays as received.
fn decode_binary(bytes: Vec<u8>) -> Body {
    if !is_json_shaped(&bytes) {
        return Body::Binary(bytes);
    }
    let valid = match std::str::from_utf8(&bytes) {
        Ok(_) => bytes.len(),
        Err(err) => err.valid_up_to(),
    };
    let error = JsonDecodeError::at(JsonErrorKind::Other, &bytes[..valid]);
    debug!(line = error.line, column = error.column, "Malformed UTF-8 in JSON body");
    Body::Malformed(error)
}

/// Nesting is checked up front, so the parser itself runs without
/// serde_json's 128 level limit.
fn parse_value(raw: &str) -> serde_json::Result<Value> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    deserializer.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut deserializer))?;
    deserializer.end()?;
    Ok(value)
}

/// Byte index of the first `[` or `{` opened past `limit`, ignoring
/// brackets inside strings.
fn depth_overflow(bytes: &[u8], limit: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (index, &byte) in bytes.iter().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                if depth > limit {
                    return Some(index);
                }
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JsonErrorKind {
    Depth,
    ControlCharacter,
    Syntax,
    /// Any failure outside the categories above, such as malformed UTF-8.
    Other,
}

impl JsonErrorKind {
    pub fn description(self) -> &'static str {
        match self {
            JsonErrorKind::Depth => "The maximum stack depth has been exceeded",
            JsonErrorKind::ControlCharacter => {
                "Control character error, possibly incorrectly encoded"
            }
            JsonErrorKind::Syntax => "Syntax error",
            JsonErrorKind::Other => "Decode error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JsonDecodeError {
    pub kind: JsonErrorKind,
    pub line: usize,
    pub column: usize,
}

impl JsonDecodeError {
    pub fn from_serde(err: &serde_json::Error) -> Self {
        use serde_json::error::Category;

        let kind = if err.to_string().starts_with("control character") {
            JsonErrorKind::ControlCharacter
        } else {
            match err.classify() {
                Category::Syntax | Category::Eof => JsonErrorKind::Syntax,
                Category::Io | Category::Data => JsonErrorKind::Other,
            }
        };

        Self {
            kind,
            line: err.line(),
            column: err.column(),
        }
    }

    /// Error located at the byte right after `prefix`; lines and columns
    /// are 1-based.
    fn at(kind: JsonErrorKind, prefix: &[u8]) -> Self {
        let line = 1 + prefix.iter().filter(|&&byte| byte == b'\n').count();
        let line_start = prefix
            .iter()
            .rposition(|&byte| byte == b'\n')
            .map_or(0, |newline| newline + 1);
        Self {
            kind,
            line,
            column: prefix.len() - line_start + 1,
        }
    }

    pub fn description(&self) -> &'static str {
        self.kind.description()
    }
}

impl fmt::Display for JsonDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}
