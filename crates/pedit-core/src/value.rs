//! Typed parameter values
//!
//! Provides [`ParameterValue`], the tagged union over the nine parameter kinds,
//! together with the codec between the permissive wire shape, raw JSON, and
//! the text an operator types into an editor.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Wire type tag of a parameter value
///
/// Tags follow the remote parameter service numbering (1..=9). Tag 0
/// ("not set") and anything above 9 are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum ParameterType {
    /// `bool_value`
    Bool,
    /// `integer_value`
    Integer,
    /// `double_value`
    Double,
    /// `string_value`
    String,
    /// `byte_array_value`
    ByteArray,
    /// `bool_array_value`
    BoolArray,
    /// `integer_array_value`
    IntegerArray,
    /// `double_array_value`
    DoubleArray,
    /// `string_array_value`
    StringArray,
}

impl ParameterType {
    /// Every kind, in tag order
    pub const ALL: [Self; 9] = [
        Self::Bool,
        Self::Integer,
        Self::Double,
        Self::String,
        Self::ByteArray,
        Self::BoolArray,
        Self::IntegerArray,
        Self::DoubleArray,
        Self::StringArray,
    ];

    /// Numeric wire tag
    #[inline]
    #[must_use]
    pub fn tag(self) -> i64 {
        match self {
            Self::Bool => 1,
            Self::Integer => 2,
            Self::Double => 3,
            Self::String => 4,
            Self::ByteArray => 5,
            Self::BoolArray => 6,
            Self::IntegerArray => 7,
            Self::DoubleArray => 8,
            Self::StringArray => 9,
        }
    }

    /// Resolve a numeric wire tag
    ///
    /// # Errors
    /// Returns [`CodecError::UnknownTag`] for anything outside 1..=9
    pub fn from_tag(tag: i64) -> Result<Self, CodecError> {
        match tag {
            1 => Ok(Self::Bool),
            2 => Ok(Self::Integer),
            3 => Ok(Self::Double),
            4 => Ok(Self::String),
            5 => Ok(Self::ByteArray),
            6 => Ok(Self::BoolArray),
            7 => Ok(Self::IntegerArray),
            8 => Ok(Self::DoubleArray),
            9 => Ok(Self::StringArray),
            other => Err(CodecError::UnknownTag(other)),
        }
    }

    /// Check if this is one of the five array kinds
    #[inline]
    #[must_use]
    pub fn is_array(self) -> bool {
        matches!(
            self,
            Self::ByteArray
                | Self::BoolArray
                | Self::IntegerArray
                | Self::DoubleArray
                | Self::StringArray
        )
    }

    /// Check if this is a scalar numeric kind
    #[inline]
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Double)
    }

    /// Name of the wire payload field
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Integer => "integer",
            Self::Double => "double",
            Self::String => "string",
            Self::ByteArray => "byte_array",
            Self::BoolArray => "bool_array",
            Self::IntegerArray => "integer_array",
            Self::DoubleArray => "double_array",
            Self::StringArray => "string_array",
        }
    }
}

impl Display for ParameterType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<i64> for ParameterType {
    type Error = CodecError;

    fn try_from(tag: i64) -> Result<Self, Self::Error> {
        Self::from_tag(tag)
    }
}

impl From<ParameterType> for i64 {
    fn from(kind: ParameterType) -> Self {
        kind.tag()
    }
}

/// A typed parameter value
///
/// Exactly one payload exists per value; the kind is implied by the variant.
/// Serializes through [`WireParameterValue`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "WireParameterValue", try_from = "WireParameterValue")]
pub enum ParameterValue {
    /// Boolean
    Bool(bool),
    /// Signed 64-bit integer
    Integer(i64),
    /// Double
    Double(f64),
    /// Text
    String(String),
    /// Raw bytes, each in 0..=255
    ByteArray(Vec<u8>),
    /// Booleans
    BoolArray(Vec<bool>),
    /// Integers
    IntegerArray(Vec<i64>),
    /// Doubles
    DoubleArray(Vec<f64>),
    /// Strings
    StringArray(Vec<String>),
}

impl ParameterValue {
    /// Declared kind of this value
    #[must_use]
    pub fn kind(&self) -> ParameterType {
        match self {
            Self::Bool(_) => ParameterType::Bool,
            Self::Integer(_) => ParameterType::Integer,
            Self::Double(_) => ParameterType::Double,
            Self::String(_) => ParameterType::String,
            Self::ByteArray(_) => ParameterType::ByteArray,
            Self::BoolArray(_) => ParameterType::BoolArray,
            Self::IntegerArray(_) => ParameterType::IntegerArray,
            Self::DoubleArray(_) => ParameterType::DoubleArray,
            Self::StringArray(_) => ParameterType::StringArray,
        }
    }

    /// Numeric view of a scalar integer or double
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(value) => Some(*value as f64),
            Self::Double(value) => Some(*value),
            _ => None,
        }
    }

    /// Boolean view
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// String view
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Plain JSON form, as used by set-by-name transports
    ///
    /// Non-finite doubles become `null`.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Bool(value) => JsonValue::Bool(*value),
            Self::Integer(value) => JsonValue::from(*value),
            Self::Double(value) => json_f64(*value),
            Self::String(value) => JsonValue::String(value.clone()),
            Self::ByteArray(items) => items.iter().map(|v| JsonValue::from(*v)).collect(),
            Self::BoolArray(items) => items.iter().map(|v| JsonValue::Bool(*v)).collect(),
            Self::IntegerArray(items) => items.iter().map(|v| JsonValue::from(*v)).collect(),
            Self::DoubleArray(items) => items.iter().map(|v| json_f64(*v)).collect(),
            Self::StringArray(items) => items.iter().map(|v| JsonValue::String(v.clone())).collect(),
        }
    }

    /// Tagged wire form with only the matching payload field populated
    #[must_use]
    pub fn to_wire(&self) -> WireParameterValue {
        let kind = self.kind();
        let mut wire = WireParameterValue {
            kind: kind.tag(),
            ..WireParameterValue::default()
        };
        *wire.payload_mut(kind) = Some(self.to_json());
        wire
    }

    /// Decode from the tagged wire form
    ///
    /// Only the field named by the tag is read; other populated fields are
    /// ignored.
    ///
    /// # Errors
    /// Unknown tag, missing payload, or a payload of the wrong JSON shape
    pub fn from_wire(wire: &WireParameterValue) -> Result<Self, CodecError> {
        let kind = ParameterType::from_tag(wire.kind)?;
        let payload = wire
            .payload(kind)
            .ok_or(CodecError::MissingPayload { kind })?;
        decode_kind(kind, payload)
    }
}

impl Display for ParameterValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Double(value) => write!(f, "{value}"),
            Self::String(value) => f.write_str(value),
            Self::ByteArray(items) => write_list(f, items),
            Self::BoolArray(items) => write_list(f, items),
            Self::IntegerArray(items) => write_list(f, items),
            Self::DoubleArray(items) => write_list(f, items),
            Self::StringArray(items) => write_list(f, items),
        }
    }
}

fn write_list<T: Display>(f: &mut Formatter<'_>, items: &[T]) -> fmt::Result {
    f.write_str("[")?;
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str("]")
}

fn json_f64(value: f64) -> JsonValue {
    serde_json::Number::from_f64(value).map_or(JsonValue::Null, JsonValue::Number)
}

/// Permissive wire shape of a parameter value
///
/// Several payload fields may be physically present; [`ParameterValue::from_wire`]
/// reads only the one selected by `type`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireParameterValue {
    /// Numeric type tag
    #[serde(rename = "type")]
    pub kind: i64,
    /// Payload read when `type` is 1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bool_value: Option<JsonValue>,
    /// Payload read when `type` is 2
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integer_value: Option<JsonValue>,
    /// Payload read when `type` is 3
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub double_value: Option<JsonValue>,
    /// Payload read when `type` is 4
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_value: Option<JsonValue>,
    /// Payload read when `type` is 5
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byte_array_value: Option<JsonValue>,
    /// Payload read when `type` is 6
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bool_array_value: Option<JsonValue>,
    /// Payload read when `type` is 7
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integer_array_value: Option<JsonValue>,
    /// Payload read when `type` is 8
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub double_array_value: Option<JsonValue>,
    /// Payload read when `type` is 9
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_array_value: Option<JsonValue>,
}

impl WireParameterValue {
    /// Payload field for a kind, if present
    #[must_use]
    pub fn payload(&self, kind: ParameterType) -> Option<&JsonValue> {
        match kind {
            ParameterType::Bool => self.bool_value.as_ref(),
            ParameterType::Integer => self.integer_value.as_ref(),
            ParameterType::Double => self.double_value.as_ref(),
            ParameterType::String => self.string_value.as_ref(),
            ParameterType::ByteArray => self.byte_array_value.as_ref(),
            ParameterType::BoolArray => self.bool_array_value.as_ref(),
            ParameterType::IntegerArray => self.integer_array_value.as_ref(),
            ParameterType::DoubleArray => self.double_array_value.as_ref(),
            ParameterType::StringArray => self.string_array_value.as_ref(),
        }
    }

    fn payload_mut(&mut self, kind: ParameterType) -> &mut Option<JsonValue> {
        match kind {
            ParameterType::Bool => &mut self.bool_value,
            ParameterType::Integer => &mut self.integer_value,
            ParameterType::Double => &mut self.double_value,
            ParameterType::String => &mut self.string_value,
            ParameterType::ByteArray => &mut self.byte_array_value,
            ParameterType::BoolArray => &mut self.bool_array_value,
            ParameterType::IntegerArray => &mut self.integer_array_value,
            ParameterType::DoubleArray => &mut self.double_array_value,
            ParameterType::StringArray => &mut self.string_array_value,
        }
    }
}

impl From<ParameterValue> for WireParameterValue {
    fn from(value: ParameterValue) -> Self {
        value.to_wire()
    }
}

impl TryFrom<WireParameterValue> for ParameterValue {
    type Error = CodecError;

    fn try_from(wire: WireParameterValue) -> Result<Self, Self::Error> {
        Self::from_wire(&wire)
    }
}

/// Decode a raw payload under an explicit type tag
///
/// # Errors
/// [`CodecError::UnknownTag`] for an unrecognized tag, or
/// [`CodecError::PayloadMismatch`] when `raw` does not have the tag's shape
pub fn decode(tag: i64, raw: &JsonValue) -> Result<ParameterValue, CodecError> {
    decode_kind(ParameterType::from_tag(tag)?, raw)
}

fn decode_kind(kind: ParameterType, raw: &JsonValue) -> Result<ParameterValue, CodecError> {
    let mismatch = || CodecError::PayloadMismatch {
        kind,
        found: json_shape(raw),
    };
    match kind {
        ParameterType::Bool => raw.as_bool().map(ParameterValue::Bool).ok_or_else(mismatch),
        ParameterType::Integer => json_i64(raw).map(ParameterValue::Integer).ok_or_else(mismatch),
        ParameterType::Double => raw.as_f64().map(ParameterValue::Double).ok_or_else(mismatch),
        ParameterType::String => raw
            .as_str()
            .map(|s| ParameterValue::String(s.to_string()))
            .ok_or_else(mismatch),
        ParameterType::ByteArray => decode_items(kind, raw, |item| {
            item.as_u64().and_then(|n| u8::try_from(n).ok())
        })
        .map(ParameterValue::ByteArray),
        ParameterType::BoolArray => {
            decode_items(kind, raw, JsonValue::as_bool).map(ParameterValue::BoolArray)
        }
        ParameterType::IntegerArray => {
            decode_items(kind, raw, json_i64).map(ParameterValue::IntegerArray)
        }
        ParameterType::DoubleArray => {
            decode_items(kind, raw, JsonValue::as_f64).map(ParameterValue::DoubleArray)
        }
        ParameterType::StringArray => decode_items(kind, raw, |item| {
            item.as_str().map(str::to_string)
        })
        .map(ParameterValue::StringArray),
    }
}

fn decode_items<T>(
    kind: ParameterType,
    raw: &JsonValue,
    element: impl Fn(&JsonValue) -> Option<T>,
) -> Result<Vec<T>, CodecError> {
    let items = raw.as_array().ok_or(CodecError::PayloadMismatch {
        kind,
        found: json_shape(raw),
    })?;
    items
        .iter()
        .map(|item| {
            element(item).ok_or(CodecError::PayloadMismatch {
                kind,
                found: json_shape(item),
            })
        })
        .collect()
}

/// Integers may arrive as whole-valued doubles from JavaScript hosts
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn json_i64(raw: &JsonValue) -> Option<i64> {
    raw.as_i64().or_else(|| {
        raw.as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

fn json_shape(raw: &JsonValue) -> &'static str {
    match raw {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// Infer a typed value from an untagged JSON value
///
/// Used for push snapshots, which carry plain values. Numeric arrays are
/// integer arrays when every element is an integer, double arrays otherwise.
/// An empty array has no element to inspect and is taken as a string array.
///
/// # Errors
/// [`CodecError::Uninferable`] for `null`, objects, nested or mixed arrays
pub fn infer(raw: &JsonValue) -> Result<ParameterValue, CodecError> {
    match raw {
        JsonValue::Bool(value) => Ok(ParameterValue::Bool(*value)),
        JsonValue::Number(number) => match (number.as_i64(), number.as_f64()) {
            (Some(value), _) => Ok(ParameterValue::Integer(value)),
            (None, Some(value)) => Ok(ParameterValue::Double(value)),
            (None, None) => Err(CodecError::Uninferable { found: "number" }),
        },
        JsonValue::String(value) => Ok(ParameterValue::String(value.clone())),
        JsonValue::Array(items) => {
            let Some(first) = items.first() else {
                return Ok(ParameterValue::StringArray(Vec::new()));
            };
            let kind = match first {
                JsonValue::Bool(_) => ParameterType::BoolArray,
                JsonValue::Number(_) if items.iter().all(|v| v.is_i64()) => {
                    ParameterType::IntegerArray
                }
                JsonValue::Number(_) => ParameterType::DoubleArray,
                JsonValue::String(_) => ParameterType::StringArray,
                other => {
                    return Err(CodecError::Uninferable {
                        found: json_shape(other),
                    })
                }
            };
            decode_kind(kind, raw)
        }
        JsonValue::Null | JsonValue::Object(_) => Err(CodecError::Uninferable {
            found: json_shape(raw),
        }),
    }
}

/// Decode a raw snapshot value, tagged or not
///
/// An object with an integer `type` member is read as a
/// [`WireParameterValue`]; anything else goes through [`infer`].
///
/// # Errors
/// Any decoding error of the chosen path
pub fn decode_raw(raw: &JsonValue) -> Result<ParameterValue, CodecError> {
    match raw.get("type").and_then(JsonValue::as_i64) {
        Some(_) => {
            let wire: WireParameterValue = serde_json::from_value(raw.clone())
                .map_err(|_| CodecError::Uninferable { found: "object" })?;
            ParameterValue::from_wire(&wire)
        }
        None => infer(raw),
    }
}

/// Encode edited text under the kind of the current value
///
/// Edits never change a parameter's declared kind.
///
/// # Errors
/// [`CodecError::InvalidBooleanLiteral`] or [`CodecError::InvalidNumericLiteral`]
/// when the text (or one of its array tokens) does not parse. Doubles must be
/// finite; `NaN` and `inf` have no wire representation.
pub fn encode(text: &str, current: &ParameterValue) -> Result<ParameterValue, CodecError> {
    match current.kind() {
        ParameterType::Bool => parse_bool(text).map(ParameterValue::Bool),
        ParameterType::Integer => parse_number(text).map(ParameterValue::Integer),
        ParameterType::Double => parse_finite(text).map(ParameterValue::Double),
        ParameterType::String => Ok(ParameterValue::String(text.to_string())),
        ParameterType::ByteArray => parse_tokens(text, parse_number).map(ParameterValue::ByteArray),
        ParameterType::BoolArray => parse_tokens(text, parse_bool).map(ParameterValue::BoolArray),
        ParameterType::IntegerArray => {
            parse_tokens(text, parse_number).map(ParameterValue::IntegerArray)
        }
        ParameterType::DoubleArray => {
            parse_tokens(text, parse_finite).map(ParameterValue::DoubleArray)
        }
        ParameterType::StringArray => {
            parse_tokens(text, |token| Ok(token.to_string())).map(ParameterValue::StringArray)
        }
    }
}

/// Parse a boolean literal: `true`/`on` or `false`/`off`, any case
///
/// # Errors
/// [`CodecError::InvalidBooleanLiteral`] for any other text
pub fn parse_bool(text: &str) -> Result<bool, CodecError> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "on" => Ok(true),
        "false" | "off" => Ok(false),
        _ => Err(CodecError::InvalidBooleanLiteral(text.to_string())),
    }
}

fn parse_number<T: FromStr>(text: &str) -> Result<T, CodecError> {
    text.trim()
        .parse()
        .map_err(|_| CodecError::InvalidNumericLiteral(text.to_string()))
}

fn parse_finite(text: &str) -> Result<f64, CodecError> {
    let value: f64 = parse_number(text)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CodecError::InvalidNumericLiteral(text.to_string()))
    }
}

fn parse_tokens<T>(
    text: &str,
    scalar: impl Fn(&str) -> Result<T, CodecError>,
) -> Result<Vec<T>, CodecError> {
    array_tokens(text).into_iter().map(scalar).collect()
}

/// Split array text into trimmed tokens
///
/// One surrounding `[`…`]` pair is optional. Blank input yields no tokens.
#[must_use]
pub fn array_tokens(text: &str) -> Vec<&str> {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(trimmed);
    if inner.trim().is_empty() {
        return Vec::new();
    }
    inner.split(',').map(str::trim).collect()
}

/// Errors converting parameter values
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    /// Type tag outside the nine known kinds
    #[error("unrecognized parameter type tag: {0}")]
    UnknownTag(i64),

    /// Text is not a boolean literal
    #[error("invalid boolean literal: {0:?} (expected true/on or false/off)")]
    InvalidBooleanLiteral(String),

    /// Text is not a number of the required kind
    #[error("invalid numeric literal: {0:?}")]
    InvalidNumericLiteral(String),

    /// Tagged value without its payload field
    #[error("{kind} value has no {kind}_value field")]
    MissingPayload {
        /// Declared kind
        kind: ParameterType,
    },

    /// Payload present but of the wrong shape
    #[error("{kind} payload has unexpected shape: {found}")]
    PayloadMismatch {
        /// Declared kind
        kind: ParameterType,
        /// Shape of the payload actually present
        found: &'static str,
    },

    /// No kind can be inferred from an untagged value
    #[error("cannot infer a parameter type from {found}")]
    Uninferable {
        /// Shape of the value
        found: &'static str,
    },
}
