//! Value Module
//!
//! Scalar payloads accepted by the instrumented store and the pure decoders
//! applied to raw bytes read back from it.

/// Outcome of a decoder: the decoded value or the reason it was rejected.
pub type DecodeResult<T> = std::result::Result<T, String>;

// == Value ==
/// A scalar payload: text, integer, float or raw bytes.
///
/// Values are written to the store in their byte encoding, so reading one back
/// without a decoder yields [`Value::to_bytes`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Float(f64),
    Bytes(Vec<u8>),
}

impl Value {
    /// Encodes the value the way it is persisted.
    ///
    /// Text is UTF-8, integers are base-10, floats use the shortest decimal
    /// that parses back to the same number, bytes are written as-is.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Value::Text(text) => text.as_bytes().to_vec(),
            Value::Integer(n) => n.to_string().into_bytes(),
            Value::Float(x) => x.to_string().into_bytes(),
            Value::Bytes(bytes) => bytes.clone(),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n.into())
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl From<&[u8]> for Value {
    fn from(bytes: &[u8]) -> Self {
        Value::Bytes(bytes.to_vec())
    }
}

// == Decoders ==

/// Returns the raw bytes untouched.
pub fn identity(raw: &[u8]) -> DecodeResult<Vec<u8>> {
    Ok(raw.to_vec())
}

/// Decodes the raw bytes as UTF-8 text.
pub fn to_text(raw: &[u8]) -> DecodeResult<String> {
    String::from_utf8(raw.to_vec()).map_err(|e| e.to_string())
}

/// Parses the raw bytes as a base-10 integer, ignoring surrounding whitespace.
pub fn to_integer(raw: &[u8]) -> DecodeResult<i64> {
    std::str::from_utf8(raw)
        .map_err(|e| e.to_string())?
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| e.to_string())
}

/// Parses the raw bytes as a floating-point number, ignoring surrounding whitespace.
pub fn to_float(raw: &[u8]) -> DecodeResult<f64> {
    std::str::from_utf8(raw)
        .map_err(|e| e.to_string())?
        .trim()
        .parse()
        .map_err(|e: std::num::ParseFloatError| e.to_string())
}
