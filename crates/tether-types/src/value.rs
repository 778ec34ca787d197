//! Parameter values
//!
//! `ParamValue` is the sum type over every kind of value the parameter
//! service can carry. The kind discriminator is structural: a value cannot
//! disagree with its own type tag.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Parameter Kind
// ─────────────────────────────────────────────────────────────────────────────

/// Type discriminator for a parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Bool,
    Integer,
    Double,
    String,
    Bytes,
}

impl ParamKind {
    /// Stable wire name for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKind::Bool => "bool",
            ParamKind::Integer => "integer",
            ParamKind::Double => "double",
            ParamKind::String => "string",
            ParamKind::Bytes => "bytes",
        }
    }
}

impl std::fmt::Display for ParamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Parameter Value
// ─────────────────────────────────────────────────────────────────────────────

/// A typed parameter value
///
/// This enum covers the five kinds a parameter can have. There is no
/// "unset" variant: a registered field always holds a concrete value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ParamValue {
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
}

impl ParamValue {
    /// Get the kind discriminator
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Bool(_) => ParamKind::Bool,
            ParamValue::Integer(_) => ParamKind::Integer,
            ParamValue::Double(_) => ParamKind::Double,
            ParamValue::String(_) => ParamKind::String,
            ParamValue::Bytes(_) => ParamKind::Bytes,
        }
    }

    /// Get as boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as 64-bit integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ParamValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as double
    pub fn as_double(&self) -> Option<f64> {
        match self {
            ParamValue::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Get as string reference
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as byte slice
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            ParamValue::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Integer(i) => write!(f, "{i}"),
            ParamValue::Double(d) => write!(f, "{d}"),
            ParamValue::String(s) => f.write_str(s),
            ParamValue::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// From Implementations
// ─────────────────────────────────────────────────────────────────────────────

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Integer(v as i64)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Integer(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Double(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::String(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::String(v)
    }
}

impl From<Vec<u8>> for ParamValue {
    fn from(v: Vec<u8>) -> Self {
        ParamValue::Bytes(v)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TryFrom Implementations
// ─────────────────────────────────────────────────────────────────────────────

/// Error when converting out of a `ParamValue`
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValueError {
    #[error("Expected {expected}, got {actual}")]
    KindMismatch {
        expected: ParamKind,
        actual: ParamKind,
    },
}

impl TryFrom<ParamValue> for bool {
    type Error = ValueError;
    fn try_from(v: ParamValue) -> Result<Self, Self::Error> {
        v.as_bool().ok_or(ValueError::KindMismatch {
            expected: ParamKind::Bool,
            actual: v.kind(),
        })
    }
}

impl TryFrom<ParamValue> for i64 {
    type Error = ValueError;
    fn try_from(v: ParamValue) -> Result<Self, Self::Error> {
        v.as_integer().ok_or(ValueError::KindMismatch {
            expected: ParamKind::Integer,
            actual: v.kind(),
        })
    }
}

impl TryFrom<ParamValue> for f64 {
    type Error = ValueError;
    fn try_from(v: ParamValue) -> Result<Self, Self::Error> {
        v.as_double().ok_or(ValueError::KindMismatch {
            expected: ParamKind::Double,
            actual: v.kind(),
        })
    }
}

impl TryFrom<ParamValue> for String {
    type Error = ValueError;
    fn try_from(v: ParamValue) -> Result<Self, Self::Error> {
        match v {
            ParamValue::String(s) => Ok(s),
            other => Err(ValueError::KindMismatch {
                expected: ParamKind::String,
                actual: other.kind(),
            }),
        }
    }
}

impl TryFrom<ParamValue> for Vec<u8> {
    type Error = ValueError;
    fn try_from(v: ParamValue) -> Result<Self, Self::Error> {
        match v {
            ParamValue::Bytes(b) => Ok(b),
            other => Err(ValueError::KindMismatch {
                expected: ParamKind::Bytes,
                actual: other.kind(),
            }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_value() {
        assert_eq!(ParamValue::from(true).kind(), ParamKind::Bool);
        assert_eq!(ParamValue::from(42i64).kind(), ParamKind::Integer);
        assert_eq!(ParamValue::from(2.5).kind(), ParamKind::Double);
        assert_eq!(ParamValue::from("hello").kind(), ParamKind::String);
        assert_eq!(ParamValue::from(vec![1u8, 2, 3]).kind(), ParamKind::Bytes);
    }

    #[test]
    fn test_accessors() {
        assert_eq!(ParamValue::from(true).as_bool(), Some(true));
        assert_eq!(ParamValue::from(42i64).as_integer(), Some(42));
        assert_eq!(ParamValue::from(2.5).as_double(), Some(2.5));
        assert_eq!(ParamValue::from("hello").as_str(), Some("hello"));
        assert_eq!(
            ParamValue::from(vec![1u8, 2]).as_bytes(),
            Some(&[1u8, 2][..])
        );

        // Cross-kind access yields None, never a coerced value
        assert_eq!(ParamValue::from(42i64).as_double(), None);
        assert_eq!(ParamValue::from(2.5).as_integer(), None);
    }

    #[test]
    fn test_try_from_mismatch() {
        let v = ParamValue::from("not a number");
        let err = f64::try_from(v).unwrap_err();
        assert!(matches!(
            err,
            ValueError::KindMismatch {
                expected: ParamKind::Double,
                actual: ParamKind::String,
            }
        ));
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(ParamKind::Bool.to_string(), "bool");
        assert_eq!(ParamKind::Integer.to_string(), "integer");
        assert_eq!(ParamKind::Double.to_string(), "double");
        assert_eq!(ParamKind::String.to_string(), "string");
        assert_eq!(ParamKind::Bytes.to_string(), "bytes");
    }
}
