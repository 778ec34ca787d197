//! Parameter addressing
//!
//! A parameter is addressed by a fully qualified name composed from the
//! owning entity's name and the field key, joined by [`PARAM_SEPARATOR`].
//! The last separator-delimited segment is always the field key. The
//! composition must be bit-exact for interop with the parameter service.

use serde::{Deserialize, Serialize};

use crate::value::{ParamKind, ParamValue};

/// Separator between the entity scope and the field key
pub const PARAM_SEPARATOR: char = '.';

/// Compose a fully qualified parameter name from an entity scope and a key
pub fn compose_name(prefix: &str, key: &str) -> String {
    format!("{prefix}{PARAM_SEPARATOR}{key}")
}

/// Split a fully qualified name into (scope, key) at the final separator
///
/// Returns `None` if the name has no separator and therefore no scope.
pub fn split_name(qualified: &str) -> Option<(&str, &str)> {
    qualified.rsplit_once(PARAM_SEPARATOR)
}

// ─────────────────────────────────────────────────────────────────────────────
// Parameter Entry
// ─────────────────────────────────────────────────────────────────────────────

/// One externally addressable parameter: a qualified name and a typed value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamEntry {
    /// Fully qualified name, e.g. "Sensor1.gain"
    pub name: String,

    /// The typed value
    pub value: ParamValue,
}

impl ParamEntry {
    /// Create a new entry
    pub fn new(name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// The value's kind discriminator
    pub fn kind(&self) -> ParamKind {
        self.value.kind()
    }

    /// The last segment of the qualified name, i.e. the field key
    pub fn last_segment(&self) -> &str {
        split_name(&self.name)
            .map(|(_, key)| key)
            .unwrap_or(&self.name)
    }
}

impl std::fmt::Display for ParamEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {} ({})", self.name, self.value, self.kind())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
