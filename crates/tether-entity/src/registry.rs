//! Reflected field registry
//!
//! Type-safe heterogeneous storage of the named configuration values one
//! entity exposes to the parameter service. Fields keep their registration
//! order, and a field's kind is fixed for the registry's whole lifetime:
//! [`FieldRegistry::assign`] refuses a value of a different kind without
//! touching the stored one.

use tether_types::{ParamEntry, ParamKind, ParamValue, compose_name};

/// Errors that can occur during field registration
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
    #[error("Field already registered: {0}")]
    DuplicateKey(String),
}

/// Outcome of assigning an external value to a field
#[derive(Debug, Clone, PartialEq)]
pub enum AssignOutcome {
    /// The field was found and updated
    Updated,

    /// No field with that key exists in this registry
    UnknownKey,

    /// The field exists but the value's kind does not match
    KindMismatch {
        expected: ParamKind,
        actual: ParamKind,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Reflected Field
// ─────────────────────────────────────────────────────────────────────────────

/// One named, typed configuration value
#[derive(Debug, Clone, PartialEq)]
pub struct ReflectedField {
    key: String,
    value: ParamValue,
}

impl ReflectedField {
    /// The field key, unique within one registry
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The current value
    pub fn value(&self) -> &ParamValue {
        &self.value
    }

    /// The kind fixed at registration
    pub fn kind(&self) -> ParamKind {
        self.value.kind()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Field Registry
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered collection of an entity's reflected fields
#[derive(Debug, Default)]
pub struct FieldRegistry {
    fields: Vec<ReflectedField>,
}

impl FieldRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new field with its initial value
    ///
    /// The value's kind becomes the field's kind for good. A duplicate key
    /// is a programming defect and aborts entity construction.
    pub fn register(
        &mut self,
        key: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> Result<(), RegistryError> {
        let key = key.into();
        if self.fields.iter().any(|f| f.key == key) {
            return Err(RegistryError::DuplicateKey(key));
        }
        self.fields.push(ReflectedField {
            key,
            value: value.into(),
        });
        Ok(())
    }

    /// Iterate fields in registration order
    pub fn iter(&self) -> impl Iterator<Item = &ReflectedField> {
        self.fields.iter()
    }

    /// Find a field by exact key
    pub fn find(&self, key: &str) -> Option<&ReflectedField> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Assign an externally supplied value to a field
    ///
    /// Unknown keys and kind mismatches are reported, never applied; the
    /// caller decides whether to log or ignore them.
    pub fn assign(&mut self, key: &str, value: ParamValue) -> AssignOutcome {
        let Some(field) = self.fields.iter_mut().find(|f| f.key == key) else {
            return AssignOutcome::UnknownKey;
        };
        let expected = field.value.kind();
        let actual = value.kind();
        if expected != actual {
            return AssignOutcome::KindMismatch { expected, actual };
        }
        field.value = value;
        AssignOutcome::Updated
    }

    /// Serialize the registry as externally addressable parameter entries
    ///
    /// One entry per field, named `prefix.key`, in registration order.
    pub fn to_param_batch(&self, prefix: &str) -> Vec<ParamEntry> {
        self.fields
            .iter()
            .map(|f| ParamEntry::new(compose_name(prefix, &f.key), f.value.clone()))
            .collect()
    }

    /// Number of registered fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if no fields are registered
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_registry() -> FieldRegistry {
        let mut registry = FieldRegistry::new();
        registry.register("gain", 1.0).unwrap();
        registry.register("offset", 0i64).unwrap();
        registry.register("label", "front").unwrap();
        registry
    }

    #[test]
    fn test_duplicate_key_is_rejected() {
        let mut registry = sample_registry();
        let err = registry.register("gain", 2.0).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateKey(k) if k == "gain"));
        // The original field is untouched
        assert_eq!(registry.find("gain").unwrap().value().as_double(), Some(1.0));
    }

    #[test]
    fn test_assign_updates_matching_kind() {
        let mut registry = sample_registry();
        assert_eq!(
            registry.assign("gain", ParamValue::Double(2.5)),
            AssignOutcome::Updated
        );
        assert_eq!(registry.find("gain").unwrap().value().as_double(), Some(2.5));
    }

    #[test]
    fn test_assign_kind_mismatch_leaves_value_unchanged() {
        let mut registry = sample_registry();
        let outcome = registry.assign("gain", ParamValue::String("2.5".into()));
        assert_eq!(
            outcome,
            AssignOutcome::KindMismatch {
                expected: ParamKind::Double,
                actual: ParamKind::String,
            }
        );
        assert_eq!(registry.find("gain").unwrap().value().as_double(), Some(1.0));
        assert_eq!(registry.find("gain").unwrap().kind(), ParamKind::Double);
    }

    #[test]
    fn test_assign_unknown_key() {
        let mut registry = sample_registry();
        assert_eq!(
            registry.assign("missing", ParamValue::Bool(true)),
            AssignOutcome::UnknownKey
        );
    }

    #[test]
    fn test_batch_preserves_registration_order() {
        let registry = sample_registry();
        let batch = registry.to_param_batch("Sensor1");
        let names: Vec<&str> = batch.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Sensor1.gain", "Sensor1.offset", "Sensor1.label"]);
    }

    #[test]
    fn test_batch_is_idempotent_without_mutation() {
        let registry = sample_registry();
        assert_eq!(
            registry.to_param_batch("Sensor1"),
            registry.to_param_batch("Sensor1")
        );
    }
}
