//! Entity identity
//!
//! The non-generic half of an entity: id, class name, role, and the derived
//! addressable name. The name doubles as the topic an entity publishes or
//! subscribes on and as the scope prefix of its parameters, so it must be
//! unique per process.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Entity Id
// ─────────────────────────────────────────────────────────────────────────────

/// Process-unique entity identifier, assigned at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Entity Role
// ─────────────────────────────────────────────────────────────────────────────

/// Whether an entity publishes or subscribes; fixed for its lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityRole {
    Publisher,
    Subscriber,
}

impl EntityRole {
    /// True for the subscriber role
    pub fn is_subscriber(&self) -> bool {
        matches!(self, EntityRole::Subscriber)
    }
}

impl std::fmt::Display for EntityRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityRole::Publisher => f.write_str("publisher"),
            EntityRole::Subscriber => f.write_str("subscriber"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Entity Info
// ─────────────────────────────────────────────────────────────────────────────

/// Identity of one entity: id, class name, role, virtual flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityInfo {
    id: EntityId,
    class_name: String,
    role: EntityRole,
    virtual_entity: bool,
}

impl EntityInfo {
    /// Create a new identity; all fields are immutable afterwards
    pub fn new(
        id: impl Into<EntityId>,
        class_name: impl Into<String>,
        role: EntityRole,
        virtual_entity: bool,
    ) -> Self {
        Self {
            id: id.into(),
            class_name: class_name.into(),
            role,
            virtual_entity,
        }
    }

    /// The process-unique id
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// The concrete entity kind
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// The externally visible addressable identifier: class name + id
    pub fn name(&self) -> String {
        format!("{}{}", self.class_name, self.id)
    }

    /// True if this entity has no physical counterpart
    pub fn is_virtual(&self) -> bool {
        self.virtual_entity
    }

    /// The fixed role
    pub fn role(&self) -> EntityRole {
        self.role
    }

    /// True if this entity receives messages rather than publishing them
    pub fn is_subscriber(&self) -> bool {
        self.role.is_subscriber()
    }
}

impl std::fmt::Display for EntityInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.role)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_is_class_name_plus_id() {
        let info = EntityInfo::new(1u64, "Sensor", EntityRole::Publisher, false);
        assert_eq!(info.name(), "Sensor1");

        let info = EntityInfo::new(10u64, "Sensor", EntityRole::Subscriber, true);
        assert_eq!(info.name(), "Sensor10");
        assert!(info.is_virtual());
        assert!(info.is_subscriber());
    }

    #[test]
    fn test_name_is_stable() {
        let info = EntityInfo::new(7u64, "Actuator", EntityRole::Publisher, false);
        let first = info.name();
        assert_eq!(info.name(), first);
        assert_eq!(info.id(), EntityId(7));
        assert_eq!(info.class_name(), "Actuator");
    }
}
