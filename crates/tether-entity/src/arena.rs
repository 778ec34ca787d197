//! Entity arena
//!
//! Entities form a structural tree used for traversal and enumeration, not
//! for ownership. The arena stores identities indexed by id and children as
//! id references, so the tree can never dangle and traversal needs no
//! lifetime gymnastics.

use std::collections::HashSet;

use dashmap::DashMap;

use crate::base::{EntityId, EntityInfo};

/// Errors that can occur while building the entity tree
#[derive(Debug, Clone, thiserror::Error)]
pub enum ArenaError {
    #[error("Entity id already present: {0}")]
    DuplicateId(EntityId),

    #[error("Entity name already present: {0}")]
    DuplicateName(String),

    #[error("Unknown entity: {0}")]
    UnknownEntity(EntityId),
}

struct EntityNode {
    info: EntityInfo,
    children: Vec<EntityId>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Entity Arena
// ─────────────────────────────────────────────────────────────────────────────

/// Process-wide registry of entity identities and their tree structure
#[derive(Default)]
pub struct EntityArena {
    nodes: DashMap<EntityId, EntityNode>,
    names: DashMap<String, EntityId>,
}

impl EntityArena {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity identity
    ///
    /// Both the id and the derived name must be unique; names are the
    /// addressable identifier on the bus.
    pub fn insert(&self, info: EntityInfo) -> Result<EntityId, ArenaError> {
        let id = info.id();
        let name = info.name();
        if self.nodes.contains_key(&id) {
            return Err(ArenaError::DuplicateId(id));
        }
        if self.names.contains_key(&name) {
            return Err(ArenaError::DuplicateName(name));
        }
        self.names.insert(name, id);
        self.nodes.insert(
            id,
            EntityNode {
                info,
                children: Vec::new(),
            },
        );
        Ok(id)
    }

    /// Get a copy of an entity's identity
    pub fn get(&self, id: EntityId) -> Option<EntityInfo> {
        self.nodes.get(&id).map(|node| node.info.clone())
    }

    /// Resolve an addressable name to an id
    pub fn lookup(&self, name: &str) -> Option<EntityId> {
        self.names.get(name).map(|id| *id)
    }

    /// Record `child` as a child of `parent`
    ///
    /// The relationship is structural only; neither entity's lifetime is
    /// tied to the other.
    pub fn add_child(&self, parent: EntityId, child: EntityId) -> Result<(), ArenaError> {
        if !self.nodes.contains_key(&child) {
            return Err(ArenaError::UnknownEntity(child));
        }
        let mut node = self
            .nodes
            .get_mut(&parent)
            .ok_or(ArenaError::UnknownEntity(parent))?;
        if !node.children.contains(&child) {
            node.children.push(child);
        }
        Ok(())
    }

    /// Direct children of an entity, in insertion order
    pub fn children(&self, id: EntityId) -> Vec<EntityId> {
        self.nodes
            .get(&id)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    /// All descendants of an entity, depth-first
    ///
    /// Safe against accidental cycles in the structural tree.
    pub fn descendants(&self, id: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut visited: HashSet<EntityId> = HashSet::new();
        visited.insert(id);
        let mut stack: Vec<EntityId> = self.children(id);
        stack.reverse();

        while let Some(next) = stack.pop() {
            if !visited.insert(next) {
                continue;
            }
            out.push(next);
            let mut children = self.children(next);
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Number of entities in the arena
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the arena holds no entities
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::EntityRole;

    fn info(id: u64, class_name: &str) -> EntityInfo {
        EntityInfo::new(id, class_name, EntityRole::Publisher, false)
    }

    #[test]
    fn test_insert_and_lookup() {
        let arena = EntityArena::new();
        let id = arena.insert(info(1, "Sensor")).unwrap();
        assert_eq!(arena.lookup("Sensor1"), Some(id));
        assert_eq!(arena.get(id).unwrap().class_name(), "Sensor");
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        let arena = EntityArena::new();
        arena.insert(info(1, "Sensor")).unwrap();
        let clash = EntityInfo::new(1u64, "Actuator", EntityRole::Subscriber, true);
        assert!(matches!(
            arena.insert(clash),
            Err(ArenaError::DuplicateId(_))
        ));
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let arena = EntityArena::new();
        // "Sensor" + 11 and "Sensor1" + 1 both derive the name "Sensor11"
        arena.insert(info(11, "Sensor")).unwrap();
        assert!(matches!(
            arena.insert(info(1, "Sensor1")),
            Err(ArenaError::DuplicateName(name)) if name == "Sensor11"
        ));

        // Sensor11 vs Sensor10 are distinct names
        arena.insert(info(10, "Sensor")).unwrap();
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_tree_traversal() {
        let arena = EntityArena::new();
        let robot = arena.insert(info(1, "Robot")).unwrap();
        let lidar = arena.insert(info(2, "Lidar")).unwrap();
        let motor = arena.insert(info(3, "Motor")).unwrap();
        let encoder = arena.insert(info(4, "Encoder")).unwrap();

        arena.add_child(robot, lidar).unwrap();
        arena.add_child(robot, motor).unwrap();
        arena.add_child(motor, encoder).unwrap();

        assert_eq!(arena.children(robot), vec![lidar, motor]);
        assert_eq!(arena.descendants(robot), vec![lidar, motor, encoder]);
    }

    #[test]
    fn test_add_child_requires_both_entities() {
        let arena = EntityArena::new();
        let robot = arena.insert(info(1, "Robot")).unwrap();
        let ghost = EntityId(99);
        assert!(matches!(
            arena.add_child(robot, ghost),
            Err(ArenaError::UnknownEntity(_))
        ));
        assert!(matches!(
            arena.add_child(ghost, robot),
            Err(ArenaError::UnknownEntity(_))
        ));
    }

    #[test]
    fn test_descendants_tolerates_cycles() {
        let arena = EntityArena::new();
        let a = arena.insert(info(1, "A")).unwrap();
        let b = arena.insert(info(2, "B")).unwrap();
        arena.add_child(a, b).unwrap();
        arena.add_child(b, a).unwrap();

        assert_eq!(arena.descendants(a), vec![b]);
    }
}
