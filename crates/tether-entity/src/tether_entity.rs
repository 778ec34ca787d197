//! Tether Entity - typed pub/sub endpoints with reflected parameters
//!
//! An entity is a named, addressable communication endpoint that either
//! publishes or subscribes one message type, and exposes part of its state
//! as externally configurable "meta parameters" through a reflected field
//! registry.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                       Entity<M>                            │
//! │  identity (EntityInfo)   │   FieldRegistry (Mutex)         │
//! │  one endpoint (pub/sub)  │   listener fan-out (RwLock)     │
//! └───────────┬──────────────┴──────────────┬─────────────────┘
//!             │ messages                    │ parameter events
//!             ▼                             ▼
//! ┌──────────────────────┐     ┌───────────────────────────────┐
//! │      MessageBus      │     │       ParameterService        │
//! │  (topic = name())    │     │  (scope prefix = name() + .)  │
//! └──────────────────────┘     └───────────────────────────────┘
//! ```
//!
//! Inbound messages run the entity's own handler, then every listener in
//! registration order. Inbound parameter events are filtered by an exact
//! name-prefix match, reduced to their field key, and assigned through the
//! registry, which enforces that a field never changes kind.

pub mod arena;
pub mod base;
pub mod entity;
pub mod error;
pub mod registry;

pub use arena::{ArenaError, EntityArena};
pub use base::{EntityId, EntityInfo, EntityRole};
pub use entity::{Entity, EntityBuilder};
pub use error::EntityError;
pub use registry::{AssignOutcome, FieldRegistry, ReflectedField, RegistryError};
