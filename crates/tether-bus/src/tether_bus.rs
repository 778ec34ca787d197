//! Tether Bus - in-process host runtime for entities
//!
//! Provides the two collaborators a typed entity is written against:
//!
//! - [`MessageBus`]: a topic-addressed channel provider. Publishers push
//!   typed payloads, subscriptions receive them on a task owned by the bus.
//! - [`ParameterService`]: a process-wide parameter table. Clients submit
//!   batches of named values and subscribe to change events.
//!
//! ```text
//! ┌──────────────┐  send   ┌─────────────────┐  recv   ┌───────────────┐
//! │ Publisher<M> │ ──────▶ │   MessageBus    │ ──────▶ │ Subscription  │
//! └──────────────┘         │ (topic→channel) │         │ (task + cb)   │
//!                          └─────────────────┘         └───────────────┘
//!
//! ┌─────────────────┐  set_parameters   ┌──────────────────┐
//! │ ParameterClient │ ────────────────▶ │ ParameterService │
//! └─────────────────┘ ◀──────────────── │  (command loop)  │
//!        ▲              ParameterEvent  └──────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod parameters;
pub mod topic;

pub use config::{BusConfig, ConfigError};
pub use error::BusError;
pub use parameters::{
    ParameterClient, ParameterEvent, ParameterEventSubscription, ParameterService,
};
pub use topic::{MessageBus, Publisher, QosProfile, Subscription};
