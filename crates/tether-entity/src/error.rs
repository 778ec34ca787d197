//! Entity errors

use tether_bus::BusError;

use crate::registry::RegistryError;

/// Errors surfaced by a typed entity
#[derive(Debug, thiserror::Error)]
pub enum EntityError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Bus(#[from] BusError),

    #[error("Meta information submission timed out")]
    MetaPublishTimeout,
}
