//! Tether Types - the parameter value model
//!
//! A closed, type-safe representation of the five parameter kinds that can
//! cross the process boundary (bool, integer, double, string, bytes), plus
//! the name-composition rules used to address parameters.

pub mod param;
pub mod value;

pub use param::{PARAM_SEPARATOR, ParamEntry, compose_name, split_name};
pub use value::{ParamKind, ParamValue, ValueError};
