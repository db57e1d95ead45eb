//! Ravel Core
//!
//! Shared values and parameter bundles used across the engine and CLI.

pub mod values;

pub use values::{ParamName, Params, Value, ValueError};
