//! Source resolution

pub mod resolver;

pub use resolver::{resolve_inputs, resolve_path, DEFAULT_PATTERN};
