//! CLI command implementations.

pub mod default_config;
pub mod evaluate;
pub mod strategies;
pub mod validate;
