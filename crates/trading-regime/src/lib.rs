//! Market regime classification.
//!
//! Each symbol gets its own [`RegimeClassifier`], created through a
//! [`RegimeClassifierFactory`] so every instance shares one configuration
//! while keeping its own stability history.

pub mod classifier;
pub mod factory;

pub use classifier::{RegimeClassifier, RegimeConfig};
pub use factory::RegimeClassifierFactory;
