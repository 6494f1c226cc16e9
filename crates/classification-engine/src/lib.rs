//! Classification Engine
//!
//! Grades computed analysis values against sector, industry, geography and
//! historical benchmarks, producing a status, a risk level and a confidence.

pub mod classifier;
pub mod policy;

pub use classifier::Classifier;
pub use policy::{ClassificationPolicy, PolicyError};
