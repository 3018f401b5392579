//! Error types for the bootline protocol layer.

mod extension;

pub use extension::*;
