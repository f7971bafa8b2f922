//! Configuration of the document generator.
//!
//! See [`GeneratorConfig`] for the file format and defaults.

mod global;

pub use global::GeneratorConfig;
