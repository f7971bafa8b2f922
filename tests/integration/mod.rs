//! Integration test suite for casedoc
//!
//! End-to-end tests of document generation through the library API and the
//! `casedoc` binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **generation**: full pipeline runs against in-memory stores
//! - **side_effects**: best-effort steps failing after rendering
//! - **fs_store**: the directory-backed store
//! - **cli_commands**: the `tags`, `check`, `generate` and `templates` commands

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod cli_commands;
mod fs_store;
mod generation;
mod side_effects;
