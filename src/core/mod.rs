//! Core types for casedoc
//!
//! This module holds the error taxonomy shared by every stage of the
//! generation pipeline:
//! - [`DocgenError`] - one variant per failure mode, cloneable so warnings can
//!   be attached to successful outcomes
//! - [`ErrorContext`] - user-facing wrapper with details and suggestions
//! - [`user_friendly_error`] - converts any `anyhow::Error` for CLI display

pub mod error;

pub use error::{DocgenError, ErrorContext, user_friendly_error};
