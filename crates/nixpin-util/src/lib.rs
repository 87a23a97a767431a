//! Shared utilities for nixpin.
//!
//! This crate provides cross-cutting concerns used by all other nixpin
//! crates: error types, async process spawning, and terminal status output.

pub mod errors;
pub mod process;
pub mod progress;
