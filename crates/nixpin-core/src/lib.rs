//! Core data types for nixpin.
//!
//! This crate defines the fundamental types for resolving Python package
//! dependencies: PEP 440 versions and version specifiers, PEP 508
//! requirements and environment markers, package candidates, resolution
//! targets, and `requirements.txt` loading.
//!
//! This crate is intentionally free of async code and network I/O.

pub mod candidate;
pub mod marker;
pub mod reqfile;
pub mod requirement;
pub mod specifier;
pub mod target;
pub mod version;
