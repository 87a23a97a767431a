//! Dependency resolution engine.
//!
//! Resolution is a fixed-point iteration: combine all known requirements
//! per package, pick the newest satisfying version for every package
//! that has none yet, pull in the picked version's own requirements, and
//! repeat until a run selects nothing new. Selections are never revised;
//! a constraint that appears after its package was already picked is a
//! documented limitation of this greedy design, not an error.

pub mod algebra;
pub mod graph;
pub mod provider;
pub mod select;
pub mod solver;

pub use solver::{Selection, Solver};
