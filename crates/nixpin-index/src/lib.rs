//! Package index access over the PEP 503 "simple" protocol.
//!
//! A package's version listing is an HTML page of anchors, one per
//! artifact. [`simple`] turns one page into a map of candidates;
//! [`client`] fetches pages from the configured mirrors with retry and
//! fallback.

pub mod client;
pub mod simple;

pub use client::IndexClient;
