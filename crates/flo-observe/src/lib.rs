//! Logger bootstrap for binaries built on `flo-core`.
//!
//! `flo-core` only emits `tracing` events; this crate installs the global
//! subscriber that renders them.

mod logger;
pub use logger::*;
