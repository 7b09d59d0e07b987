//! Check descriptors, the built-in checks and the check registry.
//!
//! This crate is I/O-free: every check is a pure function of an enumerated
//! scene.

pub mod check;
pub mod checks;
pub mod registry;

pub use check::{BackendTable, Check, CheckError, CheckFn, ComponentHits, NodeHits};
pub use registry::{Registry, RegistryError};
