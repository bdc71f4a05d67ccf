//! Operational helpers: run deployed resources by name and clean up
//! per-user development resources.

pub mod cleanup;
pub mod job;
pub mod pipeline;
