//! Core types and error handling for lakeops.
//!
//! The error system follows two principles: strongly-typed errors for precise
//! handling in code, and messages written for the person reading a failed
//! deploy log. Validation and configuration errors abort a build before any
//! create/update network call is made; collaborator (API) failures carry the
//! failing HTTP verb and response detail.

pub mod error;

pub use error::{LakeopsError, Result};
