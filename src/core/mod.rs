//! Core constants and error types for the CFDP dispatch core.
//!
//! Everything here is transport-agnostic and used by every other module:
//!
//! - [`constants`]: fixed directory names and polling intervals
//! - [`error`]: the crate-wide error taxonomy ([`CfdpError`], [`DispatchError`])

pub mod constants;
mod error;

pub use constants::*;
pub use error::*;
