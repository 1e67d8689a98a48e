//! # cfdp-engine
//!
//! Session- and transport-dispatch core for a CCSDS File Delivery
//! Protocol (CFDP) entity: software that reliably transfers files between
//! numbered entities over one of several link types.
//!
//! This crate provides:
//!
//! - **Dispatch**: one table spawning the right worker task for any of
//!   five transport variants, for both server and client roles
//! - **Lifecycles**: application-context and per-peer client-session
//!   construction with strict all-or-nothing rollback
//! - **Bookkeeping**: a reusable ordered registry backing the
//!   active-session set and the pending-request queues
//!
//! The PDU state machine, wire encoding, and retry timers are external
//! collaborators; this core only builds the header template they consume
//! and hands them received buffers.
//!
//! ## Modules
//!
//! - [`core`]: constants and error types (always included)
//! - [`registry`]: the ordered (key, element) container
//! - [`mib`]: persisted remote-entity descriptors and lookup
//! - [`pdu`]: protocol-header template construction
//! - [`transport`]: worker dispatch for the five transport variants
//! - [`entity`]: application context and client sessions
//!
//! ## Example Usage
//!
//! ```no_run
//! use cfdp_engine::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> CfdpResult<()> {
//!     // Bring up the local entity (id 7) with its store in the working
//!     // directory; this starts the inbound worker for its transport.
//!     let context = EntityContext::init(EntityConfig::new(7)).await?;
//!
//!     // Queue a file delivery toward peer 9; the first request starts
//!     // that peer's client session and outbound worker.
//!     context
//!         .put(9, "pic.jpeg", "remote_pic1.jpeg", TransmissionMode::Acknowledged)
//!         .await?;
//!
//!     // Joins every session's worker, then the inbound worker.
//!     context.shutdown().await;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod core;
pub mod entity;
pub mod mib;
pub mod pdu;
pub mod registry;
pub mod transport;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::core::{CfdpError, CfdpResult, DispatchError};
    pub use crate::entity::{ClientSession, EntityConfig, EntityContext, TransferRequest};
    pub use crate::mib::{MibStore, RemoteEntity, TransmissionMode, TransportKind};
    pub use crate::pdu::PduHeader;
    pub use crate::registry::{Criterion, Registry};
    pub use crate::transport::{WorkerContext, WorkerRole, dispatch};
}

// Re-export commonly used items at crate root
pub use crate::core::{CfdpError, CfdpResult};
pub use entity::{EntityConfig, EntityContext};
pub use mib::{MibStore, RemoteEntity};
pub use registry::Registry;
