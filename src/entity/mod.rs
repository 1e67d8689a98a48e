//! Application context and client session lifecycles.
//!
//! The local entity's runtime state lives in an [`EntityContext`]; each
//! active peer interaction lives in a [`ClientSession`] registered in the
//! context's active-session registry. Both are built step by step and roll
//! back completely on any step's failure: a constructor either returns a
//! fully running value or nothing.
//!
//! Shutdown joins every session's outbound worker before the context's
//! inbound worker, so no session can still be touching the active-session
//! registry when the context is torn down.

mod context;
mod request;
mod session;

pub use context::{ContextShared, EntityConfig, EntityContext};
pub use request::TransferRequest;
pub use session::ClientSession;
