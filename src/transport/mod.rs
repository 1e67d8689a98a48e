//! Transport dispatch layer.
//!
//! Maps a persisted transport tag and a [`WorkerRole`] to exactly one
//! running worker task:
//!
//! - [`dispatch`]: the single entry point used by both the application
//!   context (server role) and every client session (client role)
//! - [`WorkerContext`]: everything a worker borrows from its owner
//!
//! Five transport variants are supported, each with a distinct server and
//! client entry point (ten in total). Workers are long-running tokio tasks
//! that observe the shutdown token at every suspension point.

mod dispatch;
mod workers;

pub use dispatch::{WorkerRole, dispatch};
pub use workers::{PacketBuffer, SharedRegistry, WorkerContext};
