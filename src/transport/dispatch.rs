//! Mapping from (transport tag, role) to a running worker.

use std::future::Future;
use std::pin::Pin;

use tokio::task::JoinHandle;
use tracing::error;

use crate::core::DispatchError;
use crate::mib::TransportKind;

use super::workers::{self, WorkerContext};

/// Role a dispatched worker plays for its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerRole {
    /// Inbound worker, owned by the application context.
    Server,
    /// Outbound worker, owned by one client session.
    Client,
}

type WorkerFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
type EntryPoint = fn(WorkerContext) -> WorkerFuture;

/// The (server, client) entry-point pair for one transport.
///
/// One table serves both roles; context and session construction differ
/// only in which half they select.
fn entry_points(kind: TransportKind) -> (EntryPoint, EntryPoint) {
    match kind {
        TransportKind::PosixConnectionless => (
            |ctx| Box::pin(workers::udp_server(ctx)),
            |ctx| Box::pin(workers::udp_client(ctx)),
        ),
        TransportKind::PosixConnected => (
            |ctx| Box::pin(workers::tcp_server(ctx)),
            |ctx| Box::pin(workers::tcp_client(ctx)),
        ),
        TransportKind::CspConnectionless => (
            |ctx| Box::pin(workers::csp_datagram_server(ctx)),
            |ctx| Box::pin(workers::csp_datagram_client(ctx)),
        ),
        TransportKind::CspConnected => (
            |ctx| Box::pin(workers::csp_stream_server(ctx)),
            |ctx| Box::pin(workers::csp_stream_client(ctx)),
        ),
        TransportKind::Generic => (
            |ctx| Box::pin(workers::generic_server(ctx)),
            |ctx| Box::pin(workers::generic_client(ctx)),
        ),
    }
}

/// Spawn the worker matching a transport tag and role, returning its
/// handle.
///
/// An unrecognized tag emits exactly one diagnostic and fails with no
/// other side effect. Callers must check the result and must not proceed
/// without a handle.
pub fn dispatch(
    raw_tag: u8,
    role: WorkerRole,
    ctx: WorkerContext,
) -> Result<JoinHandle<()>, DispatchError> {
    let Some(kind) = TransportKind::from_raw(raw_tag) else {
        error!(
            tag = raw_tag,
            ?role,
            "worker couldn't start, transport tag not recognized"
        );
        return Err(DispatchError::UnrecognizedTransport(raw_tag));
    };

    let (server, client) = entry_points(kind);
    let entry = match role {
        WorkerRole::Server => server,
        WorkerRole::Client => client,
    };
    Ok(tokio::spawn(entry(ctx)))
}
