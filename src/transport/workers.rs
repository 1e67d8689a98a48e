//! Transport worker entry points.
//!
//! One long-running task per application context (inbound) and per client
//! session (outbound). Inbound workers receive raw PDUs into the owner's
//! buffer for the PDU layer to decode; outbound workers watch the owner's
//! pending-request registry for transfers to drive. The CSP and generic
//! variants have no link layer in this core and park until shutdown.
//!
//! Every worker selects on the shutdown token at each suspension point and
//! exits promptly when it is cancelled; no worker is ever aborted.

use std::io;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::core::REQUEST_POLL_INTERVAL;
use crate::entity::TransferRequest;
use crate::mib::RemoteEntity;
use crate::registry::Registry;

/// Packet buffer shared between an owner and its worker, sized to the MTU
/// of the governing descriptor.
pub type PacketBuffer = Arc<Mutex<Vec<u8>>>;

/// Registry handle shared between an owner and its worker.
pub type SharedRegistry<T> = Arc<Mutex<Registry<T>>>;

/// Everything a worker borrows from its owning context or session.
#[derive(Debug, Clone)]
pub struct WorkerContext {
    /// The local entity's id.
    pub entity_id: u32,
    /// The descriptor governing this worker: the own descriptor for the
    /// server role, the peer descriptor for the client role.
    pub remote: RemoteEntity,
    /// The owner's packet buffer.
    pub buffer: PacketBuffer,
    /// The owner's pending-request registry.
    pub requests: SharedRegistry<TransferRequest>,
    /// Shutdown intent, polled at every suspension point.
    pub shutdown: CancellationToken,
}

/// UDP inbound loop: receives datagrams into the context buffer.
pub(super) async fn udp_server(ctx: WorkerContext) {
    let addr = ctx.remote.socket_addr();
    let socket = match UdpSocket::bind(addr).await {
        Ok(socket) => socket,
        Err(e) => {
            error!(%addr, error = %e, "udp inbound worker failed to bind");
            return;
        }
    };
    info!(entity = ctx.entity_id, %addr, "udp inbound worker listening");

    // The buffer lock is taken only once data is ready and released before
    // the next suspension, so the owner can read the buffer on a quiet link.
    loop {
        tokio::select! {
            _ = ctx.shutdown.cancelled() => break,
            ready = socket.readable() => {
                if let Err(e) = ready {
                    warn!(error = %e, "udp readiness wait failed");
                    continue;
                }
                let mut buffer = ctx.buffer.lock().await;
                match socket.try_recv_from(buffer.as_mut_slice()) {
                    Ok((len, peer)) => {
                        trace!(len, %peer, "datagram received for the pdu layer");
                    }
                    Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {}
                    Err(e) => warn!(error = %e, "udp receive failed"),
                }
            }
        }
    }
    debug!(entity = ctx.entity_id, "udp inbound worker stopped");
}

/// UDP outbound loop: drives the pending-request registry toward one peer.
pub(super) async fn udp_client(ctx: WorkerContext) {
    let addr = ctx.remote.socket_addr();
    let socket = match UdpSocket::bind("0.0.0.0:0").await {
        Ok(socket) => socket,
        Err(e) => {
            error!(error = %e, "udp outbound worker failed to bind");
            return;
        }
    };
    if let Err(e) = socket.connect(addr).await {
        error!(%addr, error = %e, "udp outbound worker failed to connect");
        return;
    }
    info!(peer = ctx.remote.cfdp_id, %addr, "udp outbound worker connected");

    poll_requests(&ctx).await;
    debug!(peer = ctx.remote.cfdp_id, "udp outbound worker stopped");
}

/// TCP inbound loop: accepts peer connections.
pub(super) async fn tcp_server(ctx: WorkerContext) {
    let addr = ctx.remote.socket_addr();
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(%addr, error = %e, "tcp inbound worker failed to bind");
            return;
        }
    };
    info!(entity = ctx.entity_id, %addr, "tcp inbound worker listening");

    loop {
        tokio::select! {
            _ = ctx.shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((_stream, peer)) => {
                    trace!(%peer, "connection accepted for the pdu layer");
                }
                Err(e) => warn!(error = %e, "tcp accept failed"),
            }
        }
    }
    debug!(entity = ctx.entity_id, "tcp inbound worker stopped");
}

/// TCP outbound loop: connects to the peer, then drives pending requests.
pub(super) async fn tcp_client(ctx: WorkerContext) {
    let addr = ctx.remote.socket_addr();
    let stream = tokio::select! {
        _ = ctx.shutdown.cancelled() => return,
        connected = TcpStream::connect(addr) => match connected {
            Ok(stream) => stream,
            Err(e) => {
                error!(%addr, error = %e, "tcp outbound worker failed to connect");
                return;
            }
        }
    };
    info!(peer = ctx.remote.cfdp_id, %addr, "tcp outbound worker connected");

    // Held open for the lifetime of the session.
    let _stream = stream;
    poll_requests(&ctx).await;
    debug!(peer = ctx.remote.cfdp_id, "tcp outbound worker stopped");
}

/// CSP connectionless inbound worker.
pub(super) async fn csp_datagram_server(ctx: WorkerContext) {
    park(ctx, "csp-datagram", "server").await;
}

/// CSP connectionless outbound worker.
pub(super) async fn csp_datagram_client(ctx: WorkerContext) {
    park(ctx, "csp-datagram", "client").await;
}

/// CSP connection-oriented inbound worker.
pub(super) async fn csp_stream_server(ctx: WorkerContext) {
    park(ctx, "csp-stream", "server").await;
}

/// CSP connection-oriented outbound worker.
pub(super) async fn csp_stream_client(ctx: WorkerContext) {
    park(ctx, "csp-stream", "client").await;
}

/// Generic inbound worker for integrator-supplied link layers.
pub(super) async fn generic_server(ctx: WorkerContext) {
    park(ctx, "generic", "server").await;
}

/// Generic outbound worker for integrator-supplied link layers.
pub(super) async fn generic_client(ctx: WorkerContext) {
    park(ctx, "generic", "client").await;
}

/// Watch the pending-request registry until shutdown.
///
/// The PDU layer consumes the requests; this loop only reports what is
/// waiting so the session stays observable.
async fn poll_requests(ctx: &WorkerContext) {
    let mut ticker = tokio::time::interval(REQUEST_POLL_INTERVAL);
    loop {
        tokio::select! {
            _ = ctx.shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let pending = ctx.requests.lock().await.len();
                if pending > 0 {
                    trace!(peer = ctx.remote.cfdp_id, pending, "transfer requests waiting on the pdu layer");
                }
            }
        }
    }
}

/// Hold a session open until shutdown for transports whose link layer is
/// attached by the integrating system rather than this core.
async fn park(ctx: WorkerContext, link: &str, role: &str) {
    info!(
        entity = ctx.entity_id,
        peer = ctx.remote.cfdp_id,
        link,
        role,
        "worker parked, link layer attaches externally"
    );
    ctx.shutdown.cancelled().await;
    debug!(link, role, "worker stopped");
}
