//! Per-peer client session.

use std::sync::{Arc, Weak};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::core::CfdpResult;
use crate::mib::RemoteEntity;
use crate::pdu::PduHeader;
use crate::registry::Registry;
use crate::transport::{PacketBuffer, SharedRegistry, WorkerContext, WorkerRole, dispatch};

use super::context::ContextShared;
use super::request::TransferRequest;

/// Runtime state for one active peer interaction.
///
/// Owns the outbound buffer (sized to the peer's MTU), the session's
/// pending-request registry, the header template, and the outbound worker
/// handle; holds a non-owning back-reference to the application context.
#[derive(Debug)]
pub struct ClientSession {
    peer: RemoteEntity,
    header: PduHeader,
    outbound_buffer: PacketBuffer,
    pending_requests: SharedRegistry<TransferRequest>,
    handle: JoinHandle<()>,
    app: Weak<ContextShared>,
}

impl ClientSession {
    /// Start a session toward `peer_id`.
    ///
    /// Resolves the peer descriptor, allocates the outbound buffer, builds
    /// the header template, creates the pending-request registry, and
    /// dispatches the outbound worker. Any step's failure returns the
    /// error; resources acquired by earlier steps are plain locals at that
    /// point and drop before anything escapes, so a failed call leaves no
    /// session, buffer, or worker behind.
    pub(crate) async fn start(app: &Arc<ContextShared>, peer_id: u32) -> CfdpResult<Self> {
        let peer = app.store.lookup(peer_id)?;
        let outbound_buffer: PacketBuffer = Arc::new(Mutex::new(vec![0u8; peer.mtu as usize]));
        let header = PduHeader::from_mib(&peer, app.entity_id);
        let pending_requests: SharedRegistry<TransferRequest> =
            Arc::new(Mutex::new(Registry::new()));

        let worker_ctx = WorkerContext {
            entity_id: app.entity_id,
            remote: peer.clone(),
            buffer: Arc::clone(&outbound_buffer),
            requests: Arc::clone(&pending_requests),
            shutdown: app.shutdown.child_token(),
        };
        let handle = dispatch(peer.type_of_network, WorkerRole::Client, worker_ctx)?;

        debug!(peer = peer_id, mtu = peer.mtu, "client session started");
        Ok(Self {
            peer,
            header,
            outbound_buffer,
            pending_requests,
            handle,
            app: Arc::downgrade(app),
        })
    }

    /// The peer's descriptor.
    pub fn peer(&self) -> &RemoteEntity {
        &self.peer
    }

    /// The header template built for this peer.
    pub fn header(&self) -> &PduHeader {
        &self.header
    }

    /// Handle to the session's outbound buffer.
    pub fn outbound_buffer(&self) -> PacketBuffer {
        Arc::clone(&self.outbound_buffer)
    }

    /// Handle to the session's pending-request registry.
    pub fn pending_requests(&self) -> SharedRegistry<TransferRequest> {
        Arc::clone(&self.pending_requests)
    }

    /// The owning application context, if it is still alive.
    pub fn context(&self) -> Option<Arc<ContextShared>> {
        self.app.upgrade()
    }

    /// Await the outbound worker.
    ///
    /// Call only after shutdown has been signalled; the worker runs until
    /// its token is cancelled.
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            warn!(peer = self.peer.cfdp_id, error = %e, "outbound worker ended abnormally");
        }
    }
}
